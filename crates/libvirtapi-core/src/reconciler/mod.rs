//! Reconcilers
//!
//! One reconciler per resource kind translates between declared
//! configuration, persisted state and the live remote object. Each
//! operation performs exactly one remote call and keeps nothing between
//! calls; the remote API client is injected at construction.
//!
//! ```text
//! declared config ──► Reconciler ──► wire payload ──► Remote API
//!                         ▲                               │
//!                         └──────── persisted state ◄─────┘
//! ```

pub mod diff;
pub mod load_balancer;
pub mod lookup;
pub mod network;

pub use diff::ListChanges;
pub use load_balancer::LoadBalancerReconciler;
pub use lookup::{LoadBalancerDataSource, NetworkDataSource};
pub use network::NetworkReconciler;

/// Result of refreshing a resource from the remote system
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome<S> {
    /// The resource exists; here is its refreshed state
    Present(S),
    /// The remote system no longer has the resource; drop it from state
    Missing,
}

impl<S> ReadOutcome<S> {
    /// Whether the resource is gone
    pub fn is_missing(&self) -> bool {
        matches!(self, ReadOutcome::Missing)
    }

    /// The refreshed state, if present
    pub fn present(self) -> Option<S> {
        match self {
            ReadOutcome::Present(state) => Some(state),
            ReadOutcome::Missing => None,
        }
    }
}

/// What applying a declared configuration to prior state requires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanAction {
    /// No prior state: create the resource
    Create,
    /// Declared configuration matches state
    NoOp,
    /// Change can be applied in place
    Update,
    /// An immutable attribute changed: delete then create
    Replace,
}
