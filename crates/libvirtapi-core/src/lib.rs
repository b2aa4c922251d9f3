// # libvirtapi-core
//
// Reconciliation core for the libvirtApi provider.
//
// ## Architecture Overview
//
// This library maps two declarative resource kinds onto the libvirtApi
// REST service:
// - **NetworkApi / LoadBalancerApi**: Traits for the remote API client
// - **NetworkReconciler / LoadBalancerReconciler**: create, read, update,
//   delete, import and plan for each resource kind
// - **NetworkDataSource / LoadBalancerDataSource**: read-only lookups
// - **StateStore**: Trait for the host tool's persisted snapshots
// - **Provider**: Orchestrates reconcilers and commits state on success
//
// ## Design Principles
//
// 1. **Injected clients**: reconcilers receive their API client at
//    construction; nothing is global
// 2. **Errors propagate**: every remote failure is a typed `Error`
// 3. **Commit on success**: state only changes after a confirmed remote call
// 4. **Order preserving**: port and node lists are never reordered
// 5. **Library-First**: the HTTP client lives in its own crate

pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod reconciler;
pub mod state;
pub mod traits;

// Re-export core types for convenience
pub use config::{ClientSettings, ConfigValue, ProviderConfig};
pub use error::{Error, Result};
pub use provider::Provider;
pub use reconciler::load_balancer::LOAD_BALANCER_TYPE_NAME;
pub use reconciler::network::NETWORK_TYPE_NAME;
pub use reconciler::{
    LoadBalancerDataSource, LoadBalancerReconciler, NetworkDataSource, NetworkReconciler,
    PlanAction, ReadOutcome,
};
pub use state::MemoryStateStore;
pub use traits::{LoadBalancerApi, Lookup, NetworkApi, StateRecord, StateStore};
