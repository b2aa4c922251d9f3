//! Core traits for the libvirtApi provider
//!
//! - [`NetworkApi`] / [`LoadBalancerApi`]: the remote API client seam
//! - [`StateStore`]: the host tool's persisted-state seam

pub mod remote_api;
pub mod state_store;

pub use remote_api::{LoadBalancerApi, Lookup, NetworkApi};
pub use state_store::{StateRecord, StateStore};
