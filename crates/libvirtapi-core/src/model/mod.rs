//! Resource model
//!
//! Plain records for the two resource kinds, with the mapping between the
//! host tool's attribute representation, the domain record and the wire
//! JSON.

pub mod load_balancer;
pub mod network;

pub use load_balancer::{
    LoadBalancer, LoadBalancerKey, LoadBalancerLookup, LoadBalancerPlan, LoadBalancerState, Node,
    NodeBlock, Port, PortBlock,
};
pub use network::{NewNetwork, Network, NetworkLookup, NetworkPlan, NetworkState};
