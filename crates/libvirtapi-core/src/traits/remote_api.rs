// # Remote API Traits
//
// Defines the interface reconcilers use to reach the libvirtApi service.
//
// ## Implementations
//
// - HTTP: `libvirtapi-client` crate (`LibvirtApiClient`)
// - Test doubles: `tests/common` in this crate
//
// ## Usage
//
// ```rust,ignore
// use libvirtapi_core::traits::{Lookup, NetworkApi};
//
// async fn show(api: &dyn NetworkApi) -> libvirtapi_core::Result<()> {
//     match api.get_network(42).await? {
//         Lookup::Found(network) => println!("{} is {}", network.name, network.status),
//         Lookup::NotFound => println!("gone"),
//     }
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::model::{LoadBalancer, LoadBalancerKey, NewNetwork, Network};

/// Outcome of a point lookup
///
/// Absence is a value, not an error: a reconciler needs to tell the host
/// tool to drop a resource that is genuinely gone, and to report anything
/// else. Transport and API failures travel through the surrounding `Result`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    /// The object exists
    Found(T),
    /// The remote system reports that the object does not exist
    NotFound,
}

impl<T> Lookup<T> {
    /// Convert into an `Option`
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::NotFound => None,
        }
    }
}

/// Remote operations on networks
///
/// # Contract
///
/// - One HTTP round trip per call, bounded by the client timeout
/// - No retry, no backoff, no caching
/// - Non-2xx responses become `Error::Api` carrying status and raw body
/// - Malformed 2xx bodies become `Error::Decode`
///
/// Implementations must be safe for concurrent use by many reconciliations.
#[async_trait]
pub trait NetworkApi: Send + Sync {
    /// Create a network; the returned record carries the assigned id
    async fn create_network(&self, payload: &NewNetwork) -> Result<Network, crate::Error>;

    /// Fetch a network by id
    async fn get_network(&self, id: i64) -> Result<Lookup<Network>, crate::Error>;

    /// Delete a network by id
    async fn delete_network(&self, id: i64) -> Result<(), crate::Error>;
}

/// Remote operations on load balancers
///
/// Same contract as [`NetworkApi`]. Updates have set semantics: the payload
/// carries the complete desired port and node lists.
#[async_trait]
pub trait LoadBalancerApi: Send + Sync {
    /// Create a load balancer; returns the address assigned by the remote system
    async fn create_load_balancer(&self, payload: &LoadBalancer) -> Result<String, crate::Error>;

    /// Fetch a load balancer by name and namespace
    async fn get_load_balancer(
        &self,
        key: &LoadBalancerKey,
    ) -> Result<Lookup<LoadBalancer>, crate::Error>;

    /// Replace the ports and nodes of an existing load balancer
    async fn update_load_balancer(&self, payload: &LoadBalancer) -> Result<(), crate::Error>;

    /// Delete a load balancer by name and namespace
    async fn delete_load_balancer(&self, key: &LoadBalancerKey) -> Result<(), crate::Error>;
}
