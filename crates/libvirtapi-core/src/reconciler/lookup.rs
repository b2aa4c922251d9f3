//! Read-only lookups (data sources)
//!
//! Unlike the resource reconcilers, lookups treat a missing object as an
//! error: there is no state to drop, the configuration simply refers to
//! something that does not exist.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::model::{LoadBalancerKey, LoadBalancerLookup, LoadBalancerState, NetworkLookup};
use crate::traits::{LoadBalancerApi, Lookup, NetworkApi};

/// Read-only `libvirtapi_network` lookup
///
/// The declared id, name and status are all required. The lookup fetches
/// the network and fails if the live name or status disagrees with the
/// declaration; it never adopts the live value.
#[derive(Clone)]
pub struct NetworkDataSource {
    api: Arc<dyn NetworkApi>,
}

impl NetworkDataSource {
    /// Create a lookup backed by the given client
    pub fn new(api: Arc<dyn NetworkApi>) -> Self {
        Self { api }
    }

    /// Fetch and check the declared network
    pub async fn read(&self, declared: &NetworkLookup) -> Result<NetworkLookup> {
        let network = match self.api.get_network(declared.id).await? {
            Lookup::Found(network) => network,
            Lookup::NotFound => {
                return Err(Error::not_found(format!("network {}", declared.id)));
            }
        };

        if network.name != declared.name {
            return Err(Error::mismatch("name", &declared.name, &network.name));
        }

        if network.status != declared.status {
            return Err(Error::mismatch("status", &declared.status, &network.status));
        }

        Ok(declared.clone())
    }
}

/// Read-only `libvirtapi_loadbalancer` lookup
///
/// Given a name and namespace, reports the live address, ports and nodes.
#[derive(Clone)]
pub struct LoadBalancerDataSource {
    api: Arc<dyn LoadBalancerApi>,
}

impl LoadBalancerDataSource {
    /// Create a lookup backed by the given client
    pub fn new(api: Arc<dyn LoadBalancerApi>) -> Self {
        Self { api }
    }

    /// Fetch the declared load balancer
    pub async fn read(&self, declared: &LoadBalancerLookup) -> Result<LoadBalancerState> {
        let key = LoadBalancerKey::new(&declared.name, &declared.namespace);

        match self.api.get_load_balancer(&key).await? {
            Lookup::Found(live) => {
                let ip = live.ip.clone();
                Ok(LoadBalancerState::from_record(&live, Some(key.to_id()), ip))
            }
            Lookup::NotFound => Err(Error::not_found(format!("load balancer {}", key))),
        }
    }
}
