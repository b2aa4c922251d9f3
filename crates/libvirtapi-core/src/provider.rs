//! Provider orchestration
//!
//! The Provider is responsible for:
//! - Loading the prior snapshot of a resource from the StateStore
//! - Running exactly one reconciler operation against the remote API
//! - Committing the resulting snapshot only when that operation succeeded
//!
//! ## Architecture
//!
//! ```text
//!                        ┌──────────────┐
//!   address, plan ──────►│   Provider   │
//!                        └──────────────┘
//!                                │
//!         ┌──────────────────────┼──────────────────────┐
//!         │                      │                      │
//!         ▼                      ▼                      ▼
//! ┌──────────────┐      ┌─────────────────┐     ┌──────────────┐
//! │ StateStore   │      │  Reconcilers    │     │ Data sources │
//! │ (snapshots)  │      │ (network, lb)   │     │ (read-only)  │
//! └──────────────┘      └─────────────────┘     └──────────────┘
//! ```
//!
//! ## Commit rules
//!
//! 1. create / update / import write the new snapshot
//! 2. read writes the refreshed snapshot, or removes it when the remote
//!    system reports the resource as gone
//! 3. delete removes the snapshot only after the remote call succeeded
//! 4. any failed operation leaves the stored snapshot untouched

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::model::{
    LoadBalancerLookup, LoadBalancerPlan, LoadBalancerState, NetworkLookup, NetworkPlan,
    NetworkState,
};
use crate::reconciler::load_balancer::LOAD_BALANCER_TYPE_NAME;
use crate::reconciler::network::NETWORK_TYPE_NAME;
use crate::reconciler::{
    LoadBalancerDataSource, LoadBalancerReconciler, NetworkDataSource, NetworkReconciler,
    PlanAction, ReadOutcome,
};
use crate::traits::{LoadBalancerApi, NetworkApi, StateRecord, StateStore};

/// Drives resource lifecycles against the remote API and the host state store
///
/// Each method addresses one resource by its address (e.g.
/// `libvirtapi_network.web`). The Provider holds no per-resource state of
/// its own; everything lives in the [`StateStore`].
///
/// ## Threading
///
/// The Provider is cheap to clone and safe to share between tasks.
/// Operations on different addresses may run concurrently; the host is
/// expected to serialize operations on the same address.
#[derive(Clone)]
pub struct Provider {
    networks: NetworkReconciler,
    load_balancers: LoadBalancerReconciler,
    network_lookup: NetworkDataSource,
    load_balancer_lookup: LoadBalancerDataSource,
    state: Arc<dyn StateStore>,
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider").finish_non_exhaustive()
    }
}

impl Provider {
    /// Create a provider from one client serving both resource kinds
    ///
    /// # Parameters
    ///
    /// - `api`: Remote API client
    /// - `state`: Host-side state store
    pub fn new<A>(api: Arc<A>, state: Arc<dyn StateStore>) -> Self
    where
        A: NetworkApi + LoadBalancerApi + 'static,
    {
        let network_api: Arc<dyn NetworkApi> = api.clone();
        let load_balancer_api: Arc<dyn LoadBalancerApi> = api;
        Self::with_apis(network_api, load_balancer_api, state)
    }

    /// Create a provider from separate clients per resource kind
    pub fn with_apis(
        network_api: Arc<dyn NetworkApi>,
        load_balancer_api: Arc<dyn LoadBalancerApi>,
        state: Arc<dyn StateStore>,
    ) -> Self {
        Self {
            networks: NetworkReconciler::new(network_api.clone()),
            network_lookup: NetworkDataSource::new(network_api),
            load_balancers: LoadBalancerReconciler::new(load_balancer_api.clone()),
            load_balancer_lookup: LoadBalancerDataSource::new(load_balancer_api),
            state,
        }
    }

    // ----- network -----

    /// Classify what applying `desired` at `address` would do
    ///
    /// A freshly imported snapshot is refreshed first.
    pub async fn plan_network(&self, address: &str, desired: &NetworkPlan) -> Result<PlanAction> {
        let prior = self.prior_network(address).await?;
        Ok(NetworkReconciler::plan(prior.as_ref(), desired))
    }

    /// Create a network and store its snapshot
    pub async fn create_network(&self, address: &str, plan: &NetworkPlan) -> Result<NetworkState> {
        let state = self.networks.create(plan).await?;
        self.commit(address, NETWORK_TYPE_NAME, &state).await?;
        Ok(state)
    }

    /// Refresh the network stored at `address`
    pub async fn read_network(&self, address: &str) -> Result<ReadOutcome<NetworkState>> {
        let prior: NetworkState = self.load(address, NETWORK_TYPE_NAME).await?;
        let outcome = self.networks.read(&prior).await?;
        self.commit_outcome(address, NETWORK_TYPE_NAME, &outcome).await?;
        Ok(outcome)
    }

    /// Apply an in-place update to the network stored at `address`
    pub async fn update_network(&self, address: &str, plan: &NetworkPlan) -> Result<NetworkState> {
        let prior: NetworkState = self.load(address, NETWORK_TYPE_NAME).await?;
        let state = self.networks.update(&prior, plan).await?;
        self.commit(address, NETWORK_TYPE_NAME, &state).await?;
        Ok(state)
    }

    /// Delete the network stored at `address`
    pub async fn delete_network(&self, address: &str) -> Result<()> {
        let prior: NetworkState = self.load(address, NETWORK_TYPE_NAME).await?;
        self.networks.delete(&prior).await?;
        self.state.remove(address).await
    }

    /// Adopt an existing network under `address`
    pub async fn import_network(&self, address: &str, id: &str) -> Result<NetworkState> {
        let state = NetworkReconciler::import(id)?;
        self.commit(address, NETWORK_TYPE_NAME, &state).await?;
        Ok(state)
    }

    /// Plan and run whatever `desired` requires at `address`
    ///
    /// A replacement deletes the old network before creating the new one.
    pub async fn apply_network(
        &self,
        address: &str,
        desired: &NetworkPlan,
    ) -> Result<NetworkState> {
        let prior = self.prior_network(address).await?;
        let action = NetworkReconciler::plan(prior.as_ref(), desired);
        tracing::debug!("Applying {}: {:?}", address, action);

        match (action, prior) {
            (PlanAction::NoOp, Some(prior)) => Ok(prior),
            (PlanAction::Update, Some(_)) => self.update_network(address, desired).await,
            (PlanAction::Replace, Some(_)) => {
                self.delete_network(address).await?;
                self.create_network(address, desired).await
            }
            _ => self.create_network(address, desired).await,
        }
    }

    /// Stored snapshot, refreshed from the remote side if it only holds an imported id
    async fn prior_network(&self, address: &str) -> Result<Option<NetworkState>> {
        let prior: Option<NetworkState> = self.load_optional(address, NETWORK_TYPE_NAME).await?;
        match prior {
            Some(state) if state.awaiting_refresh() => {
                tracing::debug!("Refreshing imported network at {}", address);
                Ok(self.read_network(address).await?.present())
            }
            other => Ok(other),
        }
    }

    /// Run the read-only network lookup
    pub async fn lookup_network(&self, declared: &NetworkLookup) -> Result<NetworkLookup> {
        self.network_lookup.read(declared).await
    }

    // ----- load balancer -----

    /// Classify what applying `desired` at `address` would do
    ///
    /// A freshly imported snapshot is refreshed first.
    pub async fn plan_load_balancer(
        &self,
        address: &str,
        desired: &LoadBalancerPlan,
    ) -> Result<PlanAction> {
        let prior = self.prior_load_balancer(address).await?;
        Ok(LoadBalancerReconciler::plan(prior.as_ref(), desired))
    }

    /// Create a load balancer and store its snapshot
    pub async fn create_load_balancer(
        &self,
        address: &str,
        plan: &LoadBalancerPlan,
    ) -> Result<LoadBalancerState> {
        let state = self.load_balancers.create(plan).await?;
        self.commit(address, LOAD_BALANCER_TYPE_NAME, &state).await?;
        Ok(state)
    }

    /// Refresh the load balancer stored at `address`
    pub async fn read_load_balancer(
        &self,
        address: &str,
    ) -> Result<ReadOutcome<LoadBalancerState>> {
        let prior: LoadBalancerState = self.load(address, LOAD_BALANCER_TYPE_NAME).await?;
        let outcome = self.load_balancers.read(&prior).await?;
        self.commit_outcome(address, LOAD_BALANCER_TYPE_NAME, &outcome).await?;
        Ok(outcome)
    }

    /// Replace the port and node sets of the load balancer stored at `address`
    pub async fn update_load_balancer(
        &self,
        address: &str,
        plan: &LoadBalancerPlan,
    ) -> Result<LoadBalancerState> {
        let prior: LoadBalancerState = self.load(address, LOAD_BALANCER_TYPE_NAME).await?;
        let state = self.load_balancers.update(&prior, plan).await?;
        self.commit(address, LOAD_BALANCER_TYPE_NAME, &state).await?;
        Ok(state)
    }

    /// Delete the load balancer stored at `address`
    pub async fn delete_load_balancer(&self, address: &str) -> Result<()> {
        let prior: LoadBalancerState = self.load(address, LOAD_BALANCER_TYPE_NAME).await?;
        self.load_balancers.delete(&prior).await?;
        self.state.remove(address).await
    }

    /// Adopt an existing load balancer under `address`
    pub async fn import_load_balancer(
        &self,
        address: &str,
        id: &str,
    ) -> Result<LoadBalancerState> {
        let state = LoadBalancerReconciler::import(id);
        self.commit(address, LOAD_BALANCER_TYPE_NAME, &state).await?;
        Ok(state)
    }

    /// Plan and run whatever `desired` requires at `address`
    ///
    /// A replacement deletes the old load balancer before creating the new one.
    pub async fn apply_load_balancer(
        &self,
        address: &str,
        desired: &LoadBalancerPlan,
    ) -> Result<LoadBalancerState> {
        let prior = self.prior_load_balancer(address).await?;
        let action = LoadBalancerReconciler::plan(prior.as_ref(), desired);
        tracing::debug!("Applying {}: {:?}", address, action);

        match (action, prior) {
            (PlanAction::NoOp, Some(prior)) => Ok(prior),
            (PlanAction::Update, Some(_)) => self.update_load_balancer(address, desired).await,
            (PlanAction::Replace, Some(_)) => {
                self.delete_load_balancer(address).await?;
                self.create_load_balancer(address, desired).await
            }
            _ => self.create_load_balancer(address, desired).await,
        }
    }

    /// Stored snapshot, refreshed from the remote side if it only holds an imported id
    async fn prior_load_balancer(&self, address: &str) -> Result<Option<LoadBalancerState>> {
        let prior: Option<LoadBalancerState> =
            self.load_optional(address, LOAD_BALANCER_TYPE_NAME).await?;
        match prior {
            Some(state) if state.awaiting_refresh() => {
                tracing::debug!("Refreshing imported load balancer at {}", address);
                Ok(self.read_load_balancer(address).await?.present())
            }
            other => Ok(other),
        }
    }

    /// Run the read-only load balancer lookup
    pub async fn lookup_load_balancer(
        &self,
        declared: &LoadBalancerLookup,
    ) -> Result<LoadBalancerState> {
        self.load_balancer_lookup.read(declared).await
    }

    // ----- snapshots -----

    async fn load_optional<T: DeserializeOwned>(
        &self,
        address: &str,
        resource_type: &str,
    ) -> Result<Option<T>> {
        let Some(record) = self.state.get(address).await? else {
            return Ok(None);
        };

        if record.resource_type != resource_type {
            return Err(Error::state_store(format!(
                "{} holds a {} snapshot, expected {}",
                address, record.resource_type, resource_type
            )));
        }

        record.decode().map(Some)
    }

    async fn load<T: DeserializeOwned>(&self, address: &str, resource_type: &str) -> Result<T> {
        self.load_optional(address, resource_type)
            .await?
            .ok_or_else(|| Error::state_store(format!("no snapshot stored at {}", address)))
    }

    async fn commit<T: Serialize>(
        &self,
        address: &str,
        resource_type: &str,
        state: &T,
    ) -> Result<()> {
        let record = StateRecord::new(resource_type, serde_json::to_value(state)?);
        self.state.put(address, record).await?;
        tracing::debug!("Committed {} snapshot at {}", resource_type, address);
        Ok(())
    }

    async fn commit_outcome<T: Serialize>(
        &self,
        address: &str,
        resource_type: &str,
        outcome: &ReadOutcome<T>,
    ) -> Result<()> {
        match outcome {
            ReadOutcome::Present(state) => self.commit(address, resource_type, state).await,
            ReadOutcome::Missing => {
                tracing::info!("Removing {} from state: gone remotely", address);
                self.state.remove(address).await
            }
        }
    }
}
