//! Network reconciler
//!
//! Maps the `libvirtapi_network` resource onto the remote network API.
//! A network has no update path: it exists or it does not, and a new name
//! means a new network.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::model::{NetworkPlan, NetworkState, NewNetwork};
use crate::reconciler::{PlanAction, ReadOutcome};
use crate::traits::{Lookup, NetworkApi};

/// Resource type name exposed to the host tool
pub const NETWORK_TYPE_NAME: &str = "libvirtapi_network";

/// CRUD mapping for the `network` resource
#[derive(Clone)]
pub struct NetworkReconciler {
    api: Arc<dyn NetworkApi>,
}

impl std::fmt::Debug for NetworkReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkReconciler").finish_non_exhaustive()
    }
}

impl NetworkReconciler {
    /// Create a reconciler backed by the given client
    pub fn new(api: Arc<dyn NetworkApi>) -> Self {
        Self { api }
    }

    /// Classify the change from `prior` to `desired`
    pub fn plan(prior: Option<&NetworkState>, desired: &NetworkPlan) -> PlanAction {
        match prior {
            None => PlanAction::Create,
            Some(prior) if prior.name != desired.name => PlanAction::Replace,
            Some(_) => PlanAction::NoOp,
        }
    }

    /// Create the network and adopt the id, name and status the remote system reports
    pub async fn create(&self, plan: &NetworkPlan) -> Result<NetworkState> {
        let payload = NewNetwork::from_plan(plan)?;
        tracing::debug!("Creating network: {}", payload.name);

        let network = self.api.create_network(&payload).await?;

        tracing::info!(
            "Created network {} (id: {}, status: {})",
            network.name,
            network.id,
            network.status
        );
        Ok(NetworkState::from(network))
    }

    /// Refresh persisted state from the live network
    ///
    /// # Returns
    ///
    /// - `Ok(ReadOutcome::Present(state))`: live name and status adopted
    /// - `Ok(ReadOutcome::Missing)`: the remote system reports the id as unknown
    /// - `Err(Error)`: the lookup itself failed
    pub async fn read(&self, state: &NetworkState) -> Result<ReadOutcome<NetworkState>> {
        let id = state.require_id()?;

        match self.api.get_network(id).await? {
            Lookup::Found(network) => {
                if network.name != state.name || Some(&network.status) != state.status.as_ref() {
                    tracing::debug!(
                        "Network {} drifted: name {:?} -> {:?}, status {:?} -> {:?}",
                        id,
                        state.name,
                        network.name,
                        state.status,
                        network.status
                    );
                }
                Ok(ReadOutcome::Present(NetworkState::from(network)))
            }
            Lookup::NotFound => {
                tracing::warn!("Network {} no longer exists remotely", id);
                Ok(ReadOutcome::Missing)
            }
        }
    }

    /// Networks are immutable; the prior state is returned unchanged
    ///
    /// A name change is planned as a replacement (see [`Self::plan`]) and
    /// never reaches this method through [`crate::Provider::apply_network`].
    pub async fn update(&self, prior: &NetworkState, plan: &NetworkPlan) -> Result<NetworkState> {
        if prior.name != plan.name {
            tracing::warn!(
                "Network {} cannot be renamed to {} in place; keeping prior state",
                prior.name,
                plan.name
            );
        } else {
            tracing::debug!("Network update is a no-op: {}", prior.name);
        }

        Ok(prior.clone())
    }

    /// Delete the network
    ///
    /// On error the caller must keep the resource in state.
    pub async fn delete(&self, state: &NetworkState) -> Result<()> {
        let id = state.require_id()?;
        tracing::debug!("Deleting network {}", id);

        self.api.delete_network(id).await?;

        tracing::info!("Deleted network {} ({})", id, state.name);
        Ok(())
    }

    /// Adopt an existing network by id without contacting the remote system
    pub fn import(id: &str) -> Result<NetworkState> {
        let id: i64 = id.trim().parse().map_err(|_| {
            Error::invalid_input(format!("network import id must be an integer. Got: {}", id))
        })?;
        Ok(NetworkState::imported(id))
    }
}
