//! Load balancer reconciler
//!
//! Maps the composite `libvirtapi_loadbalancer` resource onto the remote
//! load balancer API.
//!
//! ## Ordering
//!
//! Port and node lists are persisted exactly as declared (create, update)
//! or exactly as returned by the remote system (read). Nothing is sorted.
//!
//! ## Update semantics
//!
//! Updates send the complete desired port and node lists; the remote system
//! replaces its set with them. State is rebuilt from the payload that was
//! sent, not from a confirmation read.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::model::{LoadBalancer, LoadBalancerKey, LoadBalancerPlan, LoadBalancerState};
use crate::reconciler::{ListChanges, PlanAction, ReadOutcome};
use crate::traits::{LoadBalancerApi, Lookup};

/// Resource type name exposed to the host tool
pub const LOAD_BALANCER_TYPE_NAME: &str = "libvirtapi_loadbalancer";

/// CRUD mapping for the `loadbalancer` resource
#[derive(Clone)]
pub struct LoadBalancerReconciler {
    api: Arc<dyn LoadBalancerApi>,
}

impl std::fmt::Debug for LoadBalancerReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadBalancerReconciler").finish_non_exhaustive()
    }
}

impl LoadBalancerReconciler {
    /// Create a reconciler backed by the given client
    pub fn new(api: Arc<dyn LoadBalancerApi>) -> Self {
        Self { api }
    }

    /// Classify the change from `prior` to `desired`
    ///
    /// `name`, `namespace` and each port's `name` are immutable: changing
    /// any of them forces a replacement. Ports are matched by position, the
    /// same way the host tool addresses list elements.
    pub fn plan(prior: Option<&LoadBalancerState>, desired: &LoadBalancerPlan) -> PlanAction {
        let Some(prior) = prior else {
            return PlanAction::Create;
        };

        if prior.name != desired.name || prior.namespace != desired.namespace {
            return PlanAction::Replace;
        }

        let port_renamed = prior
            .ports
            .iter()
            .zip(&desired.ports)
            .any(|(old, new)| old.name != new.name);
        if port_renamed {
            return PlanAction::Replace;
        }

        if prior.ports != desired.ports || prior.nodes != desired.nodes {
            PlanAction::Update
        } else {
            PlanAction::NoOp
        }
    }

    /// Describe how the port and node lists change between state and plan
    pub fn changes(
        prior: &LoadBalancerState,
        desired: &LoadBalancerPlan,
    ) -> (ListChanges, ListChanges) {
        (
            ListChanges::between(&prior.ports, &desired.ports, |p| p.name.as_str()),
            ListChanges::between(&prior.nodes, &desired.nodes, |n| n.name.as_str()),
        )
    }

    /// Create the load balancer
    ///
    /// The persisted state carries the address assigned by the remote
    /// system together with the declared name, namespace, ports and nodes.
    pub async fn create(&self, plan: &LoadBalancerPlan) -> Result<LoadBalancerState> {
        let payload = LoadBalancer::from_plan(plan)?;
        let key = payload.key();
        tracing::debug!(
            "Creating load balancer {} ({} ports, {} nodes)",
            key,
            payload.ports.len(),
            payload.nodes.len()
        );

        let ip = self.api.create_load_balancer(&payload).await?;
        if ip.trim().is_empty() {
            return Err(Error::decode(
                "load balancer",
                format!("create response for {} carried no ip", key),
            ));
        }

        tracing::info!("Created load balancer {} at {}", key, ip);
        Ok(LoadBalancerState::from_record(&payload, None, Some(ip)))
    }

    /// Refresh persisted state from the live load balancer
    ///
    /// The lookup key is name/namespace, or the state id right after an
    /// import. On success ports and nodes are rebuilt from the response in
    /// the order the remote system returned them.
    pub async fn read(&self, state: &LoadBalancerState) -> Result<ReadOutcome<LoadBalancerState>> {
        let key = LoadBalancerKey::from_state(state)?;

        match self.api.get_load_balancer(&key).await? {
            Lookup::Found(live) => {
                let ip = live.ip.clone();
                Ok(ReadOutcome::Present(LoadBalancerState::from_record(
                    &live,
                    state.id.clone(),
                    ip,
                )))
            }
            Lookup::NotFound => {
                tracing::warn!("Load balancer {} no longer exists remotely", key);
                Ok(ReadOutcome::Missing)
            }
        }
    }

    /// Replace the port and node sets of an existing load balancer
    pub async fn update(
        &self,
        prior: &LoadBalancerState,
        plan: &LoadBalancerPlan,
    ) -> Result<LoadBalancerState> {
        if prior.name != plan.name || prior.namespace != plan.namespace {
            return Err(Error::invalid_input(format!(
                "load balancer {}/{} cannot be renamed to {}/{} in place; it must be replaced",
                prior.namespace, prior.name, plan.namespace, plan.name
            )));
        }

        let payload = LoadBalancer::from_plan(plan)?;
        let (ports, nodes) = Self::changes(prior, plan);
        tracing::debug!(
            "Updating load balancer {}: ports [{}], nodes [{}]",
            payload.key(),
            ports,
            nodes
        );

        self.api.update_load_balancer(&payload).await?;

        tracing::info!("Updated load balancer {}", payload.key());
        Ok(LoadBalancerState::from_record(
            &payload,
            prior.id.clone(),
            prior.ip.clone(),
        ))
    }

    /// Delete the load balancer
    ///
    /// On error the caller must keep the resource in state.
    pub async fn delete(&self, state: &LoadBalancerState) -> Result<()> {
        let key = LoadBalancerKey::from_state(state)?;
        tracing::debug!("Deleting load balancer {}", key);

        self.api.delete_load_balancer(&key).await?;

        tracing::info!("Deleted load balancer {}", key);
        Ok(())
    }

    /// Adopt an existing load balancer; the id is kept verbatim
    pub fn import(id: &str) -> LoadBalancerState {
        LoadBalancerState::imported(id)
    }
}
