// # Network model
//
// Three views of the same object:
//
// - `NetworkPlan` / `NetworkState`: the host tool's declared and persisted
//   attributes (`id` computed, `name` required, `status` computed)
// - `Network`: the domain record, which is also the wire shape
//   `{"id": 42, "name": "web-1", "status": "active"}`
// - `NewNetwork`: the create payload `{"name": "web-1"}`
//
// `status` is a string on the wire and in state. The remote system assigns
// `id`; it is never generated here.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A network as reported by the remote API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    /// Identifier assigned by the remote system
    pub id: i64,
    /// Network name
    pub name: String,
    /// Remote status
    pub status: String,
}

/// Create payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNetwork {
    /// Network name
    pub name: String,
}

impl NewNetwork {
    /// Build a create payload from the declared plan
    pub fn from_plan(plan: &NetworkPlan) -> Result<Self> {
        if plan.name.trim().is_empty() {
            return Err(Error::invalid_input("network name cannot be empty"));
        }

        Ok(Self {
            name: plan.name.clone(),
        })
    }
}

/// Declared configuration of a `network` resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkPlan {
    /// Network name
    pub name: String,
}

impl NetworkPlan {
    /// Create a plan
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Persisted state of a `network` resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkState {
    /// Identifier; `None` only before the first successful create
    pub id: Option<i64>,
    /// Network name
    #[serde(default)]
    pub name: String,
    /// Last known remote status
    pub status: Option<String>,
}

impl NetworkState {
    /// State holding only the identifier (the result of an import)
    pub fn imported(id: i64) -> Self {
        Self {
            id: Some(id),
            name: String::new(),
            status: None,
        }
    }

    /// The identifier, or an error if the state was never created
    pub fn require_id(&self) -> Result<i64> {
        self.id
            .ok_or_else(|| Error::invalid_input("network state has no id; was it created?"))
    }

    /// True for an import that has not been read back yet
    pub fn awaiting_refresh(&self) -> bool {
        self.id.is_some() && self.name.is_empty()
    }
}

impl From<Network> for NetworkState {
    fn from(network: Network) -> Self {
        Self {
            id: Some(network.id),
            name: network.name,
            status: Some(network.status),
        }
    }
}

/// Declared configuration of the read-only `network` lookup
///
/// Every attribute is required; the lookup checks them against the live
/// network instead of adopting the live values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkLookup {
    /// Identifier to fetch
    pub id: i64,
    /// Expected name
    pub name: String,
    /// Expected status
    pub status: String,
}
