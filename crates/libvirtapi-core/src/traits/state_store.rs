// # State Store Trait
//
// Defines the interface to the host tool's state store.
//
// ## Purpose
//
// The host tool owns the last-known-good snapshot of every resource
// between operations. The provider only reads a snapshot before an
// operation and writes (or removes) it after the operation succeeded.
//
// Snapshots are keyed by resource address (e.g. `libvirtapi_network.web`)
// and hold the resource's attributes as JSON.

use async_trait::async_trait;

/// Persisted snapshot of one resource
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StateRecord {
    /// Resource type name (e.g. `libvirtapi_network`)
    pub resource_type: String,
    /// Resource attributes
    pub attributes: serde_json::Value,
    /// Timestamp of the last write
    pub last_updated: chrono::DateTime<chrono::Utc>,
}

impl StateRecord {
    /// Create a new state record stamped with the current time
    pub fn new(resource_type: impl Into<String>, attributes: serde_json::Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            attributes,
            last_updated: chrono::Utc::now(),
        }
    }

    /// Deserialize the attributes into a typed state
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Result<T, crate::Error> {
        serde_json::from_value(self.attributes.clone()).map_err(|e| {
            crate::Error::state_store(format!(
                "snapshot of type {} does not decode: {}",
                self.resource_type, e
            ))
        })
    }
}

/// Trait for host-side state store implementations
///
/// # Thread Safety
///
/// All methods must be safe to call concurrently from multiple tasks.
/// The host tool serializes operations against one address; different
/// addresses may be written concurrently.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Get the snapshot stored under an address
    ///
    /// # Returns
    ///
    /// - `Ok(Some(StateRecord))`: The snapshot
    /// - `Ok(None)`: Nothing stored
    /// - `Err(Error)`: Storage error
    async fn get(&self, address: &str) -> Result<Option<StateRecord>, crate::Error>;

    /// Store a snapshot, replacing any previous one
    async fn put(&self, address: &str, record: StateRecord) -> Result<(), crate::Error>;

    /// Remove a snapshot (no-op if absent)
    async fn remove(&self, address: &str) -> Result<(), crate::Error>;

    /// List all stored addresses
    async fn list(&self) -> Result<Vec<String>, crate::Error>;
}
