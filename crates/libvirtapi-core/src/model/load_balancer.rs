// # Load balancer model
//
// A load balancer is a composite resource: it owns ordered lists of ports
// and nodes by value. Those lists keep the order they were declared in (on
// create/update) or returned in (on read); nothing here sorts them.
//
// ## Wire shape
//
// ```json
// {
//   "name": "lb1",
//   "namespace": "prod",
//   "ip": "10.0.0.99",
//   "ports": [{"name": "http", "protocol": "tcp", "port": 80, "nodeport": 8080}],
//   "nodes": [{"name": "n1", "ip": "10.0.0.1"}]
// }
// ```
//
// `ip` is assigned by the remote system and only present in responses.
// Nodes always use the single-address `{name, ip}` shape.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{Error, Result};

/// Lowest valid port number
const MIN_PORT: i64 = 1;
/// Highest valid port number
const MAX_PORT: i64 = 65535;

/// A port exposed by a load balancer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    /// Port name, unique within the load balancer
    pub name: String,
    /// Protocol, e.g. "tcp" or "udp"
    pub protocol: String,
    /// Exposed port
    pub port: u16,
    /// Backend node port
    #[serde(rename = "nodeport")]
    pub node_port: u16,
}

/// A backend node of a load balancer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Node name
    pub name: String,
    /// Node address
    pub ip: String,
}

/// A load balancer as sent to and returned by the remote API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancer {
    /// Name (immutable)
    pub name: String,
    /// Namespace (immutable)
    pub namespace: String,
    /// Address assigned by the remote system
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    /// Ports in declared order
    #[serde(default)]
    pub ports: Vec<Port>,
    /// Nodes in declared order
    #[serde(default)]
    pub nodes: Vec<Node>,
}

impl LoadBalancer {
    /// Build the outbound payload from a declared plan
    ///
    /// Rejects empty names, out-of-range port numbers and duplicate port
    /// names before anything is sent.
    pub fn from_plan(plan: &LoadBalancerPlan) -> Result<Self> {
        let key = LoadBalancerKey::new(&plan.name, &plan.namespace);
        key.validate()?;

        let mut seen = HashSet::new();
        let mut ports = Vec::with_capacity(plan.ports.len());
        for block in &plan.ports {
            if !seen.insert(block.name.as_str()) {
                return Err(Error::invalid_input(format!(
                    "duplicate port name '{}' in load balancer {}",
                    block.name, key
                )));
            }
            ports.push(Port::try_from(block)?);
        }

        let mut nodes = Vec::with_capacity(plan.nodes.len());
        for block in &plan.nodes {
            if block.name.trim().is_empty() {
                return Err(Error::invalid_input("node name cannot be empty"));
            }
            if block.ip.trim().is_empty() {
                return Err(Error::invalid_input(format!(
                    "node '{}' has an empty ip",
                    block.name
                )));
            }
            nodes.push(Node::from(block));
        }

        Ok(Self {
            name: plan.name.clone(),
            namespace: plan.namespace.clone(),
            ip: None,
            ports,
            nodes,
        })
    }

    /// Lookup key of this load balancer
    pub fn key(&self) -> LoadBalancerKey {
        LoadBalancerKey::new(&self.name, &self.namespace)
    }
}

/// Identifies a load balancer on the remote system
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoadBalancerKey {
    /// Name
    pub name: String,
    /// Namespace
    pub namespace: String,
}

impl LoadBalancerKey {
    /// Create a key
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    /// Parse a `namespace/name` state id
    pub fn from_id(id: &str) -> Result<Self> {
        match id.split_once('/') {
            Some((namespace, name)) if !namespace.is_empty() && !name.is_empty() => {
                Ok(Self::new(name, namespace))
            }
            _ => Err(Error::invalid_input(format!(
                "load balancer id '{}' is not of the form namespace/name",
                id
            ))),
        }
    }

    /// Key for persisted state: declared name/namespace, or the id after an import
    pub fn from_state(state: &LoadBalancerState) -> Result<Self> {
        if !state.name.is_empty() && !state.namespace.is_empty() {
            return Ok(Self::new(&state.name, &state.namespace));
        }

        match state.id.as_deref() {
            Some(id) => Self::from_id(id),
            None => Err(Error::invalid_input(
                "load balancer state has neither name/namespace nor id",
            )),
        }
    }

    /// The state id for this key
    pub fn to_id(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid_input("load balancer name cannot be empty"));
        }
        if self.namespace.trim().is_empty() {
            return Err(Error::invalid_input("load balancer namespace cannot be empty"));
        }
        Ok(())
    }
}

impl std::fmt::Display for LoadBalancerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Declared `ports` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortBlock {
    /// Port name (immutable)
    pub name: String,
    /// Protocol
    pub protocol: String,
    /// Exposed port
    pub port: i64,
    /// Backend node port
    pub nodeport: i64,
}

impl PortBlock {
    /// Create a port block
    pub fn new(
        name: impl Into<String>,
        protocol: impl Into<String>,
        port: i64,
        nodeport: i64,
    ) -> Self {
        Self {
            name: name.into(),
            protocol: protocol.into(),
            port,
            nodeport,
        }
    }
}

impl TryFrom<&PortBlock> for Port {
    type Error = Error;

    fn try_from(block: &PortBlock) -> Result<Self> {
        if block.name.trim().is_empty() {
            return Err(Error::invalid_input("port name cannot be empty"));
        }

        let check = |attribute: &str, value: i64| -> Result<u16> {
            if !(MIN_PORT..=MAX_PORT).contains(&value) {
                return Err(Error::invalid_input(format!(
                    "port '{}': {} must be between {} and {}. Got: {}",
                    block.name, attribute, MIN_PORT, MAX_PORT, value
                )));
            }
            // Range checked above.
            Ok(value as u16)
        };

        Ok(Self {
            name: block.name.clone(),
            protocol: block.protocol.clone(),
            port: check("port", block.port)?,
            node_port: check("nodeport", block.nodeport)?,
        })
    }
}

impl From<&Port> for PortBlock {
    fn from(port: &Port) -> Self {
        Self {
            name: port.name.clone(),
            protocol: port.protocol.clone(),
            port: i64::from(port.port),
            nodeport: i64::from(port.node_port),
        }
    }
}

/// Declared `nodes` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeBlock {
    /// Node name
    pub name: String,
    /// Node address
    pub ip: String,
}

impl NodeBlock {
    /// Create a node block
    pub fn new(name: impl Into<String>, ip: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ip: ip.into(),
        }
    }
}

impl From<&NodeBlock> for Node {
    fn from(block: &NodeBlock) -> Self {
        Self {
            name: block.name.clone(),
            ip: block.ip.clone(),
        }
    }
}

impl From<&Node> for NodeBlock {
    fn from(node: &Node) -> Self {
        Self {
            name: node.name.clone(),
            ip: node.ip.clone(),
        }
    }
}

/// Declared configuration of a `loadbalancer` resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancerPlan {
    /// Name (changing it forces replacement)
    pub name: String,
    /// Namespace (changing it forces replacement)
    pub namespace: String,
    /// Ports in declared order
    pub ports: Vec<PortBlock>,
    /// Nodes in declared order
    pub nodes: Vec<NodeBlock>,
}

/// Persisted state of a `loadbalancer` resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancerState {
    /// Opaque state key: `namespace/name` after create, verbatim after import
    pub id: Option<String>,
    /// Address assigned by the remote system
    pub ip: Option<String>,
    /// Name
    #[serde(default)]
    pub name: String,
    /// Namespace
    #[serde(default)]
    pub namespace: String,
    /// Ports
    #[serde(default)]
    pub ports: Vec<PortBlock>,
    /// Nodes
    #[serde(default)]
    pub nodes: Vec<NodeBlock>,
}

impl LoadBalancerState {
    /// State holding only the imported identifier
    pub fn imported(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// True for an import that has not been read back yet
    pub fn awaiting_refresh(&self) -> bool {
        self.id.is_some() && (self.name.is_empty() || self.namespace.is_empty())
    }

    /// Rebuild state from a load balancer record, keeping the given id
    ///
    /// Used both for payloads that were just sent and for live responses;
    /// list order is copied as-is.
    pub fn from_record(record: &LoadBalancer, id: Option<String>, ip: Option<String>) -> Self {
        Self {
            id: id.or_else(|| Some(record.key().to_id())),
            ip,
            name: record.name.clone(),
            namespace: record.namespace.clone(),
            ports: record.ports.iter().map(PortBlock::from).collect(),
            nodes: record.nodes.iter().map(NodeBlock::from).collect(),
        }
    }
}

/// Declared configuration of the read-only `loadbalancer` lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancerLookup {
    /// Name
    pub name: String,
    /// Namespace
    pub namespace: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> LoadBalancerPlan {
        LoadBalancerPlan {
            name: "lb1".to_string(),
            namespace: "prod".to_string(),
            ports: vec![
                PortBlock::new("http", "tcp", 80, 8080),
                PortBlock::new("dns", "udp", 53, 30053),
            ],
            nodes: vec![
                NodeBlock::new("n2", "10.0.0.2"),
                NodeBlock::new("n1", "10.0.0.1"),
            ],
        }
    }

    #[test]
    fn test_payload_wire_shape() {
        let payload = LoadBalancer::from_plan(&plan()).unwrap();
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "name": "lb1",
                "namespace": "prod",
                "ports": [
                    {"name": "http", "protocol": "tcp", "port": 80, "nodeport": 8080},
                    {"name": "dns", "protocol": "udp", "port": 53, "nodeport": 30053}
                ],
                "nodes": [
                    {"name": "n2", "ip": "10.0.0.2"},
                    {"name": "n1", "ip": "10.0.0.1"}
                ]
            })
        );
    }

    #[test]
    fn test_port_range_enforced() {
        let mut bad = plan();
        bad.ports[0].port = 0;
        assert!(LoadBalancer::from_plan(&bad).is_err());

        let mut bad = plan();
        bad.ports[1].nodeport = 65536;
        let err = LoadBalancer::from_plan(&bad).unwrap_err();
        assert!(err.to_string().contains("nodeport"));

        let mut edge = plan();
        edge.ports[0].port = 1;
        edge.ports[0].nodeport = 65535;
        assert!(LoadBalancer::from_plan(&edge).is_ok());
    }

    #[test]
    fn test_duplicate_port_names_rejected() {
        let mut bad = plan();
        bad.ports[1].name = "http".to_string();
        let err = LoadBalancer::from_plan(&bad).unwrap_err();
        assert!(err.to_string().contains("duplicate port name"));
    }

    #[test]
    fn test_state_keeps_list_order() {
        let payload = LoadBalancer::from_plan(&plan()).unwrap();
        let state =
            LoadBalancerState::from_record(&payload, None, Some("10.0.0.99".to_string()));

        assert_eq!(state.id.as_deref(), Some("prod/lb1"));
        assert_eq!(state.ports, plan().ports);
        assert_eq!(state.nodes, plan().nodes);
    }

    #[test]
    fn test_only_unread_imports_await_refresh() {
        assert!(LoadBalancerState::imported("prod/lb1").awaiting_refresh());
        assert!(!LoadBalancerState::default().awaiting_refresh());

        let payload = LoadBalancer::from_plan(&plan()).unwrap();
        let state = LoadBalancerState::from_record(&payload, None, None);
        assert!(!state.awaiting_refresh());
    }

    #[test]
    fn test_key_from_imported_state() {
        let key = LoadBalancerKey::from_state(&LoadBalancerState::imported("prod/lb1")).unwrap();
        assert_eq!(key, LoadBalancerKey::new("lb1", "prod"));

        assert!(LoadBalancerKey::from_state(&LoadBalancerState::imported("lb1")).is_err());
        assert!(LoadBalancerKey::from_state(&LoadBalancerState::default()).is_err());
    }

    #[test]
    fn test_response_without_lists_decodes() {
        let lb: LoadBalancer =
            serde_json::from_str(r#"{"name":"lb1","namespace":"prod","ip":"10.0.0.99"}"#).unwrap();
        assert_eq!(lb.ip.as_deref(), Some("10.0.0.99"));
        assert!(lb.ports.is_empty());
    }
}
