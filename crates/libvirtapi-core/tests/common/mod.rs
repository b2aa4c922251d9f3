//! Test doubles and common utilities for reconciler contract tests
//!
//! `StubApi` stands in for the libvirtApi service: it keeps networks and
//! load balancers in memory, counts every call and can be told to fail the
//! next call with a given status.

#![allow(dead_code)]

use libvirtapi_core::error::{Error, Result};
use libvirtapi_core::model::{
    LoadBalancer, LoadBalancerKey, LoadBalancerPlan, NewNetwork, Network, NodeBlock, PortBlock,
};
use libvirtapi_core::traits::{LoadBalancerApi, Lookup, NetworkApi};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

/// In-memory stand-in for the remote API
pub struct StubApi {
    networks: Mutex<HashMap<i64, Network>>,
    load_balancers: Mutex<HashMap<LoadBalancerKey, LoadBalancer>>,
    next_id: AtomicI64,
    assigned_ip: Mutex<String>,
    network_status: Mutex<String>,
    fail_next: Mutex<Option<(u16, String)>>,
    create_calls: AtomicUsize,
    get_calls: AtomicUsize,
    update_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    /// Every call as "<operation> <target>", in order
    calls: Mutex<Vec<String>>,
    /// Every load balancer payload sent by create or update
    sent_load_balancers: Mutex<Vec<LoadBalancer>>,
}

impl StubApi {
    /// Stub that assigns network id 42 and load balancer address 10.0.0.99
    pub fn new() -> Self {
        Self {
            networks: Mutex::new(HashMap::new()),
            load_balancers: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(42),
            assigned_ip: Mutex::new("10.0.0.99".to_string()),
            network_status: Mutex::new("active".to_string()),
            fail_next: Mutex::new(None),
            create_calls: AtomicUsize::new(0),
            get_calls: AtomicUsize::new(0),
            update_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
            sent_load_balancers: Mutex::new(Vec::new()),
        }
    }

    /// Address returned by the next load balancer create
    pub fn assign_ip(&self, ip: &str) {
        *self.assigned_ip.lock().unwrap() = ip.to_string();
    }

    /// Make the next call fail with a non-2xx response
    pub fn fail_next(&self, status: u16, body: &str) {
        *self.fail_next.lock().unwrap() = Some((status, body.to_string()));
    }

    /// Place a network on the remote side directly
    pub fn insert_network(&self, network: Network) {
        self.networks.lock().unwrap().insert(network.id, network);
    }

    /// Change a network on the remote side behind the provider's back
    pub fn rename_network(&self, id: i64, name: &str) {
        if let Some(network) = self.networks.lock().unwrap().get_mut(&id) {
            network.name = name.to_string();
        }
    }

    /// Change a network's status on the remote side
    pub fn set_network_status(&self, id: i64, status: &str) {
        if let Some(network) = self.networks.lock().unwrap().get_mut(&id) {
            network.status = status.to_string();
        }
    }

    /// Place a load balancer on the remote side directly
    pub fn insert_load_balancer(&self, load_balancer: LoadBalancer) {
        self.load_balancers
            .lock()
            .unwrap()
            .insert(load_balancer.key(), load_balancer);
    }

    /// Remove everything on the remote side
    pub fn wipe(&self) {
        self.networks.lock().unwrap().clear();
        self.load_balancers.lock().unwrap().clear();
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    /// Total number of remote calls
    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sent_load_balancers(&self) -> Vec<LoadBalancer> {
        self.sent_load_balancers.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        match self.fail_next.lock().unwrap().take() {
            Some((status, body)) => Err(Error::api(status, body)),
            None => Ok(()),
        }
    }
}

impl Default for StubApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl NetworkApi for StubApi {
    async fn create_network(&self, payload: &NewNetwork) -> Result<Network> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.record(format!("create_network {}", payload.name))?;

        let network = Network {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            name: payload.name.clone(),
            status: self.network_status.lock().unwrap().clone(),
        };
        self.insert_network(network.clone());
        Ok(network)
    }

    async fn get_network(&self, id: i64) -> Result<Lookup<Network>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.record(format!("get_network {}", id))?;

        Ok(match self.networks.lock().unwrap().get(&id) {
            Some(network) => Lookup::Found(network.clone()),
            None => Lookup::NotFound,
        })
    }

    async fn delete_network(&self, id: i64) -> Result<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.record(format!("delete_network {}", id))?;

        self.networks.lock().unwrap().remove(&id);
        Ok(())
    }
}

#[async_trait::async_trait]
impl LoadBalancerApi for StubApi {
    async fn create_load_balancer(&self, payload: &LoadBalancer) -> Result<String> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.record(format!("create_load_balancer {}", payload.key()))?;
        self.sent_load_balancers.lock().unwrap().push(payload.clone());

        let ip = self.assigned_ip.lock().unwrap().clone();
        let mut stored = payload.clone();
        stored.ip = Some(ip.clone());
        self.insert_load_balancer(stored);
        Ok(ip)
    }

    async fn get_load_balancer(&self, key: &LoadBalancerKey) -> Result<Lookup<LoadBalancer>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.record(format!("get_load_balancer {}", key))?;

        Ok(match self.load_balancers.lock().unwrap().get(key) {
            Some(load_balancer) => Lookup::Found(load_balancer.clone()),
            None => Lookup::NotFound,
        })
    }

    async fn update_load_balancer(&self, payload: &LoadBalancer) -> Result<()> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        self.record(format!("update_load_balancer {}", payload.key()))?;
        self.sent_load_balancers.lock().unwrap().push(payload.clone());

        let mut load_balancers = self.load_balancers.lock().unwrap();
        match load_balancers.get_mut(&payload.key()) {
            Some(existing) => {
                existing.ports = payload.ports.clone();
                existing.nodes = payload.nodes.clone();
                Ok(())
            }
            None => Err(Error::api(404, "load balancer not found")),
        }
    }

    async fn delete_load_balancer(&self, key: &LoadBalancerKey) -> Result<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.record(format!("delete_load_balancer {}", key))?;

        self.load_balancers.lock().unwrap().remove(key);
        Ok(())
    }
}

/// `lb1` in `prod` with one port and one node
pub fn lb1_plan() -> LoadBalancerPlan {
    LoadBalancerPlan {
        name: "lb1".to_string(),
        namespace: "prod".to_string(),
        ports: vec![PortBlock::new("http", "tcp", 80, 8080)],
        nodes: vec![NodeBlock::new("n1", "10.0.0.1")],
    }
}

/// Plan with several ports and nodes in a deliberately unsorted order
pub fn unsorted_plan() -> LoadBalancerPlan {
    LoadBalancerPlan {
        name: "edge".to_string(),
        namespace: "prod".to_string(),
        ports: vec![
            PortBlock::new("https", "tcp", 443, 30443),
            PortBlock::new("dns", "udp", 53, 30053),
            PortBlock::new("http", "tcp", 80, 30080),
        ],
        nodes: vec![
            NodeBlock::new("n3", "10.0.0.3"),
            NodeBlock::new("n1", "10.0.0.1"),
            NodeBlock::new("n2", "10.0.0.2"),
        ],
    }
}
