//! Minimal embedding example for libvirtapi-core
//!
//! Drives a network and a load balancer through their whole lifecycle
//! against a live libvirtApi service, with an in-memory state store standing
//! in for the host tool.
//!
//! ```text
//! LIBVIRTAPI_HOST=http://127.0.0.1:8050 \
//! LIBVIRTAPI_USERNAME=admin LIBVIRTAPI_PASSWORD=... \
//! LIBVIRTAPI_LOG_LEVEL=debug cargo run --bin embedded_usage
//! ```

use std::sync::Arc;

use anyhow::Context;
use libvirtapi_client::LibvirtApiClient;
use libvirtapi_core::model::{LoadBalancerPlan, NetworkLookup, NetworkPlan, NodeBlock, PortBlock};
use libvirtapi_core::{MemoryStateStore, ProviderConfig, Provider, ReadOutcome, StateStore};
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

const NETWORK: &str = "libvirtapi_network.demo";
const LOAD_BALANCER: &str = "libvirtapi_loadbalancer.demo";

fn init_tracing() -> anyhow::Result<()> {
    let level = match std::env::var("LIBVIRTAPI_LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    // Everything comes from LIBVIRTAPI_* here; a host tool would pass its
    // declared provider block instead.
    let client = LibvirtApiClient::from_config(&ProviderConfig::new())
        .context("libvirtApi provider is not configured")?;
    let store = MemoryStateStore::new();
    let provider = Provider::new(Arc::new(client), Arc::new(store.clone()));

    // Network
    let network = provider
        .apply_network(NETWORK, &NetworkPlan::new("demo-net"))
        .await?;
    info!("Network state: {}", serde_json::to_string(&network)?);

    if let (Some(id), Some(status)) = (network.id, network.status.clone()) {
        let checked = provider
            .lookup_network(&NetworkLookup {
                id,
                name: network.name.clone(),
                status,
            })
            .await?;
        info!("Network lookup confirmed {} ({})", checked.name, checked.id);
    }

    // Load balancer
    let mut plan = LoadBalancerPlan {
        name: "demo-lb".to_string(),
        namespace: "default".to_string(),
        ports: vec![PortBlock::new("http", "tcp", 80, 30080)],
        nodes: vec![NodeBlock::new("worker-1", "10.0.0.11")],
    };
    let created = provider.apply_load_balancer(LOAD_BALANCER, &plan).await?;
    info!(
        "Load balancer {} listening on {}",
        created.id.as_deref().unwrap_or_default(),
        created.ip.as_deref().unwrap_or_default()
    );

    plan.nodes.push(NodeBlock::new("worker-2", "10.0.0.12"));
    let action = provider.plan_load_balancer(LOAD_BALANCER, &plan).await?;
    info!("Adding a node plans as {:?}", action);
    provider.apply_load_balancer(LOAD_BALANCER, &plan).await?;

    match provider.read_load_balancer(LOAD_BALANCER).await? {
        ReadOutcome::Present(state) => info!(
            "Live load balancer has {} ports and {} nodes",
            state.ports.len(),
            state.nodes.len()
        ),
        ReadOutcome::Missing => warn!("Load balancer vanished before cleanup"),
    }

    // Cleanup
    if store.get(LOAD_BALANCER).await?.is_some() {
        provider.delete_load_balancer(LOAD_BALANCER).await?;
    }
    provider.delete_network(NETWORK).await?;

    info!("Done; {} snapshot(s) left in state", store.len().await);
    Ok(())
}
