//! Contract Test: State commit discipline
//!
//! Constraints verified:
//! - Snapshots are written only after the remote call succeeded
//! - A failed delete leaves the snapshot in place
//! - A read that finds the resource gone removes the snapshot
//! - Applying the same plan twice performs no second remote write
//! - Applying over a fresh import adopts the existing resource instead of
//!   replacing it
//!
//! If this test fails, the host's view of reality can drift.

mod common;

use common::*;
use libvirtapi_core::model::{LoadBalancerState, Network, NetworkPlan, NetworkState};
use libvirtapi_core::{
    LOAD_BALANCER_TYPE_NAME, MemoryStateStore, NETWORK_TYPE_NAME, PlanAction, Provider,
    ReadOutcome, StateStore,
};
use std::sync::Arc;

const NET: &str = "libvirtapi_network.web";
const LB: &str = "libvirtapi_loadbalancer.edge";

fn provider(api: &Arc<StubApi>, store: &MemoryStateStore) -> Provider {
    Provider::new(api.clone(), Arc::new(store.clone()))
}

#[tokio::test]
async fn create_commits_snapshot() {
    let api = Arc::new(StubApi::new());
    let store = MemoryStateStore::new();

    provider(&api, &store)
        .create_network(NET, &NetworkPlan::new("web-1"))
        .await
        .unwrap();

    let record = store.get(NET).await.unwrap().expect("snapshot written");
    assert_eq!(record.resource_type, NETWORK_TYPE_NAME);
    let state: NetworkState = record.decode().unwrap();
    assert_eq!(state.id, Some(42));
}

#[tokio::test]
async fn failed_create_writes_nothing() {
    let api = Arc::new(StubApi::new());
    let store = MemoryStateStore::new();
    api.fail_next(500, "boom");

    let result = provider(&api, &store)
        .create_load_balancer(LB, &lb1_plan())
        .await;

    assert!(result.is_err());
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn failed_delete_keeps_snapshot() {
    let api = Arc::new(StubApi::new());
    let store = MemoryStateStore::new();
    let provider = provider(&api, &store);
    let created = provider.create_load_balancer(LB, &lb1_plan()).await.unwrap();

    api.fail_next(500, "backend busy");
    assert!(provider.delete_load_balancer(LB).await.is_err());

    let kept: LoadBalancerState = store.get(LB).await.unwrap().unwrap().decode().unwrap();
    assert_eq!(kept, created);

    provider.delete_load_balancer(LB).await.unwrap();
    assert!(store.get(LB).await.unwrap().is_none());
}

#[tokio::test]
async fn missing_on_read_removes_snapshot() {
    let api = Arc::new(StubApi::new());
    let store = MemoryStateStore::new();
    let provider = provider(&api, &store);
    provider
        .create_network(NET, &NetworkPlan::new("web-1"))
        .await
        .unwrap();
    api.wipe();

    let outcome = provider.read_network(NET).await.unwrap();

    assert!(outcome.is_missing());
    assert!(store.get(NET).await.unwrap().is_none());
}

#[tokio::test]
async fn failed_read_keeps_snapshot() {
    let api = Arc::new(StubApi::new());
    let store = MemoryStateStore::new();
    let provider = provider(&api, &store);
    provider
        .create_network(NET, &NetworkPlan::new("web-1"))
        .await
        .unwrap();
    api.fail_next(502, "bad gateway");

    assert!(provider.read_network(NET).await.is_err());
    assert!(store.get(NET).await.unwrap().is_some());
}

#[tokio::test]
async fn apply_twice_writes_once() {
    let api = Arc::new(StubApi::new());
    let store = MemoryStateStore::new();
    let provider = provider(&api, &store);

    let first = provider.apply_load_balancer(LB, &unsorted_plan()).await.unwrap();
    assert_eq!(
        provider.plan_load_balancer(LB, &unsorted_plan()).await.unwrap(),
        PlanAction::NoOp
    );
    let second = provider.apply_load_balancer(LB, &unsorted_plan()).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(api.create_calls(), 1);
    assert_eq!(api.update_calls(), 0);
}

#[tokio::test]
async fn apply_replaces_on_rename() {
    let api = Arc::new(StubApi::new());
    let store = MemoryStateStore::new();
    let provider = provider(&api, &store);
    provider
        .apply_network(NET, &NetworkPlan::new("web-1"))
        .await
        .unwrap();

    let replaced = provider
        .apply_network(NET, &NetworkPlan::new("web-2"))
        .await
        .unwrap();

    assert_eq!(replaced.id, Some(43));
    assert_eq!(
        api.calls(),
        vec![
            "create_network web-1",
            "delete_network 42",
            "create_network web-2"
        ]
    );
}

#[tokio::test]
async fn import_then_read_fills_snapshot() {
    let api = Arc::new(StubApi::new());
    let store = MemoryStateStore::new();
    let provider = provider(&api, &store);
    provider.create_load_balancer(LB, &lb1_plan()).await.unwrap();
    store.remove(LB).await.unwrap();

    provider.import_load_balancer(LB, "prod/lb1").await.unwrap();
    let outcome = provider.read_load_balancer(LB).await.unwrap();

    let ReadOutcome::Present(state) = outcome else {
        panic!("load balancer should exist");
    };
    assert_eq!(state.ip.as_deref(), Some("10.0.0.99"));

    let record = store.get(LB).await.unwrap().unwrap();
    assert_eq!(record.resource_type, LOAD_BALANCER_TYPE_NAME);
    assert_eq!(record.decode::<LoadBalancerState>().unwrap(), state);
}

#[tokio::test]
async fn import_then_apply_adopts_network() {
    let api = Arc::new(StubApi::new());
    let store = MemoryStateStore::new();
    let provider = provider(&api, &store);
    api.insert_network(Network {
        id: 7,
        name: "db".to_string(),
        status: "active".to_string(),
    });

    provider.import_network(NET, "7").await.unwrap();
    assert_eq!(
        provider.plan_network(NET, &NetworkPlan::new("db")).await.unwrap(),
        PlanAction::NoOp
    );
    let applied = provider
        .apply_network(NET, &NetworkPlan::new("db"))
        .await
        .unwrap();

    assert_eq!(applied.id, Some(7));
    assert_eq!(applied.status.as_deref(), Some("active"));
    assert_eq!(api.create_calls(), 0);
    assert_eq!(api.delete_calls(), 0);

    let stored: NetworkState = store.get(NET).await.unwrap().unwrap().decode().unwrap();
    assert_eq!(stored, applied);
}

#[tokio::test]
async fn import_then_apply_adopts_load_balancer() {
    let api = Arc::new(StubApi::new());
    let store = MemoryStateStore::new();
    let provider = provider(&api, &store);
    provider.create_load_balancer(LB, &lb1_plan()).await.unwrap();
    store.remove(LB).await.unwrap();

    provider.import_load_balancer(LB, "prod/lb1").await.unwrap();
    let applied = provider.apply_load_balancer(LB, &lb1_plan()).await.unwrap();

    assert_eq!(applied.id.as_deref(), Some("prod/lb1"));
    assert_eq!(applied.ip.as_deref(), Some("10.0.0.99"));
    assert_eq!(api.create_calls(), 1);
    assert_eq!(api.update_calls(), 0);
    assert_eq!(api.delete_calls(), 0);
}

#[tokio::test]
async fn import_of_vanished_resource_plans_create() {
    let api = Arc::new(StubApi::new());
    let store = MemoryStateStore::new();
    let provider = provider(&api, &store);

    provider.import_network(NET, "7").await.unwrap();
    let action = provider
        .plan_network(NET, &NetworkPlan::new("db"))
        .await
        .unwrap();

    assert_eq!(action, PlanAction::Create);
    assert!(store.get(NET).await.unwrap().is_none());
}

#[tokio::test]
async fn snapshot_of_other_kind_is_rejected() {
    let api = Arc::new(StubApi::new());
    let store = MemoryStateStore::new();
    let provider = provider(&api, &store);
    provider
        .create_network(NET, &NetworkPlan::new("web-1"))
        .await
        .unwrap();

    assert!(provider.read_load_balancer(NET).await.is_err());
    assert_eq!(api.get_calls(), 0);
}
