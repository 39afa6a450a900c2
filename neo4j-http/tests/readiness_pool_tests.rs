// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Readiness probe and pool behavior seen through the client

#[path = "testutils/mod.rs"]
mod testutils;

use neo4j_http::{AccessMode, Client, Error, RequestError};
use serde_json::json;
use std::time::Duration;
use testutils::fake_server::{discovery_document, FakeServer};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[test]
fn test_unready_server_is_retried_then_reported() {
    let fake = FakeServer::start();
    fake.mount(
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(503)),
    );

    let config = fake
        .config()
        .with_upstream_wait(Duration::from_millis(100), Duration::from_millis(25));
    let client = Client::new(config).expect("Failed to create client");

    match client.transaction(AccessMode::Write) {
        Err(Error::Request(RequestError::ServerUnavailable { url, .. })) => {
            assert_eq!(url, fake.uri());
        }
        other => panic!("expected ServerUnavailable, got {:?}", other),
    }

    // First probe plus ceil(100 / 25) retries.
    assert_eq!(fake.received_on("GET", "/").len(), 5);
    assert!(!client.pool().is_server_ready());
    assert_eq!(client.pool().in_use(), 0);
}

#[test]
fn test_server_becoming_ready_is_accepted() {
    let fake = FakeServer::start();
    fake.mount(
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2),
    );
    fake.mount(
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(discovery_document())),
    );

    let config = fake
        .config()
        .with_upstream_wait(Duration::from_secs(1), Duration::from_millis(10));
    let client = Client::new(config).expect("Failed to create client");

    client.transaction(AccessMode::Read).expect("server becomes ready");

    assert_eq!(fake.received_on("GET", "/").len(), 3);
    assert!(client.pool().is_server_ready());
}

#[test]
fn test_discovery_without_version_marker_is_not_ready() {
    let fake = FakeServer::start();
    fake.mount(
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "starting" }))),
    );

    let result = fake.client().executor(AccessMode::Read);

    assert!(matches!(
        result,
        Err(Error::Request(RequestError::ServerUnavailable { .. }))
    ));
}

#[test]
fn test_readiness_is_probed_once_per_pool() {
    let fake = FakeServer::ready();
    let client = fake.client();

    for _ in 0..3 {
        let executor = client.executor(AccessMode::Read).expect("Failed to get executor");
        drop(executor);
    }

    assert_eq!(fake.received_on("GET", "/").len(), 1);
}

#[test]
fn test_exhausted_pool_times_out() {
    let fake = FakeServer::ready();
    let client = Client::new(
        fake.config()
            .with_pool_size(1)
            .with_pool_timeout(Duration::from_millis(50)),
    )
    .expect("Failed to create client");

    let held = client.transaction(AccessMode::Write).expect("first checkout");

    match client.transaction(AccessMode::Write) {
        Err(Error::Request(RequestError::PoolExhausted(timeout))) => {
            assert_eq!(timeout, Duration::from_millis(50));
        }
        other => panic!("expected PoolExhausted, got {:?}", other),
    }

    drop(held);
    client.transaction(AccessMode::Write).expect("connection returned");
}

#[test]
fn test_tolerant_helper_absorbs_exhausted_pool() {
    let fake = FakeServer::ready();
    let client = Client::new(
        fake.config()
            .with_pool_size(1)
            .with_pool_timeout(Duration::from_millis(20)),
    )
    .expect("Failed to create client");

    let _held = client.executor(AccessMode::Write).expect("first checkout");

    let outcome = client
        .with_transaction_quietly(AccessMode::Write, |_tx| Ok(()))
        .expect("pool exhaustion is recoverable");

    assert!(outcome.is_none());
}

#[test]
fn test_shutdown_closes_pool() {
    let fake = FakeServer::ready();
    let client = fake.client();
    client.executor(AccessMode::Read).expect("Failed to get executor");
    assert_eq!(client.pool().idle_count(), 1);

    client.shutdown();
    client.shutdown();

    assert!(client.pool().is_closed());
    assert_eq!(client.pool().idle_count(), 0);
    assert!(matches!(
        client.transaction(AccessMode::Read),
        Err(Error::Request(RequestError::PoolClosed))
    ));
}
