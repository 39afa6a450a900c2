// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! In-process fake of the Neo4j HTTP endpoint
//!
//! The mock server lives on its own tokio runtime; the blocking client under
//! test is always driven from the plain test thread.

use neo4j_http::{Client, Config};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::runtime::Runtime;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const DATABASE: &str = "neo4j";

pub struct FakeServer {
    runtime: Runtime,
    server: MockServer,
}

impl FakeServer {
    /// A server that answers nothing until mocks are mounted
    pub fn start() -> Self {
        let runtime = Runtime::new().expect("Failed to create runtime");
        let server = runtime.block_on(MockServer::start());
        Self { runtime, server }
    }

    /// A server whose discovery document passes the readiness probe
    pub fn ready() -> Self {
        let fake = Self::start();
        fake.mount(
            Mock::given(method("GET"))
                .and(path("/"))
                .respond_with(ResponseTemplate::new(200).set_body_json(discovery_document())),
        );
        fake
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn mount(&self, mock: Mock) {
        self.runtime.block_on(mock.mount(&self.server));
    }

    pub fn received(&self) -> Vec<Request> {
        self.runtime
            .block_on(self.server.received_requests())
            .unwrap_or_default()
    }

    /// Requests received for `method` on `path`
    pub fn received_on(&self, method: &str, path: &str) -> Vec<Request> {
        self.received()
            .into_iter()
            .filter(|r| r.method.as_str() == method && r.url.path() == path)
            .collect()
    }

    /// Config pointing at this server with short timeouts and no upstream wait
    pub fn config(&self) -> Config {
        Config::default()
            .with_uri(self.uri())
            .with_credentials("neo4j", "secret")
            .with_pool_size(2)
            .with_pool_timeout(Duration::from_millis(200))
            .with_request_timeout(Duration::from_secs(5))
            .with_upstream_wait(Duration::ZERO, Duration::from_millis(10))
    }

    pub fn client(&self) -> Client {
        Client::new(self.config()).expect("Failed to create client")
    }

    pub fn tx_path(&self) -> String {
        format!("/db/{}/tx", DATABASE)
    }

    pub fn tx_location(&self, id: u64) -> String {
        format!("{}/db/{}/tx/{}", self.uri(), DATABASE, id)
    }

    /// Mount a begin endpoint handing out transaction `id`
    pub fn mount_begin(&self, id: u64) {
        self.mount(
            Mock::given(method("POST"))
                .and(path(self.tx_path()))
                .respond_with(
                    ResponseTemplate::new(201)
                        .insert_header("Location", self.tx_location(id).as_str())
                        .set_body_json(open_transaction_body(&self.tx_location(id))),
                ),
        );
    }
}

pub fn discovery_document() -> Value {
    json!({
        "bolt_routing": "neo4j://localhost:7687",
        "transaction": "http://localhost:7474/db/{databaseName}/tx",
        "bolt_direct": "bolt://localhost:7687",
        "neo4j_version": "5.20.0",
        "neo4j_edition": "community"
    })
}

pub fn open_transaction_body(location: &str) -> Value {
    json!({
        "results": [],
        "errors": [],
        "commit": format!("{}/commit", location),
        "transaction": { "expires": "Fri, 16 Oct 2026 10:00:00 GMT" }
    })
}

/// One entry of a `results` array
pub fn result_set(columns: &[&str], rows: Vec<Value>) -> Value {
    json!({
        "columns": columns,
        "data": rows
            .into_iter()
            .map(|row| json!({ "row": row, "meta": [] }))
            .collect::<Vec<_>>()
    })
}

pub fn results_body(sets: Vec<Value>) -> Value {
    json!({ "results": sets, "errors": [] })
}

pub fn error_body(code: &str, message: &str) -> Value {
    json!({
        "results": [],
        "errors": [{ "code": code, "message": message }]
    })
}

/// Decoded JSON body of a recorded request
pub fn request_json(request: &Request) -> Value {
    serde_json::from_slice(&request.body).expect("Request body is not JSON")
}
