// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! neo4j-http - Blocking client for the Neo4j transactional HTTP API
//!
//! This crate sends Cypher statements to a Neo4j server over its HTTP
//! endpoint (`/db/{database}/tx`), either inside explicit multi-request
//! transactions or as one-shot transactions, and maps the JSON answers to
//! tabular result sets.
//!
//! # Quick Start
//!
//! ```no_run
//! use neo4j_http::{AccessMode, Client, Config};
//!
//! # fn main() -> neo4j_http::Result<()> {
//! let client = Client::new(Config::default().with_credentials("neo4j", "secret"))?;
//!
//! let results = client.with_one_shot(AccessMode::Read, |statements| {
//!     statements.add_statement("MATCH (n:User) RETURN n.name AS name LIMIT 10");
//! })?;
//!
//! if let Some(set) = results.first() {
//!     for row in set {
//!         println!("{}", row["name"]);
//!     }
//! }
//!
//! client.shutdown();
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │   Application Code                      │
//! └─────────────────────────────────────────┘
//!                  │
//!                  ▼
//! ┌─────────────────────────────────────────┐
//! │  Client                                 │
//! │  - with_transaction / _quietly          │
//! │  - with_one_shot (StatementCollector)   │
//! │  - Transaction (state machine)          │
//! └─────────────────────────────────────────┘
//!                  │
//!                  ▼
//! ┌─────────────────────────────────────────┐
//! │  RequestExecutor                        │
//! │  - begin / run / commit / rollback      │
//! │  - ResultMapper, QueryLogger            │
//! └─────────────────────────────────────────┘
//!                  │
//!                  ▼
//! ┌─────────────────────────────────────────┐
//! │  ConnectionPool                         │
//! │  - bounded, lazily filled               │
//! │  - readiness probe                      │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Module Organization
//!
//! - [`client`] - Entry point and orchestration helpers
//! - [`transaction`] - Explicit transactions and their states
//! - [`executor`] - HTTP calls of the transactional protocol
//! - [`pool`] - Connection pool and readiness probe
//! - [`result`] - Response decoding and result sets
//! - [`statement`] - Statement encoding
//! - [`cypher`] - Literal escaping for query logs
//! - [`query_log`] - Timed query logging
//! - [`config`] - Configuration
//! - [`error`] - Error types

pub mod client;
pub mod collector;
pub mod config;
pub mod cypher;
pub mod error;
pub mod executor;
pub mod pool;
pub mod query_log;
pub mod result;
pub mod statement;
pub mod transaction;

pub use client::{Client, ServerInfo};
pub use collector::StatementCollector;
pub use config::{Config, QueryLogLevel};
pub use error::{Error, RequestError, ResponseError, Result};
pub use executor::{AccessMode, RequestExecutor};
pub use pool::{ConnectionPool, PooledConnection};
pub use result::{GraphFragment, ResponseHook, ResultMapper, ResultRow, ResultSet, Results};
pub use statement::{encode, encode_batch, Parameters, Statement};
pub use transaction::{Transaction, TransactionId, TransactionState};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
