// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! CLI module for neo4j-http
//!
//! Provides one-off statement execution, an interactive Cypher console
//! (REPL) with explicit transactions, and a server reachability check.

pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{Cli, Commands};
pub use handlers::{build_config, handle_ping, handle_query, handle_shell, handle_version, CliError};
