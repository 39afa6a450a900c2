// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! CLI command definitions for neo4j-http

use clap::{Parser, Subcommand, ValueEnum};
use neo4j_http::QueryLogLevel;
use std::path::PathBuf;

/// Log level options
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only errors
    Error,
    /// Warnings and errors
    Warn,
    /// Info, warnings, and errors
    Info,
    /// Debug messages and above (verbose)
    Debug,
    /// All messages including trace (very verbose)
    Trace,
    /// Disable all logging
    Off,
}

impl LogLevel {
    /// Convert to log::LevelFilter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Off => log::LevelFilter::Off,
        }
    }
}

/// neo4j-http CLI - Cypher over the Neo4j transactional HTTP API
#[derive(Parser)]
#[command(name = "neo4j-http")]
#[command(about = "neo4j-http - Run Cypher over the Neo4j transactional HTTP API")]
#[command(version)]
pub struct Cli {
    /// Server base URL (defaults to NEO4J_URL or http://localhost:7474)
    #[arg(long = "url", global = true)]
    pub url: Option<String>,

    /// Username for authentication
    #[arg(short = 'u', long = "user", global = true)]
    pub user: Option<String>,

    /// Password for authentication (if not provided, will be prompted)
    #[arg(short = 'p', long = "password", global = true)]
    pub password: Option<String>,

    /// Database name
    #[arg(short = 'd', long = "database", global = true)]
    pub database: Option<String>,

    /// JSON configuration file, applied before the other options
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Query log level (off, on, debug)
    #[arg(long = "query-log", global = true)]
    pub query_log: Option<QueryLogLevel>,

    /// Set log level (error, warn, info, debug, trace, off)
    #[arg(short = 'l', long = "log-level", global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Verbose mode (equivalent to --log-level debug)
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Show detailed version information
    Version,

    /// Execute Cypher statements as one one-shot transaction
    Query {
        /// Statements to execute, sent in order within one request
        #[arg(required = true)]
        statements: Vec<String>,

        /// Statement parameter as name=value; value is parsed as JSON, else taken as a string
        #[arg(short = 'P', long = "param")]
        params: Vec<String>,

        /// Run as a read transaction
        #[arg(short, long)]
        read: bool,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,

        /// Request and show query statistics
        #[arg(short, long)]
        stats: bool,

        /// Print the undecoded results array
        #[arg(long)]
        raw: bool,
    },

    /// Interactive Cypher console (REPL)
    Shell {
        /// Open transactions in read mode unless `:begin write` is given
        #[arg(short, long)]
        read: bool,
    },

    /// Check that the server is reachable and print its discovery document
    Ping,
}

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}
