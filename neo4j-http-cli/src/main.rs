// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! neo4j-http command-line entry point

mod cli;

use clap::Parser;
use colored::Colorize;
use neo4j_http::{query_log, QueryLogLevel};

use cli::{
    build_config, handle_ping, handle_query, handle_shell, handle_version, Cli, CliError, Commands,
};

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        cli.log_level
            .map(|l| l.to_level_filter())
            .unwrap_or(log::LevelFilter::Warn)
    };
    let mut logger = env_logger::Builder::from_default_env();
    logger.filter_level(level);
    if matches!(cli.query_log, Some(q) if q != QueryLogLevel::Off) {
        logger.filter_module(query_log::LOG_TARGET, log::LevelFilter::Debug);
    }
    logger.init();

    if let Err(e) = run(cli) {
        eprintln!("{}", format!("Error: {}", e).red());
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    if let Commands::Version = cli.command {
        handle_version();
        return Ok(());
    }

    let config = build_config(&cli)?;

    match cli.command {
        Commands::Version => Ok(()),
        Commands::Query {
            statements,
            params,
            read,
            format,
            stats,
            raw,
        } => handle_query(config, statements, params, read, format, stats, raw),
        Commands::Shell { read } => handle_shell(config, read),
        Commands::Ping => handle_ping(config),
    }
}
