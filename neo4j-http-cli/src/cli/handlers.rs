// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! CLI command handlers for neo4j-http

use colored::Colorize;
use neo4j_http::{
    AccessMode, Client, Config, Parameters, Statement, Transaction, TransactionState,
};
use rustyline::{error::ReadlineError, CompletionType, Config as EditorConfig, EditMode, Editor};
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;

use super::commands::{Cli, OutputFormat};
use super::output::ResultFormatter;

/// Errors raised by the CLI itself, before any request is made
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid parameter '{0}': expected name=value")]
    InvalidParameter(String),

    #[error("{0}")]
    Client(#[from] neo4j_http::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Console error: {0}")]
    Readline(#[from] ReadlineError),
}

pub type CliResult<T> = Result<T, CliError>;

/// Access mode selected by a `--read` flag
pub fn access_mode(read: bool) -> AccessMode {
    if read {
        AccessMode::Read
    } else {
        AccessMode::Write
    }
}

/// Build the client configuration: file or environment first, then options
pub fn build_config(cli: &Cli) -> CliResult<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };

    if let Some(url) = &cli.url {
        config = config.with_uri(url.clone());
    }
    if let Some(database) = &cli.database {
        config = config.with_database(database.clone());
    }
    if let Some(level) = cli.query_log {
        config = config.with_query_log(level);
    }

    if let Some(user) = &cli.user {
        let password = match &cli.password {
            Some(password) => password.clone(),
            None => {
                print!("Password: ");
                std::io::Write::flush(&mut std::io::stdout())?;
                rpassword::read_password()?
            }
        };
        config = config.with_credentials(user.clone(), password);
    } else if let Some(password) = &cli.password {
        config.password = Some(password.clone());
    }

    config.validate()?;
    Ok(config)
}

/// Parse `name=value`; the value is JSON when it parses as JSON, else a string
pub fn parse_param(raw: &str) -> CliResult<(String, Value)> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| CliError::InvalidParameter(raw.to_string()))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(CliError::InvalidParameter(raw.to_string()));
    }

    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((name.to_string(), value))
}

/// Statement for the query command; `--stats` only ever turns statistics on,
/// so a `with_stats` parameter is kept when the flag is absent
fn query_statement(text: &str, parameters: &Parameters, stats: bool) -> Statement {
    let statement = Statement::new(text).with_parameters(parameters.clone());
    if stats {
        statement.with_stats(true)
    } else {
        statement
    }
}

/// Handle the query command (one-shot execution)
pub fn handle_query(
    config: Config,
    statements: Vec<String>,
    params: Vec<String>,
    read: bool,
    format: OutputFormat,
    stats: bool,
    raw: bool,
) -> CliResult<()> {
    let mut parameters = Parameters::new();
    for param in &params {
        let (name, value) = parse_param(param)?;
        parameters.insert(name, value);
    }

    let client = Client::new(config.with_raw_results(raw))?;
    let outcome = client.with_one_shot(access_mode(read), |collector| {
        for text in &statements {
            collector.add_statement(query_statement(text, &parameters, stats));
        }
    });
    client.shutdown();

    let results = outcome?;
    println!("{}", ResultFormatter::format(&results, format));
    if stats {
        if let Some(summary) = ResultFormatter::format_stats(&results) {
            println!("{}", summary.cyan());
        }
    }
    Ok(())
}

/// Handle the ping command
pub fn handle_ping(config: Config) -> CliResult<()> {
    let client = Client::new(config)?;
    let outcome = client.server_info();
    client.shutdown();

    let info = outcome?;
    println!(
        "{}",
        format!(
            "Neo4j {} ({}) at {}",
            info.neo4j_version,
            info.neo4j_edition.as_deref().unwrap_or("unknown edition"),
            client.config().base_url()
        )
        .green()
    );
    if let Some(transaction) = &info.transaction {
        println!("Transaction endpoint: {}", transaction);
    }
    if let Some(bolt) = &info.bolt_direct {
        println!("Bolt: {}", bolt);
    }
    Ok(())
}

/// Handle the version command
pub fn handle_version() {
    println!("{}", format!("neo4j-http {}", neo4j_http::VERSION).bold().green());
    println!("Transactional HTTP client for Neo4j");
}

/// Handle the shell (REPL) command
pub fn handle_shell(config: Config, read: bool) -> CliResult<()> {
    let client = Client::new(config)?;
    let default_mode = access_mode(read);

    let editor_config = EditorConfig::builder()
        .edit_mode(EditMode::Emacs)
        .history_ignore_space(true)
        .completion_type(CompletionType::List)
        .auto_add_history(false)
        .build();
    let mut rl = Editor::<(), _>::with_config(editor_config)?;

    let history_path = PathBuf::from(".neo4j-http/.cypher_history.txt");
    if let Some(parent) = history_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let _ = rl.load_history(&history_path);

    println!("{}", "neo4j-http".bold().green());
    println!("Type 'help' for commands, 'exit' or 'quit' to exit");
    println!("Multi-line statements supported - use ';' to terminate");
    println!(
        "{}",
        format!(
            "Connected to {} (database: {})",
            client.config().base_url(),
            client.config().database_name
        )
        .cyan()
    );

    let mut session = ShellSession::new(&client, default_mode);
    let mut buffer = String::new();

    loop {
        let prompt = if buffer.is_empty() {
            session.prompt()
        } else {
            "...> ".to_string()
        };

        let line = match rl.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                if !buffer.is_empty() {
                    buffer.clear();
                    println!("{}", "\nStatement buffer cleared".yellow());
                }
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "Goodbye!".green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        };

        let trimmed = line.trim();

        if buffer.is_empty() {
            match trimmed.to_lowercase().as_str() {
                "exit" | "quit" => {
                    println!("{}", "Goodbye!".green());
                    break;
                }
                "help" => {
                    print_help();
                    continue;
                }
                "clear" => {
                    print!("\x1B[2J\x1B[1;1H");
                    std::io::Write::flush(&mut std::io::stdout())?;
                    continue;
                }
                "" => continue,
                _ => {}
            }

            if trimmed.starts_with(':') {
                rl.add_history_entry(trimmed)?;
                session.command(trimmed);
                continue;
            }
        }

        buffer.push_str(&line);
        buffer.push('\n');

        if trimmed.ends_with(';') {
            let text = buffer.trim().trim_end_matches(';').trim().to_string();
            rl.add_history_entry(buffer.trim())?;
            buffer.clear();
            if !text.is_empty() {
                session.execute(&text);
            }
        }
    }

    let _ = rl.save_history(&history_path);

    // Dropping an open transaction rolls it back.
    session.close();
    client.shutdown();
    Ok(())
}

/// Console state: the optional open transaction and the default access mode
struct ShellSession<'a> {
    client: &'a Client,
    default_mode: AccessMode,
    transaction: Option<Transaction>,
}

impl<'a> ShellSession<'a> {
    fn new(client: &'a Client, default_mode: AccessMode) -> Self {
        Self {
            client,
            default_mode,
            transaction: None,
        }
    }

    fn prompt(&self) -> String {
        match self.transaction.as_ref().and_then(Transaction::id) {
            Some(id) => format!("{}> ", format!("cypher[tx:{}]", id).yellow()),
            None => format!("{}> ", "cypher".cyan()),
        }
    }

    fn command(&mut self, input: &str) {
        let mut parts = input.split_whitespace();
        let command = parts.next().unwrap_or_default().to_lowercase();
        let argument = parts.next().map(str::to_lowercase);

        match command.as_str() {
            ":begin" => self.begin(argument.as_deref()),
            ":commit" => self.finish(true),
            ":rollback" => self.finish(false),
            ":status" => self.status(),
            _ => println!("{}", format!("Unknown command: {}", input).yellow()),
        }
    }

    fn begin(&mut self, argument: Option<&str>) {
        if self.transaction.is_some() {
            println!("{}", "A transaction is already open".yellow());
            return;
        }

        let mode = match argument.map(str::parse::<AccessMode>) {
            None => self.default_mode,
            Some(Ok(mode)) => mode,
            Some(Err(e)) => {
                eprintln!("{}", e.red());
                return;
            }
        };

        match self.client.begin_transaction(mode) {
            Ok(tx) => {
                println!(
                    "{}",
                    format!("Began {} transaction {}", mode, tx.id().unwrap_or_default()).green()
                );
                self.transaction = Some(tx);
            }
            Err(e) => eprintln!("{}", format!("Error: {}", e).red()),
        }
    }

    fn finish(&mut self, commit: bool) {
        let Some(mut tx) = self.transaction.take() else {
            println!("{}", "No open transaction".yellow());
            return;
        };

        let outcome = if commit { tx.commit(&[]) } else { tx.rollback() };
        match outcome {
            Ok(_) if commit => println!("{}", "Committed".green()),
            Ok(_) => println!("{}", "Rolled back".green()),
            Err(e) => eprintln!("{}", format!("Error: {}", e).red()),
        }
        tx.cleanup();
    }

    fn status(&self) {
        match &self.transaction {
            Some(tx) => println!(
                "Transaction {} ({}, {})",
                tx.id().unwrap_or_default(),
                tx.access_mode(),
                tx.state()
            ),
            None => println!("No open transaction (default mode {})", self.default_mode),
        }
        let pool = self.client.pool();
        println!(
            "Pool: {} in use, {} idle, size {}",
            pool.in_use(),
            pool.idle_count(),
            pool.size()
        );
    }

    /// Run inside the open transaction, or as a one-shot request
    fn execute(&mut self, text: &str) {
        let outcome = match self.transaction.as_mut() {
            Some(tx) => tx.run(text),
            None => self
                .client
                .run_query(self.default_mode, text, Parameters::new()),
        };

        match outcome {
            Ok(results) => println!("{}", ResultFormatter::format(&results, OutputFormat::Table)),
            Err(e) => eprintln!("{}", format!("Error: {}", e).red()),
        }

        if let Some(tx) = &self.transaction {
            if tx.state() != TransactionState::Open {
                println!("{}", "Transaction closed by the server".yellow());
                self.transaction = None;
            }
        }
    }

    fn close(&mut self) {
        if let Some(tx) = self.transaction.take() {
            println!(
                "{}",
                format!("Rolling back open transaction {}", tx.id().unwrap_or_default()).yellow()
            );
        }
    }
}

/// Print help message
fn print_help() {
    println!("{}", "Available commands:".bold().green());
    println!("  {}  - Show this help message", "help".cyan());
    println!("  {}  - Exit the console", "exit/quit".cyan());
    println!("  {}  - Clear the screen", "clear".cyan());
    println!("\n{}", "Transactions:".bold().green());
    println!("  {}  - Open a transaction", ":begin [read|write]".cyan());
    println!("  {}  - Commit the open transaction", ":commit".cyan());
    println!("  {}  - Roll back the open transaction", ":rollback".cyan());
    println!("  {}  - Show transaction and pool state", ":status".cyan());
    println!("\n{}", "Statement syntax:".bold().green());
    println!("  Multi-line statements are supported");
    println!("  Terminate statements with semicolon (;)");
    println!("  Outside a transaction each statement runs as a one-shot transaction");
    println!("\n{}", "Cypher examples:".bold().green());
    println!("  {}", "MATCH (n:User) RETURN n.name LIMIT 10;".yellow());
    println!("  {}", "CREATE (u:User {{name: 'Klaus'}});".yellow());
}
