//! # DuckLake Athena Exporter
//!
//! Reads table definitions from a DuckLake catalog stored in PostgreSQL and
//! turns them into Athena `CREATE EXTERNAL TABLE` statements, saving each
//! statement back into the catalog.
//!
//! This application follows the **Hexagonal Architecture** (Ports and Adapters)
//! to keep the export pipeline independent of the database and template engine.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ports;

use crate::application::runtime::RuntimeContext;
use crate::config::{AppConfig, CliArgs, Command};
use crate::domain::errors::{ExportError, Result};
use crate::infrastructure::postgres::query_store::{NamedQueryStore, QueryParams};
use clap::Parser;
use log::{error, info, warn};
use std::process;

fn main() {
    // 1. Environment file first so it can set RUST_LOG and CONNECTION_STRING
    let dotenv = dotenvy::dotenv();

    // 2. Initialize Logging
    env_logger::init();
    if let Err(e) = dotenv {
        if !e.not_found() {
            warn!("Ignoring unreadable .env file: {}", e);
        }
    }

    // 3. Parse Arguments
    let args = CliArgs::parse();

    // 4. Load Config
    let mut config = if let Some(config_path) = &args.config {
        match AppConfig::from_file(config_path) {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to load config: {}", e);
                process::exit(1);
            }
        }
    } else {
        AppConfig::default()
    };
    config.merge_cli(&args);

    // Listing queries only needs the SQL directory.
    if args.command == Command::ListQueries {
        match NamedQueryStore::from_dir(&config.export.sql_dir) {
            Ok(store) => {
                for query in store.queries() {
                    println!("{}", query.summary());
                }
                return;
            }
            Err(e) => {
                error!("Failed to load queries: {}", e);
                process::exit(1);
            }
        }
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        process::exit(1);
    }

    // 5. Connect and dispatch
    let runtime = match RuntimeContext::init(&config) {
        Ok(r) => r,
        Err(e) => {
            error!("Startup failed: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run(&runtime, &args.command) {
        if let ExportError::PersistenceError { ddl, .. } = &e {
            println!("{}", ddl);
        }
        error!("{}", e);
        process::exit(1);
    }
}

fn run(runtime: &RuntimeContext, command: &Command) -> Result<()> {
    match command {
        Command::ExportTable {
            table_name,
            dry_run,
        } => {
            let ddl = runtime.exporter.export_table(table_name, *dry_run)?;
            println!("{}", ddl);
            info!("Export of {} finished", table_name);
        }
        Command::ShowDdl { table_name } => match runtime.exporter.stored_ddl(table_name)? {
            Some(ddl) => println!("{}", ddl),
            None => warn!("No DDL saved for {} yet", table_name),
        },
        Command::Query { name, params } => {
            let params = QueryParams::from_assignments(params)?;
            let output = runtime.catalog.execute(name, &params)?.into_json()?;
            let text = serde_json::to_string_pretty(&output)
                .map_err(|e| ExportError::QueryError(e.to_string()))?;
            println!("{}", text);
        }
        Command::ListQueries => {
            for query in runtime.catalog.queries().queries() {
                println!("{}", query.summary());
            }
        }
    }
    Ok(())
}
