use crate::domain::errors::{ExportError, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;

pub const DEFAULT_DATA_PATH: &str = "s3://home-an2-dev-dp-drs-tables/";
pub const DEFAULT_SCHEMA_NAME: &str = "main";
pub const DEFAULT_TEMPLATE_DIR: &str = "template/";
pub const DEFAULT_TEMPLATE_NAME: &str = "athena_table_template.sql.j2";
pub const DEFAULT_SQL_DIR: &str = "sql/";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string of the DuckLake catalog.
    pub connection_string: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ExportConfig {
    /// Object storage prefix the table locations are built from.
    pub data_path: String,
    pub schema_name: String,
    pub template_dir: String,
    pub template_name: String,
    pub sql_dir: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            data_path: DEFAULT_DATA_PATH.to_string(),
            schema_name: DEFAULT_SCHEMA_NAME.to_string(),
            template_dir: DEFAULT_TEMPLATE_DIR.to_string(),
            template_name: DEFAULT_TEMPLATE_NAME.to_string(),
            sql_dir: DEFAULT_SQL_DIR.to_string(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file (YAML or JSON)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Catalog connection string
    #[arg(long, env = "CONNECTION_STRING", hide_env_values = true)]
    pub connection_string: Option<String>,

    #[arg(long)]
    pub sql_dir: Option<String>,
    #[arg(long)]
    pub template_dir: Option<String>,
    #[arg(long)]
    pub template_name: Option<String>,
    #[arg(long)]
    pub data_path: Option<String>,
    #[arg(long)]
    pub schema_name: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Render the Athena DDL of a table and save it in the catalog
    ExportTable {
        table_name: String,
        /// Print the DDL without saving it
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the DDL last saved for a table
    ShowDdl { table_name: String },
    /// Run a named query; parameters are key=value pairs
    Query {
        name: String,
        params: Vec<String>,
    },
    /// List the named queries with their descriptions
    ListQueries,
}

impl AppConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config: AppConfig = if path.ends_with(".json") {
            serde_json::from_str(&contents).map_err(|e| ExportError::ConfigError(e.to_string()))?
        } else {
            serde_yaml::from_str(&contents).map_err(|e| ExportError::ConfigError(e.to_string()))?
        };

        Ok(config)
    }

    pub fn merge_cli(&mut self, args: &CliArgs) {
        if let Some(c) = &args.connection_string { self.database.connection_string = Some(c.clone()); }
        if let Some(d) = &args.sql_dir { self.export.sql_dir = d.clone(); }
        if let Some(d) = &args.template_dir { self.export.template_dir = d.clone(); }
        if let Some(t) = &args.template_name { self.export.template_name = t.clone(); }
        if let Some(p) = &args.data_path { self.export.data_path = p.clone(); }
        if let Some(s) = &args.schema_name { self.export.schema_name = s.clone(); }
    }

    /// The connection string is the one setting without a default.
    pub fn validate(&self) -> Result<()> {
        match self.database.connection_string.as_deref() {
            Some(c) if !c.trim().is_empty() => {}
            _ => {
                return Err(ExportError::ConfigError(
                    "CONNECTION_STRING is not set".to_string(),
                ))
            }
        }
        if self.export.schema_name.trim().is_empty() {
            return Err(ExportError::ConfigError("schema_name must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn connection_string(&self) -> &str {
        self.database.connection_string.as_deref().unwrap_or_default()
    }
}
