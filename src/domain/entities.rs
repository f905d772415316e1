//! # Domain Entities
//!
//! The nouns of the exporter: catalog identifiers, columns as the catalog
//! reports them, columns after type mapping, and the context handed to the
//! DDL template.
//!
//! `serde::Serialize` lets these structs flow straight into the template
//! engine and into the JSON printed by the CLI.

use serde::Serialize;
use std::fmt;

/// Identifier of a catalog snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SnapshotId(pub i64);

/// Identifier of a table within the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TableId(pub i64);

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A column exactly as the `table_structure` query returns it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogColumn {
    pub column_name: String,
    /// DuckLake type name, e.g. `int64` or `decimal(10,2)`.
    pub column_type: String,
    pub nulls_allowed: Option<bool>,
}

impl CatalogColumn {
    pub fn new(column_name: &str, column_type: &str) -> Self {
        Self {
            column_name: column_name.to_string(),
            column_type: column_type.to_string(),
            nulls_allowed: None,
        }
    }
}

/// A column after type mapping, ready for the template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub catalog_type: String,
    /// Hive type, or `None` when the catalog type has no Hive equivalent.
    #[serde(rename = "column_type")]
    pub target_type: Option<String>,
}

impl ColumnDescriptor {
    pub fn is_unsupported(&self) -> bool {
        self.target_type.is_none()
    }
}

/// What to export and whether to write the result back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableExportRequest {
    pub table_name: String,
    /// Render only; leave the catalog untouched.
    pub dry_run: bool,
}

impl TableExportRequest {
    pub fn new(table_name: &str, dry_run: bool) -> Self {
        Self {
            table_name: table_name.to_string(),
            dry_run,
        }
    }
}

/// Variables available to `athena_table_template.sql.j2`.
#[derive(Debug, Clone, Serialize)]
pub struct DdlContext {
    /// Object storage prefix, e.g. `s3://bucket/`.
    pub data_path: String,
    pub schema_name: String,
    pub table_name: String,
    pub table_comment: String,
    pub columns: Vec<ColumnDescriptor>,
}

/// Outcome of a single table export.
#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub table_name: String,
    pub snapshot_id: SnapshotId,
    pub table_id: TableId,
    pub ddl: String,
    /// False for dry runs.
    pub persisted: bool,
    /// Columns whose catalog type has no Hive equivalent.
    pub unsupported_columns: Vec<String>,
}
