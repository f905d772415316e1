// Copyright 2026 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


//! # DuckLake Catalog Adapter
//!
//! Implements the `CatalogPort` on top of the named queries in `sql/`.
//! Each port method is a thin typed wrapper: build the keyword parameters,
//! run the query by name, read the columns it needs.

use crate::domain::entities::{CatalogColumn, SnapshotId, TableId};
use crate::domain::errors::{ExportError, Result};
use crate::infrastructure::postgres::connection_manager::PostgresConnectionManager;
use crate::infrastructure::postgres::query_store::{NamedQueryStore, QueryOutput, QueryParams};
use crate::ports::catalog_port::CatalogPort;
use log::debug;
use postgres::Row;
use r2d2::Pool;
use std::sync::Arc;

/// Queries the adapter calls by name.
pub const REQUIRED_QUERIES: &[&str] = &[
    "current_snapshot",
    "get_table_id",
    "table_structure",
    "get_table_comment",
    "init_athena_ddl_table",
    "save_athena_ddl",
    "get_athena_ddl",
];

/// Runs a named query and hands back its output.
pub trait QueryRunner: Send + Sync {
    fn run(&self, name: &str, params: &QueryParams) -> Result<QueryOutput>;
}

/// Runs named queries on the pooled catalog connection.
pub struct PooledQueryRunner {
    pool: Arc<Pool<PostgresConnectionManager>>,
    queries: Arc<NamedQueryStore>,
}

impl QueryRunner for PooledQueryRunner {
    fn run(&self, name: &str, params: &QueryParams) -> Result<QueryOutput> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| ExportError::CatalogError(format!("No catalog connection: {}", e)))?;
        self.queries.execute(&mut conn, name, params)
    }
}

/// `PostgresCatalogAdapter` implements the `CatalogPort`.
pub struct PostgresCatalogAdapter {
    runner: Box<dyn QueryRunner>,
    queries: Arc<NamedQueryStore>,
}

impl PostgresCatalogAdapter {
    /// Fails when `queries` lacks any of `REQUIRED_QUERIES`.
    pub fn new(pool: Arc<Pool<PostgresConnectionManager>>, queries: Arc<NamedQueryStore>) -> Result<Self> {
        let runner = PooledQueryRunner {
            pool,
            queries: queries.clone(),
        };
        Self::with_runner(Box::new(runner), queries)
    }

    pub fn with_runner(runner: Box<dyn QueryRunner>, queries: Arc<NamedQueryStore>) -> Result<Self> {
        let missing: Vec<&str> = REQUIRED_QUERIES
            .iter()
            .copied()
            .filter(|q| !queries.contains(q))
            .collect();
        if !missing.is_empty() {
            return Err(ExportError::ConfigError(format!(
                "SQL directory is missing queries: {}",
                missing.join(", ")
            )));
        }
        Ok(Self { runner, queries })
    }

    /// Runs any loaded query by name.
    pub fn execute(&self, name: &str, params: &QueryParams) -> Result<QueryOutput> {
        self.runner.run(name, params)
    }

    pub fn queries(&self) -> &NamedQueryStore {
        &self.queries
    }

    fn first_row(&self, name: &str, params: &QueryParams) -> Result<Option<Row>> {
        Ok(self.execute(name, params)?.into_rows().into_iter().next())
    }

    /// Creates the DDL table if this catalog has never stored DDL.
    ///
    /// Only the write and read paths of stored DDL call this, so dry runs
    /// leave the catalog untouched.
    fn ensure_ddl_table(&self) -> Result<()> {
        self.execute("init_athena_ddl_table", &QueryParams::new())?;
        Ok(())
    }
}

impl CatalogPort for PostgresCatalogAdapter {
    fn current_snapshot(&self) -> Result<SnapshotId> {
        let value = match self.first_row("current_snapshot", &QueryParams::new())? {
            Some(row) => row.try_get::<_, Option<i64>>(0)?,
            None => None,
        };
        value
            .map(SnapshotId)
            .ok_or_else(|| ExportError::CatalogError("Catalog has no snapshots".to_string()))
    }

    fn get_table_id(&self, snapshot: SnapshotId, table_name: &str) -> Result<Option<TableId>> {
        let params = QueryParams::new()
            .with("snapshot_id", snapshot.0)
            .with("table_name", table_name);
        match self.first_row("get_table_id", &params)? {
            Some(row) => Ok(Some(TableId(row.try_get(0)?))),
            None => Ok(None),
        }
    }

    fn table_structure(&self, snapshot: SnapshotId, table: TableId) -> Result<Vec<CatalogColumn>> {
        let params = QueryParams::new()
            .with("snapshot_id", snapshot.0)
            .with("table_id", table.0);
        let rows = self.execute("table_structure", &params)?.into_rows();

        let mut columns = Vec::with_capacity(rows.len());
        for row in rows {
            let has_nullability = row.columns().iter().any(|c| c.name() == "nulls_allowed");
            columns.push(CatalogColumn {
                column_name: row.try_get("column_name")?,
                column_type: row.try_get("column_type")?,
                nulls_allowed: if has_nullability {
                    row.try_get("nulls_allowed")?
                } else {
                    None
                },
            });
        }
        debug!("Table {} has {} columns", table, columns.len());
        Ok(columns)
    }

    fn get_table_comment(&self, table: TableId) -> Result<String> {
        let params = QueryParams::new().with("table_id", table.0);
        match self.first_row("get_table_comment", &params)? {
            Some(row) => Ok(row.try_get::<_, Option<String>>(0)?.unwrap_or_default()),
            None => Ok(String::new()),
        }
    }

    fn save_athena_ddl(&self, table: TableId, ddl: &str) -> Result<()> {
        let params = QueryParams::new()
            .with("table_id", table.0)
            .with("ddl", ddl);
        self.ensure_ddl_table()?;
        self.execute("save_athena_ddl", &params)?;
        Ok(())
    }

    fn get_athena_ddl(&self, table: TableId) -> Result<Option<String>> {
        let params = QueryParams::new().with("table_id", table.0);
        self.ensure_ddl_table()?;
        match self.first_row("get_athena_ddl", &params)? {
            Some(row) => Ok(row.try_get(0)?),
            None => Ok(None),
        }
    }
}
