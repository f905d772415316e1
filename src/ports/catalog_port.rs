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


//! # Catalog Port
//!
//! This Port defines what the exporter needs from the DuckLake catalog.
//! The pipeline only ever talks to this trait, so it can be driven by the
//! PostgreSQL adapter in production and by an in-memory mock in tests.

use crate::domain::entities::{CatalogColumn, SnapshotId, TableId};
use crate::domain::errors::Result;

/// `CatalogPort` wraps the named catalog queries the export relies on.
pub trait CatalogPort: Send + Sync {
    /// Latest committed snapshot. Never cached between calls.
    fn current_snapshot(&self) -> Result<SnapshotId>;

    /// Table id for `table_name` in `snapshot`, or `None` if the table does not exist there.
    fn get_table_id(&self, snapshot: SnapshotId, table_name: &str) -> Result<Option<TableId>>;

    /// Top-level columns in catalog column order.
    fn table_structure(&self, snapshot: SnapshotId, table: TableId) -> Result<Vec<CatalogColumn>>;

    /// Table comment, empty when none is set.
    fn get_table_comment(&self, table: TableId) -> Result<String>;

    /// Stores `ddl` for `table`, replacing any earlier DDL.
    fn save_athena_ddl(&self, table: TableId, ddl: &str) -> Result<()>;

    /// Previously stored DDL for `table`.
    fn get_athena_ddl(&self, table: TableId) -> Result<Option<String>>;
}
