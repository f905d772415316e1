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


//! The export pipeline.
//!
//! Resolves the current snapshot and the table, maps every column type,
//! renders the DDL template and writes the result back to the catalog.
//! Every step runs sequentially on the caller's thread and any failure
//! aborts the whole export.

use crate::config::ExportConfig;
use crate::domain::entities::{
    CatalogColumn, ColumnDescriptor, DdlContext, ExportReport, TableExportRequest,
};
use crate::domain::errors::{ExportError, Result};
use crate::domain::type_mapper;
use crate::ports::catalog_port::CatalogPort;
use crate::ports::renderer_port::DdlRendererPort;
use log::{debug, info, warn};
use std::sync::Arc;

/// Exports DuckLake tables as Athena DDL.
pub struct TableExporter {
    catalog: Arc<dyn CatalogPort>,
    renderer: Arc<dyn DdlRendererPort>,
    config: ExportConfig,
}

impl TableExporter {
    pub fn new(
        catalog: Arc<dyn CatalogPort>,
        renderer: Arc<dyn DdlRendererPort>,
        config: ExportConfig,
    ) -> Self {
        Self {
            catalog,
            renderer,
            config,
        }
    }

    /// Renders the DDL for `table_name` and, unless `dry_run`, stores it in the catalog.
    pub fn export_table(&self, table_name: &str, dry_run: bool) -> Result<String> {
        self.export(&TableExportRequest::new(table_name, dry_run))
            .map(|report| report.ddl)
    }

    /// Runs the full pipeline for one request.
    ///
    /// A failed write after a successful render returns
    /// `ExportError::PersistenceError`, which still carries the rendered DDL.
    pub fn export(&self, request: &TableExportRequest) -> Result<ExportReport> {
        let table_name = request.table_name.as_str();

        let snapshot_id = self.catalog.current_snapshot()?;
        let table_id = self
            .catalog
            .get_table_id(snapshot_id, table_name)?
            .ok_or_else(|| ExportError::TableNotFound(table_name.to_string()))?;
        info!(
            "Exporting {} (table_id={}, snapshot={})",
            table_name, table_id, snapshot_id
        );

        let columns = describe_columns(self.catalog.table_structure(snapshot_id, table_id)?)?;
        let unsupported_columns: Vec<String> = columns
            .iter()
            .filter(|c| c.is_unsupported())
            .map(|c| c.name.clone())
            .collect();
        for c in columns.iter().filter(|c| c.is_unsupported()) {
            warn!(
                "Column {}.{} has type {} with no Athena equivalent",
                table_name, c.name, c.catalog_type
            );
        }

        let context = DdlContext {
            data_path: self.config.data_path.clone(),
            schema_name: self.config.schema_name.clone(),
            table_name: table_name.to_string(),
            table_comment: self.catalog.get_table_comment(table_id)?,
            columns,
        };
        let ddl = self.renderer.render(&context)?;

        let persisted = if request.dry_run {
            info!("Dry run: DDL for {} not saved", table_name);
            false
        } else {
            self.catalog
                .save_athena_ddl(table_id, &ddl)
                .map_err(|e| ExportError::PersistenceError {
                    table: table_name.to_string(),
                    reason: e.to_string(),
                    ddl: ddl.clone(),
                })?;
            info!("Saved Athena DDL for {} ({} bytes)", table_name, ddl.len());
            true
        };

        Ok(ExportReport {
            table_name: table_name.to_string(),
            snapshot_id,
            table_id,
            ddl,
            persisted,
            unsupported_columns,
        })
    }

    /// The DDL last saved for `table_name` in the current snapshot.
    pub fn stored_ddl(&self, table_name: &str) -> Result<Option<String>> {
        let snapshot_id = self.catalog.current_snapshot()?;
        let table_id = self
            .catalog
            .get_table_id(snapshot_id, table_name)?
            .ok_or_else(|| ExportError::TableNotFound(table_name.to_string()))?;
        self.catalog.get_athena_ddl(table_id)
    }
}

/// Maps catalog columns to descriptors, keeping their order.
///
/// Stops at the first unknown type so no partial column list is ever rendered.
pub fn describe_columns(columns: Vec<CatalogColumn>) -> Result<Vec<ColumnDescriptor>> {
    columns
        .into_iter()
        .map(|c| {
            let target_type = type_mapper::map_type(&c.column_type)?;
            debug!(
                "{}: {} -> {}",
                c.column_name,
                c.column_type,
                target_type.as_deref().unwrap_or("<none>")
            );
            Ok(ColumnDescriptor {
                name: c.column_name,
                catalog_type: c.column_type,
                target_type,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{SnapshotId, TableId};
    use crate::infrastructure::template::jinja_renderer::JinjaRenderer;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
    use std::sync::Mutex;

    const TEMPLATE: &str = include_str!("../../template/athena_table_template.sql.j2");

    struct MockCatalogPort {
        snapshot: AtomicI64,
        tables: HashMap<String, (TableId, Vec<CatalogColumn>, String)>,
        saved: Mutex<HashMap<TableId, String>>,
        save_calls: AtomicUsize,
        fail_save: bool,
    }

    impl MockCatalogPort {
        fn new() -> Self {
            Self {
                snapshot: AtomicI64::new(7),
                tables: HashMap::new(),
                saved: Mutex::new(HashMap::new()),
                save_calls: AtomicUsize::new(0),
                fail_save: false,
            }
        }

        fn with_table(mut self, name: &str, id: i64, cols: &[(&str, &str)], comment: &str) -> Self {
            let cols = cols.iter().map(|(n, t)| CatalogColumn::new(n, t)).collect();
            self.tables
                .insert(name.to_string(), (TableId(id), cols, comment.to_string()));
            self
        }

        fn saved_ddl(&self, id: i64) -> Option<String> {
            self.saved.lock().unwrap().get(&TableId(id)).cloned()
        }
    }

    impl CatalogPort for MockCatalogPort {
        fn current_snapshot(&self) -> Result<SnapshotId> {
            Ok(SnapshotId(self.snapshot.load(Ordering::SeqCst)))
        }
        fn get_table_id(&self, _snapshot: SnapshotId, table_name: &str) -> Result<Option<TableId>> {
            Ok(self.tables.get(table_name).map(|(id, _, _)| *id))
        }
        fn table_structure(&self, _snapshot: SnapshotId, table: TableId) -> Result<Vec<CatalogColumn>> {
            Ok(self
                .tables
                .values()
                .find(|(id, _, _)| *id == table)
                .map(|(_, cols, _)| cols.clone())
                .unwrap_or_default())
        }
        fn get_table_comment(&self, table: TableId) -> Result<String> {
            Ok(self
                .tables
                .values()
                .find(|(id, _, _)| *id == table)
                .map(|(_, _, c)| c.clone())
                .unwrap_or_default())
        }
        fn save_athena_ddl(&self, table: TableId, ddl: &str) -> Result<()> {
            self.save_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_save {
                return Err(ExportError::CatalogError("connection reset".to_string()));
            }
            self.saved.lock().unwrap().insert(table, ddl.to_string());
            Ok(())
        }
        fn get_athena_ddl(&self, table: TableId) -> Result<Option<String>> {
            Ok(self.saved.lock().unwrap().get(&table).cloned())
        }
    }

    fn test_config() -> ExportConfig {
        ExportConfig {
            data_path: "s3://test-bucket/".to_string(),
            schema_name: "main".to_string(),
            ..ExportConfig::default()
        }
    }

    fn exporter(catalog: Arc<MockCatalogPort>) -> TableExporter {
        let renderer = JinjaRenderer::from_source("athena_table_template.sql.j2", TEMPLATE).unwrap();
        TableExporter::new(catalog, Arc::new(renderer), test_config())
    }

    fn orders_catalog() -> MockCatalogPort {
        MockCatalogPort::new().with_table(
            "orders",
            3,
            &[("id", "int64"), ("amount", "decimal(10,2)"), ("created", "timestamptz")],
            "Customer orders",
        )
    }

    #[test]
    fn test_export_orders() {
        let catalog = Arc::new(orders_catalog());
        let ddl = exporter(catalog.clone()).export_table("orders", false).unwrap();

        assert!(ddl.contains("CREATE EXTERNAL TABLE IF NOT EXISTS `main`.`orders`"));
        assert!(ddl.contains("`id` BIGINT"));
        assert!(ddl.contains("`amount` decimal(10,2)"));
        assert!(ddl.contains("`created` TIMESTAMP"));
        assert!(ddl.contains("COMMENT 'Customer orders'"));
        assert!(ddl.contains("LOCATION 's3://test-bucket/main/orders/'"));
        assert_eq!(catalog.saved_ddl(3).as_deref(), Some(ddl.as_str()));
    }

    #[test]
    fn test_column_order_preserved() {
        let catalog = Arc::new(MockCatalogPort::new().with_table(
            "wide",
            1,
            &[("z", "int32"), ("a", "varchar"), ("m", "boolean"), ("b", "date")],
            "",
        ));
        let ddl = exporter(catalog).export_table("wide", true).unwrap();

        let positions: Vec<usize> = ["`z` INT", "`a` STRING", "`m` BOOLEAN", "`b` DATE"]
            .iter()
            .map(|needle| ddl.find(needle).expect(needle))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_table_not_found() {
        let catalog = Arc::new(orders_catalog());
        let result = exporter(catalog.clone()).export_table("ghost_table", false);

        match result {
            Err(ExportError::TableNotFound(name)) => assert_eq!(name, "ghost_table"),
            other => panic!("expected TableNotFound, got {:?}", other),
        }
        assert_eq!(catalog.save_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unsupported_type_still_exports() {
        let catalog = Arc::new(MockCatalogPort::new().with_table(
            "events",
            5,
            &[("id", "int64"), ("duration", "interval")],
            "",
        ));
        let report = exporter(catalog)
            .export(&TableExportRequest::new("events", false))
            .unwrap();

        assert_eq!(report.unsupported_columns, vec!["duration".to_string()]);
        assert!(report.ddl.contains("`duration` STRING COMMENT 'unsupported catalog type: interval'"));
        assert!(!report.ddl.contains("COMMENT ''"));
        assert!(report.persisted);
    }

    #[test]
    fn test_unknown_type_aborts() {
        let catalog = Arc::new(MockCatalogPort::new().with_table(
            "geo",
            9,
            &[("id", "int64"), ("shape", "geometry")],
            "",
        ));
        let result = exporter(catalog.clone()).export_table("geo", false);

        assert!(matches!(result, Err(ExportError::UnknownType(t)) if t == "geometry"));
        assert_eq!(catalog.save_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_dry_run_is_idempotent_and_read_only() {
        let catalog = Arc::new(orders_catalog());
        let exporter = exporter(catalog.clone());

        let first = exporter.export_table("orders", true).unwrap();
        let second = exporter.export_table("orders", true).unwrap();

        assert_eq!(first, second);
        assert_eq!(catalog.save_calls.load(Ordering::SeqCst), 0);
        assert!(catalog.saved_ddl(3).is_none());
    }

    #[test]
    fn test_export_overwrites_previous_ddl() {
        let catalog = Arc::new(orders_catalog());
        catalog
            .saved
            .lock()
            .unwrap()
            .insert(TableId(3), "-- stale".to_string());

        let ddl = exporter(catalog.clone()).export_table("orders", false).unwrap();

        assert_eq!(catalog.saved_ddl(3).as_deref(), Some(ddl.as_str()));
        assert_eq!(catalog.save_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_persistence_failure_keeps_ddl() {
        let mut mock = orders_catalog();
        mock.fail_save = true;
        let catalog = Arc::new(mock);

        match exporter(catalog).export_table("orders", false) {
            Err(ExportError::PersistenceError { table, reason, ddl }) => {
                assert_eq!(table, "orders");
                assert!(reason.contains("connection reset"));
                assert!(ddl.contains("`id` BIGINT"));
            }
            other => panic!("expected PersistenceError, got {:?}", other),
        }
    }

    #[test]
    fn test_snapshot_resolved_per_call() {
        let catalog = Arc::new(orders_catalog());
        let exporter = exporter(catalog.clone());

        let first = exporter.export(&TableExportRequest::new("orders", true)).unwrap();
        catalog.snapshot.store(8, Ordering::SeqCst);
        let second = exporter.export(&TableExportRequest::new("orders", true)).unwrap();

        assert_eq!(first.snapshot_id, SnapshotId(7));
        assert_eq!(second.snapshot_id, SnapshotId(8));
    }

    #[test]
    fn test_stored_ddl() {
        let catalog = Arc::new(orders_catalog());
        let exporter = exporter(catalog);

        assert_eq!(exporter.stored_ddl("orders").unwrap(), None);
        let ddl = exporter.export_table("orders", false).unwrap();
        assert_eq!(exporter.stored_ddl("orders").unwrap(), Some(ddl));
        assert!(matches!(
            exporter.stored_ddl("ghost_table"),
            Err(ExportError::TableNotFound(_))
        ));
    }
}
