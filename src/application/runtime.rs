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


//! # Runtime Context
//!
//! Sets up the resources that live for the whole process:
//! 1. **Connection**: an `r2d2` pool holding the single catalog connection.
//! 2. **Named queries**: loaded once from the SQL directory.
//! 3. **Template**: compiled once from the template directory.
//!
//! Everything is built from an explicit `AppConfig`; nothing is read from
//! globals afterwards.

use crate::application::exporter::TableExporter;
use crate::config::AppConfig;
use crate::domain::errors::{ExportError, Result};
use crate::infrastructure::postgres::catalog_adapter::PostgresCatalogAdapter;
use crate::infrastructure::postgres::connection_manager::PostgresConnectionManager;
use crate::infrastructure::postgres::query_store::NamedQueryStore;
use crate::infrastructure::template::jinja_renderer::JinjaRenderer;
use log::info;
use r2d2::Pool;
use std::sync::Arc;

/// `RuntimeContext` holds shared resources that exist for the entire life of the app.
pub struct RuntimeContext {
    pub catalog: Arc<PostgresCatalogAdapter>,
    pub exporter: TableExporter,
}

impl RuntimeContext {
    /// Connects to the catalog and loads queries and template.
    pub fn init(config: &AppConfig) -> Result<Self> {
        config.validate()?;

        let queries = Arc::new(NamedQueryStore::from_dir(&config.export.sql_dir)?);
        let renderer = Arc::new(JinjaRenderer::from_dir(
            &config.export.template_dir,
            &config.export.template_name,
        )?);

        info!("Connecting to DuckLake catalog...");
        let manager = PostgresConnectionManager::new(config.connection_string())?;

        // One export at a time, one connection for the process.
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e| {
                ExportError::CatalogError(format!("Failed to connect to catalog: {}", e))
            })?;

        let catalog = Arc::new(PostgresCatalogAdapter::new(Arc::new(pool), queries)?);
        let exporter = TableExporter::new(catalog.clone(), renderer, config.export.clone());

        Ok(Self { catalog, exporter })
    }
}
