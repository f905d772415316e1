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


//! Core error definitions for the DuckLake exporter.
//!
//! This module provides a centralized `ExportError` enum and a `Result` type
//! used throughout the application to handle catalog, template and logic errors.

use thiserror::Error;

/// Error types encountered during the export process.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The catalog reports a column type this exporter has no mapping for.
    #[error("Unknown catalog type: {0}")]
    UnknownType(String),

    #[error("Table not found in current snapshot: {0}")]
    TableNotFound(String),

    #[error("Template rendering failed: {0}")]
    RenderError(String),

    /// The DDL was rendered but could not be written back to the catalog.
    ///
    /// The rendered text travels with the error so the caller can still use it.
    #[error("Failed to persist DDL for {table}: {reason}")]
    PersistenceError {
        table: String,
        reason: String,
        ddl: String,
    },

    #[error("Catalog error: {0}")]
    CatalogError(String),

    #[error("Named query error: {0}")]
    QueryError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<postgres::Error> for ExportError {
    fn from(e: postgres::Error) -> Self {
        ExportError::CatalogError(describe_postgres_error(&e))
    }
}

/// The server's message for database errors, otherwise the error and its causes.
///
/// `postgres::Error`'s own `Display` is only the error kind ("db error").
fn describe_postgres_error(e: &postgres::Error) -> String {
    if let Some(db) = e.as_db_error() {
        let mut msg = format!("{}: {}", db.severity(), db.message());
        if let Some(detail) = db.detail() {
            msg.push_str(&format!(" ({})", detail));
        }
        if let Some(hint) = db.hint() {
            msg.push_str(&format!(" [hint: {}]", hint));
        }
        return msg;
    }

    let mut msg = e.to_string();
    let mut source = std::error::Error::source(e);
    while let Some(cause) = source {
        let text = cause.to_string();
        if !msg.contains(&text) {
            msg.push_str(": ");
            msg.push_str(&text);
        }
        source = cause.source();
    }
    msg
}

impl From<minijinja::Error> for ExportError {
    fn from(e: minijinja::Error) -> Self {
        ExportError::RenderError(e.to_string())
    }
}

/// A specialized Result type for the DuckLake exporter.
pub type Result<T> = std::result::Result<T, ExportError>;
