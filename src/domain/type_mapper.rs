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


//! # Type Mapping Logic
//!
//! DuckLake and Athena (Hive DDL) name their column types differently. This
//! module translates a catalog type such as `int64` into the Hive type used
//! in `CREATE EXTERNAL TABLE` statements (`BIGINT`).
//!
//! Every lookup ends in one of three ways:
//! 1. **Mapped**: the catalog type has a direct Hive equivalent.
//! 2. **Unsupported**: the type is known but Hive has no equivalent (`None`).
//!    The export goes on and the template decides how to render the column.
//! 3. **Unknown**: the catalog introduced a type this table does not list.
//!    That is a hard error.
//!
//! Parameterised decimals (`decimal(10,2)`) share their syntax with Hive and
//! pass through unchanged.

use crate::domain::errors::{ExportError, Result};

/// Catalog type name to Hive type name. `None` marks a known type without a
/// Hive equivalent.
pub const DUCKLAKE_TO_HIVE: &[(&str, Option<&str>)] = &[
    ("boolean", Some("BOOLEAN")),
    ("int8", Some("TINYINT")),
    ("int16", Some("SMALLINT")),
    ("int32", Some("INT")),
    ("int64", Some("BIGINT")),
    ("uint8", Some("TINYINT")),
    ("uint16", Some("SMALLINT")),
    ("uint32", Some("INT")),
    ("uint64", Some("BIGINT")),
    ("float32", Some("FLOAT")),
    ("float64", Some("DOUBLE")),
    ("decimal", Some("DECIMAL")),
    ("time", None),
    ("timetz", None),
    ("date", Some("DATE")),
    ("timestamp", Some("TIMESTAMP")),
    ("timestamptz", Some("TIMESTAMP")),
    ("timestamp_s", Some("TIMESTAMP")),
    ("timestamp_ms", Some("TIMESTAMP")),
    ("timestamp_ns", Some("TIMESTAMP")),
    ("interval", None),
    ("varchar", Some("STRING")),
    ("blob", Some("BINARY")),
    ("json", Some("JSON")),
    ("uuid", None),
    // TODO: nested types need their child types spelled out (ARRAY<..>, STRUCT<..>, MAP<..>).
    ("list", Some("LIST")),
    ("struct", Some("STRUCT")),
    ("map", Some("MAP")),
];

const DECIMAL_PREFIX: &str = "decimal";

/// Maps a DuckLake column type to its Hive DDL type.
///
/// Returns `Ok(None)` for known types that Hive cannot represent and
/// `ExportError::UnknownType` for anything the table does not cover.
pub fn map_type(catalog_type: &str) -> Result<Option<String>> {
    if let Some((_, target)) = DUCKLAKE_TO_HIVE
        .iter()
        .find(|(name, _)| *name == catalog_type)
    {
        return Ok(target.map(str::to_string));
    }

    if catalog_type.starts_with(DECIMAL_PREFIX) {
        return Ok(Some(catalog_type.to_string()));
    }

    Err(ExportError::UnknownType(catalog_type.to_string()))
}
