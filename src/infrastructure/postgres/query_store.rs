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


//! # Named Query Store
//!
//! Catalog SQL lives in `.sql` files, one statement per `-- name:` block:
//!
//! ```sql
//! -- name: get_table_id^
//! -- Resolve a table id within a snapshot.
//! SELECT table_id FROM ducklake_table WHERE table_name = :table_name
//! ```
//!
//! The suffix on the name selects how the result is returned:
//! - none: all rows
//! - `^`: at most one row
//! - `$`: a single value (first column of the first row)
//! - `!`: a command, returning the number of affected rows
//!
//! `:name` placeholders are rewritten to PostgreSQL `$n` binds at load time.
//! At execution time keyword parameters are matched to those binds and
//! coerced to the types the server reports for the prepared statement.

use crate::domain::errors::{ExportError, Result};
use crate::infrastructure::postgres::param_aliases;
use log::{debug, info};
use postgres::types::{FromSql, ToSql, Type};
use postgres::{Client, Row};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

const NAME_MARKER: &str = "-- name:";

/// How a named query returns its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Select,
    SelectOne,
    SelectValue,
    Execute,
}

impl QueryKind {
    /// Splits a `-- name:` token into the bare name and its kind.
    fn parse(token: &str) -> (&str, QueryKind) {
        if let Some(name) = token.strip_suffix("<!") {
            (name, QueryKind::SelectOne)
        } else if let Some(name) = token.strip_suffix("*!") {
            (name, QueryKind::Execute)
        } else if let Some(name) = token.strip_suffix('^') {
            (name, QueryKind::SelectOne)
        } else if let Some(name) = token.strip_suffix('$') {
            (name, QueryKind::SelectValue)
        } else if let Some(name) = token.strip_suffix('!') {
            (name, QueryKind::Execute)
        } else {
            (token, QueryKind::Select)
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKind::Select => write!(f, "rows"),
            QueryKind::SelectOne => write!(f, "row"),
            QueryKind::SelectValue => write!(f, "value"),
            QueryKind::Execute => write!(f, "execute"),
        }
    }
}

/// A parsed query ready to be prepared.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedQuery {
    pub name: String,
    pub kind: QueryKind,
    pub doc: String,
    /// SQL with `$n` binds.
    pub sql: String,
    /// Parameter names in bind order; `params[0]` is `$1`.
    pub params: Vec<String>,
}

impl NamedQuery {
    /// One listing entry: name, kind, parameters, then the description indented.
    pub fn summary(&self) -> String {
        let mut line = format!("{} ({})", self.name, self.kind);
        if !self.params.is_empty() {
            line.push_str(&format!(" [{}]", self.params.join(", ")));
        }
        if !self.doc.is_empty() {
            line.push_str("\n    ");
            line.push_str(&self.doc);
        }
        line
    }
}

/// A keyword parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Int(i64),
    Text(String),
    Bool(bool),
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl ParamValue {
    fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            ParamValue::Text(s) => s.trim().parse().ok(),
            ParamValue::Bool(_) => None,
        }
    }

    fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            ParamValue::Text(s) => match s.to_lowercase().as_str() {
                "true" | "t" | "yes" | "1" => Some(true),
                "false" | "f" | "no" | "0" => Some(false),
                _ => None,
            },
            ParamValue::Int(_) => None,
        }
    }

    fn as_text(&self) -> String {
        match self {
            ParamValue::Int(v) => v.to_string(),
            ParamValue::Text(s) => s.clone(),
            ParamValue::Bool(b) => b.to_string(),
        }
    }
}

/// Keyword parameters for a named query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams(BTreeMap<String, ParamValue>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<ParamValue>) {
        self.0.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.0.iter()
    }

    /// Parses `key=value` pairs as given on the command line.
    ///
    /// Values stay text; they are converted once the statement's parameter
    /// types are known.
    pub fn from_assignments(assignments: &[String]) -> Result<Self> {
        let mut params = Self::new();
        for a in assignments {
            let (key, value) = a.split_once('=').ok_or_else(|| {
                ExportError::QueryError(format!("Expected key=value, got '{}'", a))
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(ExportError::QueryError(format!("Empty parameter name in '{}'", a)));
            }
            params.insert(key, value);
        }
        Ok(params)
    }
}

/// Result of running a named query.
pub enum QueryOutput {
    Rows(Vec<Row>),
    Row(Option<Row>),
    /// The value is the first column of the row.
    Scalar(Option<Row>),
    Affected(u64),
}

impl QueryOutput {
    /// All returned rows; empty for commands.
    pub fn into_rows(self) -> Vec<Row> {
        match self {
            QueryOutput::Rows(rows) => rows,
            QueryOutput::Row(row) | QueryOutput::Scalar(row) => row.into_iter().collect(),
            QueryOutput::Affected(_) => Vec::new(),
        }
    }

    /// JSON rendering for the CLI.
    pub fn into_json(self) -> Result<Value> {
        match self {
            QueryOutput::Rows(rows) => Ok(Value::Array(
                rows.iter().map(row_to_json).collect::<Result<Vec<_>>>()?,
            )),
            QueryOutput::Row(row) => row.as_ref().map(row_to_json).unwrap_or(Ok(Value::Null)),
            QueryOutput::Scalar(row) => match row {
                Some(r) if !r.is_empty() => cell_to_json(&r, 0),
                _ => Ok(Value::Null),
            },
            QueryOutput::Affected(n) => Ok(json!({ "affected_rows": n })),
        }
    }
}

/// All named queries loaded from a SQL directory.
#[derive(Debug, Default)]
pub struct NamedQueryStore {
    queries: BTreeMap<String, NamedQuery>,
}

impl NamedQueryStore {
    /// Loads every `*.sql` file in `dir`, in file name order.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut files: Vec<_> = fs::read_dir(dir)?
            .collect::<std::io::Result<Vec<_>>>()?
            .into_iter()
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "sql"))
            .collect();
        files.sort();

        let mut store = Self::default();
        for file in &files {
            let source = fs::read_to_string(file)?;
            store.add_source(&source)?;
            debug!("Loaded queries from {}", file.display());
        }
        info!(
            "Loaded {} named queries from {}",
            store.queries.len(),
            dir.display()
        );
        Ok(store)
    }

    /// Parses `source` and adds its queries. Names must be unique across sources.
    pub fn add_source(&mut self, source: &str) -> Result<()> {
        for query in parse_queries(source)? {
            if self.queries.contains_key(&query.name) {
                return Err(ExportError::QueryError(format!(
                    "Duplicate query name: {}",
                    query.name
                )));
            }
            self.queries.insert(query.name.clone(), query);
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&NamedQuery> {
        self.queries
            .get(name)
            .ok_or_else(|| ExportError::QueryError(format!("Unknown query: {}", name)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.queries.contains_key(name)
    }

    /// Queries in name order.
    pub fn queries(&self) -> impl Iterator<Item = &NamedQuery> {
        self.queries.values()
    }

    /// Runs `name` with keyword `params` (aliases allowed).
    pub fn execute(&self, client: &mut Client, name: &str, params: &QueryParams) -> Result<QueryOutput> {
        let query = self.get(name)?;
        let params = param_aliases::resolve(params);
        let missing: Vec<&str> = query
            .params
            .iter()
            .filter(|p| params.get(p).is_none())
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(ExportError::QueryError(format!(
                "Query {} is missing parameters: {}",
                name,
                missing.join(", ")
            )));
        }

        let statement = client.prepare(&query.sql)?;
        let mut values: Vec<Box<dyn ToSql + Sync>> = Vec::with_capacity(query.params.len());
        for (param, ty) in query.params.iter().zip(statement.params()) {
            if let Some(value) = params.get(param) {
                values.push(coerce_param(param, value, ty)?);
            }
        }
        let binds: Vec<&(dyn ToSql + Sync)> = values.iter().map(|v| v.as_ref()).collect();

        debug!("Executing {} ({}) with {} params", name, query.kind, binds.len());
        let output = match query.kind {
            QueryKind::Select => QueryOutput::Rows(client.query(&statement, &binds)?),
            QueryKind::SelectOne => QueryOutput::Row(client.query_opt(&statement, &binds)?),
            QueryKind::SelectValue => {
                QueryOutput::Scalar(client.query(&statement, &binds)?.into_iter().next())
            }
            QueryKind::Execute => QueryOutput::Affected(client.execute(&statement, &binds)?),
        };
        Ok(output)
    }
}

/// Splits a SQL file into named queries.
pub fn parse_queries(source: &str) -> Result<Vec<NamedQuery>> {
    struct Block<'a> {
        token: &'a str,
        doc: Vec<&'a str>,
        body: Vec<&'a str>,
    }

    let mut blocks: Vec<Block> = Vec::new();
    for line in source.lines() {
        let trimmed = line.trim();
        if let Some(token) = trimmed.strip_prefix(NAME_MARKER) {
            blocks.push(Block {
                token: token.trim(),
                doc: Vec::new(),
                body: Vec::new(),
            });
            continue;
        }
        let Some(block) = blocks.last_mut() else {
            continue;
        };
        if block.body.is_empty() {
            if let Some(doc) = trimmed.strip_prefix("--") {
                block.doc.push(doc.trim());
                continue;
            }
            if trimmed.is_empty() {
                continue;
            }
        }
        block.body.push(line);
    }

    blocks
        .into_iter()
        .map(|b| {
            let (name, kind) = QueryKind::parse(b.token);
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(ExportError::QueryError(format!("Invalid query name: '{}'", b.token)));
            }
            let body = b.body.join("\n");
            let body = body.trim().trim_end_matches(';').trim_end();
            if body.is_empty() {
                return Err(ExportError::QueryError(format!("Query {} has no SQL", name)));
            }
            let (sql, params) = rewrite_placeholders(body);
            Ok(NamedQuery {
                name: name.to_string(),
                kind,
                doc: b.doc.join(" "),
                sql,
                params,
            })
        })
        .collect()
}

/// Rewrites `:name` placeholders to `$n` and returns the names in bind order.
///
/// Casts (`::int`), string literals and `--` comments are copied unchanged.
pub fn rewrite_placeholders(sql: &str) -> (String, Vec<String>) {
    let chars: Vec<char> = sql.chars().collect();
    let mut out = String::with_capacity(sql.len());
    let mut params: Vec<String> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            '\'' => {
                let end = chars[i + 1..]
                    .iter()
                    .position(|&ch| ch == '\'')
                    .map(|p| i + 1 + p + 1)
                    .unwrap_or(chars.len());
                out.extend(&chars[i..end]);
                i = end;
            }
            '-' if next == Some('-') => {
                let end = chars[i..]
                    .iter()
                    .position(|&ch| ch == '\n')
                    .map(|p| i + p)
                    .unwrap_or(chars.len());
                out.extend(&chars[i..end]);
                i = end;
            }
            ':' if next == Some(':') => {
                out.push_str("::");
                i += 2;
            }
            ':' if next.is_some_and(|n| n.is_ascii_alphabetic() || n == '_') => {
                let start = i + 1;
                let end = chars[start..]
                    .iter()
                    .position(|&ch| !(ch.is_ascii_alphanumeric() || ch == '_'))
                    .map(|p| start + p)
                    .unwrap_or(chars.len());
                let name: String = chars[start..end].iter().collect();
                let index = match params.iter().position(|p| *p == name) {
                    Some(pos) => pos + 1,
                    None => {
                        params.push(name);
                        params.len()
                    }
                };
                out.push('$');
                out.push_str(&index.to_string());
                i = end;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    (out, params)
}

/// Converts a keyword value to the type PostgreSQL expects for its bind.
fn coerce_param(name: &str, value: &ParamValue, ty: &Type) -> Result<Box<dyn ToSql + Sync>> {
    let mismatch = || {
        ExportError::QueryError(format!(
            "Parameter {} = {:?} is not a valid {}",
            name,
            value,
            ty.name()
        ))
    };

    if *ty == Type::INT8 {
        Ok(Box::new(value.as_i64().ok_or_else(mismatch)?))
    } else if *ty == Type::INT4 {
        let v = value.as_i64().ok_or_else(mismatch)?;
        Ok(Box::new(i32::try_from(v).map_err(|_| mismatch())?))
    } else if *ty == Type::INT2 {
        let v = value.as_i64().ok_or_else(mismatch)?;
        Ok(Box::new(i16::try_from(v).map_err(|_| mismatch())?))
    } else if *ty == Type::BOOL {
        Ok(Box::new(value.as_bool().ok_or_else(mismatch)?))
    } else if [Type::TEXT, Type::VARCHAR, Type::BPCHAR, Type::NAME, Type::UNKNOWN].contains(ty) {
        Ok(Box::new(value.as_text()))
    } else {
        Err(ExportError::QueryError(format!(
            "Unsupported parameter type {} for {}",
            ty.name(),
            name
        )))
    }
}

fn row_to_json(row: &Row) -> Result<Value> {
    let mut map = Map::new();
    for (i, column) in row.columns().iter().enumerate() {
        let RawCell(raw) = row.try_get(i)?;
        map.insert(column.name().to_string(), decode_cell(column.type_(), raw)?);
    }
    Ok(Value::Object(map))
}

fn cell_to_json(row: &Row, i: usize) -> Result<Value> {
    let RawCell(raw) = row.try_get(i)?;
    decode_cell(row.columns()[i].type_(), raw)
}

/// Undecoded wire bytes of one cell; `None` for SQL NULL.
struct RawCell<'a>(Option<&'a [u8]>);

impl<'a> FromSql<'a> for RawCell<'a> {
    fn from_sql(
        _ty: &Type,
        raw: &'a [u8],
    ) -> std::result::Result<Self, Box<dyn std::error::Error + Sync + Send>> {
        Ok(RawCell(Some(raw)))
    }

    fn from_sql_null(
        _ty: &Type,
    ) -> std::result::Result<Self, Box<dyn std::error::Error + Sync + Send>> {
        Ok(RawCell(None))
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

fn decode<'a, T: FromSql<'a>>(ty: &Type, raw: Option<&'a [u8]>) -> Result<Option<T>> {
    Option::<T>::from_sql_nullable(ty, raw)
        .map_err(|e| ExportError::QueryError(format!("Cannot decode {} value: {}", ty.name(), e)))
}

/// Converts one binary-format cell to JSON. Types without a mapping render as `"<typename>"`.
fn decode_cell(ty: &Type, raw: Option<&[u8]>) -> Result<Value> {
    let value = if *ty == Type::BOOL {
        json!(decode::<bool>(ty, raw)?)
    } else if *ty == Type::INT2 {
        json!(decode::<i16>(ty, raw)?)
    } else if *ty == Type::INT4 {
        json!(decode::<i32>(ty, raw)?)
    } else if *ty == Type::INT8 {
        json!(decode::<i64>(ty, raw)?)
    } else if *ty == Type::OID {
        json!(decode::<u32>(ty, raw)?)
    } else if *ty == Type::FLOAT4 {
        json!(decode::<f32>(ty, raw)?)
    } else if *ty == Type::FLOAT8 {
        json!(decode::<f64>(ty, raw)?)
    } else if *ty == Type::TIMESTAMPTZ {
        json!(decode::<chrono::DateTime<chrono::Utc>>(ty, raw)?.map(|t| t.to_rfc3339()))
    } else if *ty == Type::TIMESTAMP {
        json!(decode::<chrono::NaiveDateTime>(ty, raw)?.map(|t| t.to_string()))
    } else if *ty == Type::JSON || *ty == Type::JSONB {
        decode::<Value>(ty, raw)?.unwrap_or(Value::Null)
    } else if [Type::TEXT, Type::VARCHAR, Type::BPCHAR, Type::NAME].contains(ty) {
        json!(decode::<String>(ty, raw)?)
    } else if raw.is_none() {
        Value::Null
    } else {
        json!(format!("<{}>", ty.name()))
    };
    Ok(value)
}
