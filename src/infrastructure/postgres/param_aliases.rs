//! Short parameter names accepted by every named query.
//!
//! `sn=3` is the same as `snapshot_id=3`. Resolution adds the canonical key
//! next to the alias; if both are given, the alias value is the one used.

use crate::infrastructure::postgres::query_store::QueryParams;

/// Alias to canonical parameter name.
pub const PARAM_ALIASES: &[(&str, &str)] = &[
    ("sn", "snapshot_id"),
    ("snapshot", "snapshot_id"),
    ("sc", "schema_id"),
    ("schema", "schema_id"),
    ("tn", "table_name"),
    ("tname", "table_name"),
    ("ti", "table_id"),
    ("tid", "table_id"),
];

/// Canonical name for `alias`, if it is one.
pub fn canonical_name(alias: &str) -> Option<&'static str> {
    PARAM_ALIASES
        .iter()
        .find(|(a, _)| *a == alias)
        .map(|(_, canonical)| *canonical)
}

/// Returns `params` with every alias also present under its canonical name.
pub fn resolve(params: &QueryParams) -> QueryParams {
    let mut resolved = params.clone();
    for (name, value) in params.iter() {
        if let Some(canonical) = canonical_name(name) {
            resolved.insert(canonical, value.clone());
        }
    }
    resolved
}
