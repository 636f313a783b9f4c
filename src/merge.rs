//! Joining lookup results back onto the source table.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::Deserialize;

use crate::errors::AppError;
use crate::models::PlacekeyResult;
use crate::table::DataTable;

/// How strictly results must line up with the submitted queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum MatchPolicy {
    /// Left join; mismatches are only logged.
    #[default]
    Permissive,
    /// Exactly one result per unique query id, or the dataset fails.
    Strict,
}

/// Counters describing how results lined up with input rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchStats {
    pub matched_rows: usize,
    pub unmatched_rows: usize,
    pub orphan_results: usize,
    pub duplicate_results: usize,
}

/// Columns of the raw results table: `query_id`, `placekey`, `error` if any
/// result carries one, then extra fields sorted by name.
pub fn result_columns(results: &[PlacekeyResult]) -> Vec<String> {
    let mut columns = vec!["query_id".to_string(), "placekey".to_string()];
    if results.iter().any(|r| r.error.is_some()) {
        columns.push("error".to_string());
    }
    let extras: BTreeSet<&String> = results.iter().flat_map(|r| r.extra.keys()).collect();
    columns.extend(
        extras
            .into_iter()
            .filter(|k| !matches!(k.as_str(), "query_id" | "placekey" | "error"))
            .cloned(),
    );
    columns
}

/// The lookup results as a table, one row per result in response order.
pub fn results_table(results: &[PlacekeyResult]) -> DataTable {
    let columns = result_columns(results);
    let mut table = DataTable::new(columns.clone());
    for result in results {
        table.push_row(
            columns
                .iter()
                .map(|c| result.cell(c).unwrap_or_default())
                .collect(),
        );
    }
    table
}

/// Left-joins `results` onto `original` where `original[key_column]`
/// equals `result.query_id`.
///
/// Every original row is kept, in order, exactly once. Rows without a result
/// get empty cells in the added columns. Added column names that collide
/// with original ones are suffixed `_x` (original) and `_y` (result).
pub fn left_join(
    original: &DataTable,
    key_column: &str,
    results: &[PlacekeyResult],
    policy: MatchPolicy,
) -> Result<(DataTable, MatchStats), AppError> {
    let key_idx = original.require_column(key_column)?;
    let mut stats = MatchStats::default();

    let mut by_id: HashMap<&str, &PlacekeyResult> = HashMap::with_capacity(results.len());
    for result in results {
        if by_id.contains_key(result.query_id.as_str()) {
            stats.duplicate_results += 1;
            tracing::warn!("Duplicate result for query_id {}", result.query_id);
        } else {
            by_id.insert(result.query_id.as_str(), result);
        }
    }

    let keys: HashSet<&str> = original.rows().iter().map(|r| r[key_idx].as_str()).collect();
    stats.orphan_results = by_id.keys().filter(|id| !keys.contains(*id)).count();

    let added = result_columns(results);
    let headers = joined_headers(original.headers(), &added);
    let mut joined = DataTable::new(headers);

    for row in original.rows() {
        let mut out = row.clone();
        match by_id.get(row[key_idx].as_str()) {
            Some(result) => {
                stats.matched_rows += 1;
                out.extend(added.iter().map(|c| result.cell(c).unwrap_or_default()));
            }
            None => {
                stats.unmatched_rows += 1;
                out.extend(added.iter().map(|_| String::new()));
            }
        }
        joined.push_row(out);
    }

    if stats.unmatched_rows > 0 || stats.orphan_results > 0 || stats.duplicate_results > 0 {
        tracing::warn!(
            "Join on '{}': {} rows without a result, {} results without a row, {} duplicate results",
            key_column,
            stats.unmatched_rows,
            stats.orphan_results,
            stats.duplicate_results
        );
        if policy == MatchPolicy::Strict {
            return Err(AppError::ResultMismatch(format!(
                "join on '{}' is not 1:1 ({} unmatched rows, {} orphan results, {} duplicate results)",
                key_column, stats.unmatched_rows, stats.orphan_results, stats.duplicate_results
            )));
        }
    }

    Ok((joined, stats))
}

fn joined_headers(original: &[String], added: &[String]) -> Vec<String> {
    let original_set: HashSet<&String> = original.iter().collect();
    let added_set: HashSet<&String> = added.iter().collect();

    original
        .iter()
        .map(|h| {
            if added_set.contains(h) {
                format!("{}_x", h)
            } else {
                h.clone()
            }
        })
        .chain(added.iter().map(|h| {
            if original_set.contains(h) {
                format!("{}_y", h)
            } else {
                h.clone()
            }
        }))
        .collect()
}
