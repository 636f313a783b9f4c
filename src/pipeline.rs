/// Per-dataset enrichment pipeline
///
/// For each dataset:
/// 1. Load `<name>.csv` from the data directory
/// 2. Map rows onto the lookup API schema
/// 3. Resolve Placekeys through the injected lookup client
/// 4. Write the raw results to `placekeys_<name>.csv`
/// 5. Left-join the results onto the input and write `<name>_w_placekeys.csv`
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::datasets::{self, DatasetSpec};
use crate::errors::{AppError, ResultExt};
use crate::mapper::map_for_api;
use crate::merge::{left_join, results_table, MatchPolicy, MatchStats};
use crate::placekey::{PlacekeyClient, PlacekeyLookup};
use crate::table::DataTable;

/// Summary of one processed dataset.
#[derive(Debug, Clone)]
pub struct DatasetReport {
    pub dataset: String,
    pub input_rows: usize,
    pub results: usize,
    pub placekeys_found: usize,
    pub lookup_errors: usize,
    pub stats: MatchStats,
    pub results_path: PathBuf,
    pub output_path: PathBuf,
}

/// Runs one dataset end to end.
pub async fn process_dataset<L>(
    lookup: &L,
    spec: &DatasetSpec,
    data_dir: &Path,
    verbose: bool,
    policy: MatchPolicy,
) -> Result<DatasetReport, AppError>
where
    L: PlacekeyLookup + ?Sized,
{
    tracing::info!("Processing dataset {}", spec.name);

    let input = DataTable::read_csv(&data_dir.join(spec.input_file()))?;
    if input.is_empty() {
        tracing::warn!("{} has no rows; outputs will only carry headers", spec.name);
    }
    let queries = map_for_api(&input, &spec.column_map)
        .with_context(|| format!("Mapping {} for the lookup API", spec.name))?;

    if policy == MatchPolicy::Strict {
        let mut seen = HashSet::with_capacity(queries.len());
        if let Some(dup) = queries.iter().find(|q| !seen.insert(q.query_id.as_str())) {
            return Err(AppError::ResultMismatch(format!(
                "{}: duplicate query_id '{}' in input",
                spec.name, dup.query_id
            )));
        }
    }

    let results = lookup
        .lookup_placekeys(&queries, verbose)
        .await
        .with_context(|| format!("Placekey lookup for {}", spec.name))?;

    let results_path = data_dir.join(spec.results_file());
    results_table(&results).write_csv(&results_path)?;

    let (joined, stats) = left_join(&input, spec.key_column, &results, policy)
        .with_context(|| format!("Joining Placekeys onto {}", spec.name))?;
    let output_path = data_dir.join(spec.output_file());
    joined.write_csv(&output_path)?;

    let report = DatasetReport {
        dataset: spec.name.to_string(),
        input_rows: input.len(),
        results: results.len(),
        placekeys_found: results.iter().filter(|r| r.placekey.is_some()).count(),
        lookup_errors: results.iter().filter(|r| r.error.is_some()).count(),
        stats,
        results_path,
        output_path,
    };

    tracing::info!(
        "✓ {}: {} rows, {} results, {} placekeys, {} lookup errors, {} rows matched",
        report.dataset,
        report.input_rows,
        report.results,
        report.placekeys_found,
        report.lookup_errors,
        report.stats.matched_rows
    );

    Ok(report)
}

/// Runs every dataset in order, stopping at the first failure.
pub async fn run<L>(lookup: &L, config: &Config) -> Result<Vec<DatasetReport>, AppError>
where
    L: PlacekeyLookup + ?Sized,
{
    let mut reports = Vec::new();
    for spec in datasets::all() {
        let report = process_dataset(
            lookup,
            &spec,
            &config.data_dir,
            config.verbose,
            config.match_policy,
        )
        .await?;
        reports.push(report);
    }
    Ok(reports)
}

/// Builds the configuration from `var`, then the client, then runs.
///
/// Nothing touches the data directory or the network until the credential
/// check has passed.
pub async fn run_from_vars<F>(var: F) -> anyhow::Result<Vec<DatasetReport>>
where
    F: Fn(&str) -> Option<String>,
{
    let config = Config::from_vars(var)?;
    let client = PlacekeyClient::new(&config)?;
    Ok(run(&client, &config).await?)
}
