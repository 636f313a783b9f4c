use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Entry point.
///
/// Loads `.env`, checks the credential, then enriches both datasets in the
/// data directory. Any failure aborts the run with a non-zero exit code.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "placekey_join=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let reports = match placekey_join::pipeline::run_from_vars(|key| std::env::var(key).ok()).await
    {
        Ok(reports) => reports,
        Err(e) => {
            tracing::error!("Run failed: {:#}", e);
            return Err(e);
        }
    };

    for report in &reports {
        tracing::info!(
            "{} -> {}",
            report.dataset,
            report.output_path.display()
        );
    }
    tracing::info!("Done: {} datasets enriched", reports.len());

    Ok(())
}
