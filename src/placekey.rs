use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::config::Config;
use crate::errors::AppError;
use crate::models::{BulkLookupRequest, PlacekeyQuery, PlacekeyResult};

const USER_AGENT: &str = concat!("placekey-join/", env!("CARGO_PKG_VERSION"));

/// Anything that can resolve queries into Placekey results.
///
/// Results are matched to queries by `query_id`, never by position.
#[async_trait]
pub trait PlacekeyLookup: Send + Sync {
    async fn lookup_placekeys(
        &self,
        queries: &[PlacekeyQuery],
        verbose: bool,
    ) -> Result<Vec<PlacekeyResult>, AppError>;
}

/// Client for the hosted Placekey bulk endpoint.
#[derive(Clone)]
pub struct PlacekeyClient {
    client: Client,
    base_url: String,
    api_key: String,
    batch_size: usize,
}

impl PlacekeyClient {
    /// Creates a new `PlacekeyClient` from the loaded configuration.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create Placekey client: {}", e))
            })?;

        tracing::info!("Placekey client initialized: {}", config.base_url);

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            batch_size: config.batch_size.max(1),
        })
    }

    /// Sends one batch (at most `batch_size` queries) to `/v1/placekeys`.
    pub async fn lookup_batch(
        &self,
        queries: &[PlacekeyQuery],
    ) -> Result<Vec<PlacekeyResult>, AppError> {
        let url = format!("{}/v1/placekeys", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .json(&BulkLookupRequest { queries })
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("Placekey request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("Placekey API returned error {}: {}", status, error_text);
            return Err(AppError::ExternalApiError(format!(
                "Placekey API returned status {}: {}",
                status, error_text
            )));
        }

        let results: Vec<PlacekeyResult> = response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse Placekey response: {}", e))
        })?;

        Ok(results)
    }
}

#[async_trait]
impl PlacekeyLookup for PlacekeyClient {
    async fn lookup_placekeys(
        &self,
        queries: &[PlacekeyQuery],
        verbose: bool,
    ) -> Result<Vec<PlacekeyResult>, AppError> {
        let total = queries.len();
        let mut results = Vec::with_capacity(total);
        let mut processed = 0;

        for batch in queries.chunks(self.batch_size) {
            let batch_results = self.lookup_batch(batch).await?;
            processed += batch.len();
            if verbose {
                tracing::info!(
                    "Placekey: processed {}/{} queries ({} results in batch)",
                    processed,
                    total,
                    batch_results.len()
                );
            } else {
                tracing::debug!("Placekey: processed {}/{} queries", processed, total);
            }
            results.extend(batch_results);
        }

        Ok(results)
    }
}
