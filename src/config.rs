use std::path::PathBuf;

use serde::Deserialize;

use crate::merge::MatchPolicy;

pub const DEFAULT_BASE_URL: &str = "https://api.placekey.io";
pub const DEFAULT_DATA_DIR: &str = "data";
/// Largest batch the bulk endpoint accepts.
pub const MAX_BATCH_SIZE: usize = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub data_dir: PathBuf,
    pub batch_size: usize,
    pub timeout_secs: u64,
    pub verbose: bool,
    pub match_policy: MatchPolicy,
}

impl Config {
    /// Builds the configuration from an arbitrary variable source.
    ///
    /// The credential is checked first so that a missing key aborts before
    /// any other value is looked at.
    pub fn from_vars<F>(var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = var("PLACEKEY_API_KEY")
            .ok_or_else(|| {
                anyhow::anyhow!("Please set the PLACEKEY_API_KEY environment variable")
            })
            .and_then(|key| {
                if key.trim().is_empty() {
                    anyhow::bail!("PLACEKEY_API_KEY cannot be empty");
                }
                Ok(key)
            })?;

        let config = Self {
            api_key,
            base_url: parse_base_url(
                var("PLACEKEY_BASE_URL")
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            )?,
            data_dir: var("PLACEKEY_DATA_DIR")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            batch_size: var("PLACEKEY_BATCH_SIZE")
                .unwrap_or_else(|| MAX_BATCH_SIZE.to_string())
                .parse::<usize>()
                .ok()
                .filter(|n| (1..=MAX_BATCH_SIZE).contains(n))
                .ok_or_else(|| {
                    anyhow::anyhow!(
                        "PLACEKEY_BATCH_SIZE must be a number between 1-{}",
                        MAX_BATCH_SIZE
                    )
                })?,
            timeout_secs: var("PLACEKEY_TIMEOUT_SECS")
                .unwrap_or_else(|| "30".to_string())
                .parse::<u64>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    anyhow::anyhow!("PLACEKEY_TIMEOUT_SECS must be a positive number of seconds")
                })?,
            verbose: parse_flag(var("PLACEKEY_VERBOSE"), true, "PLACEKEY_VERBOSE")?,
            match_policy: if parse_flag(var("PLACEKEY_STRICT_MATCH"), false, "PLACEKEY_STRICT_MATCH")? {
                MatchPolicy::Strict
            } else {
                MatchPolicy::Permissive
            },
        };

        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Placekey base URL: {}", config.base_url);
        tracing::debug!("Data directory: {}", config.data_dir.display());
        tracing::debug!(
            "Batch size: {}, timeout: {}s, policy: {:?}",
            config.batch_size,
            config.timeout_secs,
            config.match_policy
        );

        Ok(config)
    }
}

fn parse_base_url(raw: String) -> anyhow::Result<String> {
    let parsed = url::Url::parse(&raw)
        .map_err(|e| anyhow::anyhow!("PLACEKEY_BASE_URL is not a valid URL: {}", e))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        anyhow::bail!("PLACEKEY_BASE_URL must start with http:// or https://");
    }
    Ok(raw.trim().trim_end_matches('/').to_string())
}

fn parse_flag(raw: Option<String>, default: bool, name: &str) -> anyhow::Result<bool> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(default),
        Some(v) if v.eq_ignore_ascii_case("true") || v == "1" || v.eq_ignore_ascii_case("yes") => {
            Ok(true)
        }
        Some(v) if v.eq_ignore_ascii_case("false") || v == "0" || v.eq_ignore_ascii_case("no") => {
            Ok(false)
        }
        Some(v) => anyhow::bail!("{} must be true or false, got '{}'", name, v),
    }
}
