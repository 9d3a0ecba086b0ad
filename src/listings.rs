use reqwest::Client;
use std::time::Duration;
use uuid::Uuid;

use crate::config::Config;
use crate::errors::AppError;
use crate::models::ListingSnapshot;

/// Read-only client for the marketplace backend's listing endpoint.
///
/// The pipeline fetches each campaign's listings exactly once and only for
/// creative generation; nothing is ever written back.
#[derive(Clone)]
pub struct ListingClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ListingClient {
    /// Creates a new `ListingClient` from configuration.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| {
                AppError::protocol(0, &format!("Failed to create listing client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.listing_api_base_url.trim_end_matches('/').to_string(),
            api_key: config.listing_api_key.clone(),
        })
    }

    /// Fetches snapshots for the given listing ids.
    ///
    /// An empty id list short-circuits to an empty result without touching
    /// the network.
    pub async fn fetch_snapshots(&self, ids: &[Uuid]) -> Result<Vec<ListingSnapshot>, AppError> {
        if ids.is_empty() {
            tracing::debug!("No listing ids supplied, skipping lookup");
            return Ok(Vec::new());
        }

        let joined = ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");

        // Build URL with proper parameter encoding
        let url = reqwest::Url::parse_with_params(
            &format!("{}/api/v1/listings", self.base_url),
            &[("ids", joined.as_str())],
        )
        .map_err(|e| AppError::protocol(0, &format!("Failed to build listing URL: {}", e)))?;

        tracing::info!("Fetching {} listing snapshot(s)", ids.len());

        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("Listing API returned {}: {}", status, error_text);
            return Err(AppError::protocol(status.as_u16(), &error_text));
        }

        let snapshots: Vec<ListingSnapshot> = response.json().await.map_err(|e| {
            AppError::protocol(200, &format!("Failed to parse listing response: {}", e))
        })?;

        tracing::info!("✓ Fetched {} listing snapshot(s)", snapshots.len());
        Ok(snapshots)
    }
}
