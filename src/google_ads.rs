use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::Config;
use crate::errors::AppError;
use crate::google_ads_models::{ApiErrorBody, MutateResponse, ResourceKind, TokenResponse};

/// Google Ads REST API version this client speaks.
const GOOGLE_ADS_API_VERSION: &str = "v16";

/// Client for the Google Ads campaign-management surface.
///
/// Covers the two calls the pipeline needs: the refresh-grant token
/// exchange and the resource-type-scoped batch `:mutate` endpoints. Base
/// URLs come from configuration so tests can point at a mock server.
#[derive(Clone)]
pub struct GoogleAdsClient {
    client: Client,
    oauth_base_url: String,
    ads_base_url: String,
    customer_id: String,
    client_id: String,
    client_secret: String,
    refresh_token: String,
    developer_token: String,
    login_customer_id: Option<String>,
}

impl GoogleAdsClient {
    /// Creates a new `GoogleAdsClient` from configuration.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                AppError::protocol(0, &format!("Failed to create Google Ads client: {}", e))
            })?;

        Ok(Self {
            client,
            oauth_base_url: config.oauth_base_url.clone(),
            ads_base_url: config.ads_base_url.clone(),
            customer_id: config.google_customer_id.clone(),
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            refresh_token: config.google_refresh_token.clone(),
            developer_token: config.google_developer_token.clone(),
            login_customer_id: config.google_login_customer_id.clone(),
        })
    }

    /// Exchanges the long-lived refresh token for a short-lived bearer token.
    ///
    /// One HTTP exchange, no internal retry; the retry decision belongs to
    /// the caller. A non-2xx response or a body missing `access_token` is an
    /// authentication failure.
    pub async fn fetch_access_token(&self) -> Result<String, AppError> {
        let url = format!("{}/token", self.oauth_base_url);
        tracing::debug!("Requesting access token from {}", url);

        let response = self
            .client
            .post(&url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", self.refresh_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::Auth(format!("Token request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::Auth(format!("Failed to read token response: {}", e)))?;

        let parsed: TokenResponse = serde_json::from_str(&text).unwrap_or_default();

        if !status.is_success() {
            tracing::error!("Token exchange failed ({}): {}", status, parsed.describe_error());
            return Err(AppError::Auth(format!(
                "Token exchange failed ({}): {}",
                status,
                parsed.describe_error()
            )));
        }

        match parsed.access_token {
            Some(token) if !token.is_empty() => {
                tracing::debug!("✓ Access token acquired");
                Ok(token)
            }
            _ => Err(AppError::Auth(
                "Token response missing access_token field".to_string(),
            )),
        }
    }

    /// Issues one batch `:mutate` call for a resource type.
    ///
    /// Returns per-operation results in request order. When
    /// `partial_failure` is set, individual operation failures come back in
    /// the response body instead of failing the whole request; the flag is
    /// surfaced to the caller, not treated as an error here.
    pub async fn mutate(
        &self,
        access_token: &str,
        kind: ResourceKind,
        operations: Vec<Value>,
        partial_failure: bool,
    ) -> Result<MutateResponse, AppError> {
        let url = format!(
            "{}/{}/customers/{}/{}:mutate",
            self.ads_base_url,
            GOOGLE_ADS_API_VERSION,
            self.customer_id,
            kind.endpoint()
        );
        let operation_count = operations.len();
        tracing::info!(
            "Submitting {} {} operation(s) to {}",
            operation_count,
            kind.describe(),
            kind.endpoint()
        );

        let body = json!({
            "operations": operations,
            "partialFailure": partial_failure,
        });

        let mut request = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", access_token))
            .header("developer-token", &self.developer_token)
            .json(&body);
        if let Some(ref manager) = self.login_customer_id {
            request = request.header("login-customer-id", manager);
        }

        let response = request.send().await?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::protocol(status.as_u16(), &e.to_string()))?;

        if !status.is_success() {
            // Prefer the itemized per-operation messages; fall back to the
            // top-level message; an unparseable body is a protocol error.
            return match serde_json::from_str::<ApiErrorBody>(&text) {
                Ok(parsed) => match parsed.describe() {
                    Some(description) => Err(AppError::RemoteRejected(format!(
                        "{} mutate rejected ({}): {}",
                        kind.describe(),
                        status,
                        description
                    ))),
                    None => Err(AppError::protocol(status.as_u16(), &text)),
                },
                Err(_) => Err(AppError::protocol(status.as_u16(), &text)),
            };
        }

        let parsed: MutateResponse = serde_json::from_str(&text)
            .map_err(|_| AppError::protocol(status.as_u16(), &text))?;

        if let Some(ref partial) = parsed.partial_failure_error {
            tracing::warn!(
                "⚠️  Partial failure in {} batch: {}",
                kind.describe(),
                partial.message.as_deref().unwrap_or("no message")
            );
        }
        tracing::info!(
            "✓ {} mutate: {}/{} operation(s) succeeded",
            kind.describe(),
            parsed.created_resource_names().len(),
            operation_count
        );

        Ok(parsed)
    }
}
