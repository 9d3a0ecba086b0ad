use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;

use crate::config::Config;
use crate::errors::AppError;
use crate::models::CampaignRequest;
use crate::provision::CampaignProvisioner;

/// Shared application state.
pub struct AppState {
    pub config: Config,
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "ads-provisioning",
        "timestamp": Utc::now(),
    }))
}

/// Campaign provisioning endpoint.
///
/// Runs the full pipeline synchronously and returns the
/// `ProvisioningResult`. The caller persists the result against the
/// originating campaign record; this service keeps no state.
///
/// # Arguments
///
/// * `app_state` - The application state.
/// * `request` - JSON body containing the campaign request.
///
/// # Returns
///
/// * `Result<impl IntoResponse, AppError>` - 201 with the result, or a
///   taxonomy-mapped error response.
pub async fn provision_campaign(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<CampaignRequest>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!(
        "📨 Received provision request: campaign={} ({})",
        request.name,
        request.id
    );

    // Tokens are run-scoped, so clients are built per request; no state is
    // shared between concurrent provisioning runs.
    let provisioner = CampaignProvisioner::new(&app_state.config)?;
    let result = provisioner.provision(&request).await?;

    Ok((StatusCode::CREATED, Json(result)))
}
