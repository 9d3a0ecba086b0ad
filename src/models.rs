use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// A user-submitted advertising campaign, as persisted by the marketplace
/// application. Immutable once handed to the pipeline.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CampaignRequest {
    /// Marketplace-side campaign identifier.
    pub id: Uuid,

    /// Display name chosen by the user.
    pub name: String,

    /// Total budget for the whole campaign, in the origin currency.
    pub total_budget: f64,

    /// ISO code of the origin currency (informational; the conversion rate
    /// comes from configuration).
    #[serde(default)]
    pub currency: Option<String>,

    /// Place names the user chose to target. Carried with the request but
    /// not mapped to platform geo criteria; creatives derive locations from
    /// the listings themselves.
    #[serde(default)]
    pub target_locations: Vec<String>,

    /// Age bracket label, e.g. "25-44". Informational only; demographic
    /// criteria are not provisioned.
    #[serde(default)]
    pub target_age_range: Option<String>,

    #[serde(default)]
    pub start_date: Option<NaiveDate>,

    #[serde(default)]
    pub end_date: Option<NaiveDate>,

    /// Audience interest tags supplied by the user.
    #[serde(default)]
    pub interests: Vec<String>,

    /// Property listings this campaign advertises.
    #[serde(default)]
    pub listing_ids: Vec<Uuid>,

    /// Target platforms selected in the UI ("google", "facebook", ...).
    /// Only "google" is provisioned here; the list is echoed back for the
    /// caller's records.
    #[serde(default)]
    pub platforms: Vec<String>,
}

impl CampaignRequest {
    /// Validates the request before any remote call is made.
    ///
    /// Rejections here are zero-cost: nothing has been created remotely yet.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation(
                "Campaign name cannot be empty".to_string(),
            ));
        }

        if !self.total_budget.is_finite() || self.total_budget <= 0.0 {
            return Err(AppError::Validation(
                "Campaign budget must be greater than zero".to_string(),
            ));
        }

        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(AppError::Validation(format!(
                    "Campaign end date {} is before start date {}",
                    end, start
                )));
            }
        }

        Ok(())
    }
}

/// Read-only projection of a property record, fetched once per pipeline run
/// and used only for creative generation.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListingSnapshot {
    pub id: Uuid,
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub location: Option<String>,

    #[serde(default)]
    pub price: Option<f64>,

    /// "apartment", "house", "townhouse", ...
    #[serde(default)]
    pub property_type: Option<String>,

    #[serde(default)]
    pub bedrooms: Option<u32>,

    #[serde(default)]
    pub bathrooms: Option<u32>,

    #[serde(default)]
    pub area_sqm: Option<f64>,
}

/// Final classification of a pipeline run that got past the campaign stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisionOutcome {
    /// Every attempted resource was created.
    Success,
    /// Budget and campaign exist remotely, but the creative stage is
    /// incomplete. The operator can finish it in the platform console.
    PartialSuccess,
}

/// Aggregate outcome of one provisioning run, returned to the caller who is
/// responsible for persisting it against the originating request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisioningResult {
    /// Remote resource name of the created campaign.
    pub campaign_id: String,
    /// Remote resource name of the created budget.
    pub budget_id: String,
    pub ad_groups_created: usize,
    pub keywords_created: usize,
    pub ads_created: usize,
    pub outcome: ProvisionOutcome,
    /// Human-readable explanation when the outcome is partial.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}
