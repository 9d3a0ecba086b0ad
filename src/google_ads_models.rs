//! Typed wire structs for the Google Ads REST surface this pipeline touches:
//! the OAuth token endpoint and the per-resource-type `:mutate` endpoints.
//!
//! The remote shapes are loosely typed JSON; mapping them to structs here
//! keeps the orchestrator and error classifier on exhaustively-matchable
//! types instead of raw maps.

use serde::Deserialize;

/// The resource categories the pipeline creates, in dependency order.
/// Operations of one kind must be grouped into a single `:mutate` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    CampaignBudget,
    Campaign,
    AdGroup,
    AdGroupCriterion,
    AdGroupAd,
}

impl ResourceKind {
    /// URL path segment of the resource-type-scoped mutation endpoint.
    pub fn endpoint(&self) -> &'static str {
        match self {
            ResourceKind::CampaignBudget => "campaignBudgets",
            ResourceKind::Campaign => "campaigns",
            ResourceKind::AdGroup => "adGroups",
            ResourceKind::AdGroupCriterion => "adGroupCriteria",
            ResourceKind::AdGroupAd => "adGroupAds",
        }
    }

    /// Human-readable label used in error messages and logs.
    pub fn describe(&self) -> &'static str {
        match self {
            ResourceKind::CampaignBudget => "campaign budget",
            ResourceKind::Campaign => "campaign",
            ResourceKind::AdGroup => "ad group",
            ResourceKind::AdGroupCriterion => "keyword criterion",
            ResourceKind::AdGroupAd => "ad",
        }
    }
}

/// Response of the OAuth token endpoint. The same struct covers both the
/// success shape (`access_token`) and the error shape
/// (`error`/`error_description`), since Google mixes them per status code.
#[derive(Debug, Default, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl TokenResponse {
    /// Best human-readable description of a failed exchange.
    pub fn describe_error(&self) -> String {
        match (&self.error, &self.error_description) {
            (Some(error), Some(description)) => format!("{}: {}", error, description),
            (Some(error), None) => error.clone(),
            (None, Some(description)) => description.clone(),
            (None, None) => "token endpoint returned no error detail".to_string(),
        }
    }
}

/// Successful `:mutate` response. Results are in request order, so the
/// caller can positionally match operations to resolved resource names.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutateResponse {
    #[serde(default)]
    pub results: Vec<MutateResult>,
    /// Present when `partialFailure` was set and some operations failed.
    /// Surfaced to the caller, never treated as a hard error by the
    /// executor itself.
    #[serde(default)]
    pub partial_failure_error: Option<RpcStatus>,
}

impl MutateResponse {
    /// Resource names of the operations that actually succeeded. Failed
    /// operations in a partial-failure batch come back as empty result
    /// objects and are skipped here.
    pub fn created_resource_names(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter_map(|r| r.resource_name.as_deref())
            .filter(|name| !name.is_empty())
            .collect()
    }

    /// The single resolved resource name of a one-operation batch.
    pub fn single_resource_name(&self) -> Option<&str> {
        self.results
            .first()
            .and_then(|r| r.resource_name.as_deref())
            .filter(|name| !name.is_empty())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutateResult {
    #[serde(default)]
    pub resource_name: Option<String>,
}

/// `google.rpc.Status` as embedded in partial-failure responses.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcStatus {
    #[serde(default)]
    pub code: Option<i32>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Top-level error envelope of a non-2xx mutate response.
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: Option<ApiError>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: Option<i32>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub details: Vec<ErrorDetail>,
}

/// One `GoogleAdsFailure` entry in the error details list.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub errors: Vec<AdsErrorItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdsErrorItem {
    #[serde(default)]
    pub message: Option<String>,
    /// Taxonomy tag, e.g. `{"budgetError": "TOO_LOW"}`. Kept loose; only
    /// the messages are surfaced to callers.
    #[serde(default)]
    pub error_code: Option<serde_json::Value>,
}

impl ApiErrorBody {
    /// Concatenates the itemized per-operation messages into one
    /// description, falling back to the top-level message when no itemized
    /// detail is present.
    pub fn describe(&self) -> Option<String> {
        let error = self.error.as_ref()?;

        let itemized: Vec<&str> = error
            .details
            .iter()
            .flat_map(|detail| detail.errors.iter())
            .filter_map(|item| item.message.as_deref())
            .filter(|message| !message.is_empty())
            .collect();

        if !itemized.is_empty() {
            return Some(itemized.join("; "));
        }

        error.message.clone().filter(|message| !message.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutate_response_parses_results_in_order() {
        let body = r#"{
            "results": [
                {"resourceName": "customers/1/adGroups/10"},
                {},
                {"resourceName": "customers/1/adGroups/30"}
            ],
            "partialFailureError": {"code": 3, "message": "2 errors occurred"}
        }"#;
        let response: MutateResponse = serde_json::from_str(body).unwrap();

        assert_eq!(response.results.len(), 3);
        assert_eq!(
            response.created_resource_names(),
            vec!["customers/1/adGroups/10", "customers/1/adGroups/30"]
        );
        assert_eq!(
            response.partial_failure_error.unwrap().message.as_deref(),
            Some("2 errors occurred")
        );
    }

    #[test]
    fn error_body_prefers_itemized_messages() {
        let body = r#"{
            "error": {
                "code": 400,
                "message": "Request contains an invalid argument.",
                "status": "INVALID_ARGUMENT",
                "details": [{
                    "errors": [
                        {"errorCode": {"budgetError": "NON_MULTIPLE_OF_MINIMUM_CURRENCY_UNIT"},
                         "message": "Budget is not a multiple of the minimum currency unit."},
                        {"errorCode": {"stringLengthError": "TOO_LONG"},
                         "message": "Too long."}
                    ]
                }]
            }
        }"#;
        let parsed: ApiErrorBody = serde_json::from_str(body).unwrap();
        assert_eq!(
            parsed.describe().unwrap(),
            "Budget is not a multiple of the minimum currency unit.; Too long."
        );
    }

    #[test]
    fn error_body_falls_back_to_top_level_message() {
        let body = r#"{"error": {"code": 401, "message": "Request had invalid credentials.", "status": "UNAUTHENTICATED"}}"#;
        let parsed: ApiErrorBody = serde_json::from_str(body).unwrap();
        assert_eq!(
            parsed.describe().unwrap(),
            "Request had invalid credentials."
        );
    }

    #[test]
    fn token_response_error_description() {
        let body = r#"{"error": "invalid_grant", "error_description": "Token has been expired or revoked."}"#;
        let parsed: TokenResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.access_token.is_none());
        assert_eq!(
            parsed.describe_error(),
            "invalid_grant: Token has been expired or revoked."
        );
    }

    #[test]
    fn endpoints_cover_all_kinds() {
        assert_eq!(ResourceKind::CampaignBudget.endpoint(), "campaignBudgets");
        assert_eq!(ResourceKind::Campaign.endpoint(), "campaigns");
        assert_eq!(ResourceKind::AdGroup.endpoint(), "adGroups");
        assert_eq!(ResourceKind::AdGroupCriterion.endpoint(), "adGroupCriteria");
        assert_eq!(ResourceKind::AdGroupAd.endpoint(), "adGroupAds");
    }
}
