//! Sequences the creation of dependent ads-platform resources for one
//! campaign request: budget, then campaign, then per-listing ad groups with
//! their keywords and ads.
//!
//! Each stage needs the resolved resource names of the previous one, so the
//! flow is strictly sequential. Budget and campaign failures abort the run;
//! creative-stage failures degrade the outcome to partial success, because a
//! campaign with a budget is a usable remote object an operator can finish
//! by hand.

use chrono::Utc;
use serde_json::{json, Value};
use std::time::Instant;

use crate::budget;
use crate::config::Config;
use crate::creative::{self, CreativeSet};
use crate::errors::{AppError, ResultExt};
use crate::google_ads::GoogleAdsClient;
use crate::google_ads_models::ResourceKind;
use crate::listings::ListingClient;
use crate::models::{CampaignRequest, ListingSnapshot, ProvisionOutcome, ProvisioningResult};

/// Default ad-group CPC bid, in micros (1.00 in the settlement currency).
const DEFAULT_CPC_BID_MICROS: i64 = 1_000_000;

/// A completed provisioning stage. `undo` is the hook where a compensating
/// delete would go; today it only reports the resource that is being left
/// behind, because the platform offers no clean un-create for these
/// resources once later stages may reference them.
struct StageRecord {
    stage: &'static str,
    resource_name: String,
}

impl StageRecord {
    fn undo(&self) {
        tracing::warn!(
            "⚠️  No compensating delete for {} stage; leaving orphaned resource {}",
            self.stage,
            self.resource_name
        );
    }
}

/// Walks completed stages in reverse on a fatal failure.
fn unwind(completed: &[StageRecord]) {
    for stage in completed.iter().rev() {
        stage.undo();
    }
}

/// Creation counts of the creative stage.
#[derive(Debug, Default)]
struct CreativeCounts {
    ad_groups_attempted: usize,
    ad_groups_created: usize,
    keywords_attempted: usize,
    keywords_created: usize,
    ads_attempted: usize,
    ads_created: usize,
}

impl CreativeCounts {
    fn complete(&self) -> bool {
        self.ad_groups_created == self.ad_groups_attempted
            && self.keywords_created == self.keywords_attempted
            && self.ads_created == self.ads_attempted
    }

    fn describe_shortfall(&self) -> String {
        format!(
            "created {}/{} ad groups, {}/{} keywords, {}/{} ads",
            self.ad_groups_created,
            self.ad_groups_attempted,
            self.keywords_created,
            self.keywords_attempted,
            self.ads_created,
            self.ads_attempted
        )
    }
}

/// Provisions a campaign request as a live set of ads-platform resources.
pub struct CampaignProvisioner {
    ads: GoogleAdsClient,
    listings: ListingClient,
    site_base_url: String,
    currency_rate: f64,
    min_daily_micros: i64,
}

impl CampaignProvisioner {
    /// Creates a provisioner from configuration. Credentials are injected
    /// here; nothing reads ambient process state.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        Ok(Self {
            ads: GoogleAdsClient::new(config)?,
            listings: ListingClient::new(config)?,
            site_base_url: config.site_base_url.clone(),
            currency_rate: config.currency_rate,
            min_daily_micros: config.min_daily_budget_micros,
        })
    }

    /// Runs the full pipeline for one campaign request.
    ///
    /// Flow:
    /// 1. Validate the request (zero cost, nothing created on failure).
    /// 2. Exchange the refresh credential for a run-scoped access token.
    /// 3. Create the daily budget; fatal on failure.
    /// 4. Create the campaign referencing the resolved budget; fatal on
    ///    failure (the budget is left orphaned, see [`StageRecord::undo`]).
    /// 5. Create ad groups, keywords and ads per listing; failures here are
    ///    recorded and degrade the outcome to partial success.
    pub async fn provision(
        &self,
        request: &CampaignRequest,
    ) -> Result<ProvisioningResult, AppError> {
        request.validate()?;

        let started = Instant::now();
        tracing::info!(
            "🚀 Provisioning campaign {} ({}) with {} listing(s)",
            request.name,
            request.id,
            request.listing_ids.len()
        );

        let access_token = self.ads.fetch_access_token().await?;
        let run_timestamp = Utc::now().timestamp();

        let duration_days = budget::campaign_duration_days(request.start_date, request.end_date);
        let daily_micros = budget::daily_budget_micros(
            request.total_budget,
            self.currency_rate,
            duration_days,
            self.min_daily_micros,
        );
        tracing::info!(
            "Budget: {} over {} day(s) -> {} micros/day",
            request.total_budget,
            duration_days,
            daily_micros
        );

        let mut completed: Vec<StageRecord> = Vec::new();

        // Stage 1: budget. No campaign can exist without one.
        let budget_operation = json!({
            "create": {
                "name": format!("{} Budget {}", request.name, run_timestamp),
                "deliveryMethod": "STANDARD",
                "amountMicros": daily_micros.to_string(),
            }
        });
        let budget_resource = match self
            .create_single(&access_token, ResourceKind::CampaignBudget, budget_operation)
            .await
        {
            Ok(resource_name) => resource_name,
            Err(e) => {
                unwind(&completed);
                return Err(e);
            }
        };
        tracing::info!("✓ Budget created: {}", budget_resource);
        completed.push(StageRecord {
            stage: "budget",
            resource_name: budget_resource.clone(),
        });

        // Stage 2: campaign, referencing the resolved budget resource name.
        let campaign_operation =
            build_campaign_operation(request, &budget_resource, run_timestamp);
        let campaign_resource = match self
            .create_single(&access_token, ResourceKind::Campaign, campaign_operation)
            .await
        {
            Ok(resource_name) => resource_name,
            Err(e) => {
                unwind(&completed);
                return Err(e);
            }
        };
        tracing::info!("✓ Campaign created: {}", campaign_resource);
        completed.push(StageRecord {
            stage: "campaign",
            resource_name: campaign_resource.clone(),
        });

        // Stage 3: creative stage. Non-fatal from here on; the campaign is
        // already a usable remote object.
        let mut result = ProvisioningResult {
            campaign_id: campaign_resource.clone(),
            budget_id: budget_resource,
            ad_groups_created: 0,
            keywords_created: 0,
            ads_created: 0,
            outcome: ProvisionOutcome::Success,
            detail: None,
        };

        let snapshots = match self
            .listings
            .fetch_snapshots(&request.listing_ids)
            .await
            .context("listing lookup")
        {
            Ok(snapshots) => snapshots,
            Err(e) => {
                tracing::warn!("⚠️  Listing lookup failed, skipping creative stage: {}", e);
                result.outcome = ProvisionOutcome::PartialSuccess;
                result.detail = Some(format!("listing lookup failed: {}", e));
                return Ok(result);
            }
        };

        if snapshots.is_empty() {
            // No listings means no creatives to build; the campaign itself
            // is complete.
            tracing::info!("No listings for campaign {}, creative stage skipped", request.id);
        } else {
            match self
                .provision_creatives(
                    &access_token,
                    request,
                    &snapshots,
                    &campaign_resource,
                    run_timestamp,
                )
                .await
            {
                Ok(counts) => {
                    result.ad_groups_created = counts.ad_groups_created;
                    result.keywords_created = counts.keywords_created;
                    result.ads_created = counts.ads_created;
                    if !counts.complete() {
                        result.outcome = ProvisionOutcome::PartialSuccess;
                        result.detail = Some(counts.describe_shortfall());
                    }
                }
                Err(e) => {
                    tracing::warn!("⚠️  Creative stage failed: {}", e);
                    result.outcome = ProvisionOutcome::PartialSuccess;
                    result.detail = Some(format!("creative stage failed: {}", e));
                }
            }
        }

        tracing::info!(
            "✅ Campaign {} provisioned in {}ms ({:?}: {} ad groups, {} keywords, {} ads)",
            request.id,
            started.elapsed().as_millis(),
            result.outcome,
            result.ad_groups_created,
            result.keywords_created,
            result.ads_created
        );
        Ok(result)
    }

    /// Submits a single create-operation and extracts the resolved resource
    /// name from the response.
    async fn create_single(
        &self,
        access_token: &str,
        kind: ResourceKind,
        operation: Value,
    ) -> Result<String, AppError> {
        let response = self
            .ads
            .mutate(access_token, kind, vec![operation], false)
            .await?;

        response
            .single_resource_name()
            .map(|name| name.to_string())
            .ok_or_else(|| {
                AppError::protocol(
                    200,
                    &format!("{} mutate response missing resourceName", kind.describe()),
                )
            })
    }

    /// Creates ad groups, keyword criteria and ads for every listing.
    ///
    /// Operations are grouped by resource type into one batch call each
    /// (the platform requires same-type grouping and it keeps request
    /// counts down): all ad groups first, then all keywords referencing the
    /// resolved ad-group names, then all ads. Batches run with
    /// `partialFailure` so one bad creative cannot sink the rest.
    async fn provision_creatives(
        &self,
        access_token: &str,
        request: &CampaignRequest,
        snapshots: &[ListingSnapshot],
        campaign_resource: &str,
        run_timestamp: i64,
    ) -> Result<CreativeCounts, AppError> {
        let creatives: Vec<CreativeSet> = snapshots
            .iter()
            .map(|listing| {
                creative::build_creative(listing, &request.interests, request.id, run_timestamp)
            })
            .collect();

        let mut counts = CreativeCounts {
            ad_groups_attempted: creatives.len(),
            ..Default::default()
        };

        let ad_group_operations: Vec<Value> = creatives
            .iter()
            .map(|set| {
                json!({
                    "create": {
                        "name": set.resource_name,
                        "campaign": campaign_resource,
                        "status": "ENABLED",
                        "type": "SEARCH_STANDARD",
                        "cpcBidMicros": DEFAULT_CPC_BID_MICROS.to_string(),
                    }
                })
            })
            .collect();
        let ad_group_response = self
            .ads
            .mutate(access_token, ResourceKind::AdGroup, ad_group_operations, true)
            .await?;

        // Positional match: results come back in request order, failed
        // operations as empty entries.
        let ad_group_names: Vec<Option<String>> = creatives
            .iter()
            .enumerate()
            .map(|(i, _)| {
                ad_group_response
                    .results
                    .get(i)
                    .and_then(|r| r.resource_name.clone())
                    .filter(|name| !name.is_empty())
            })
            .collect();
        counts.ad_groups_created = ad_group_names.iter().filter(|n| n.is_some()).count();

        let mut keyword_operations: Vec<Value> = Vec::new();
        let mut ad_operations: Vec<Value> = Vec::new();
        for (set, ad_group_name) in creatives.iter().zip(ad_group_names.iter()) {
            let Some(ad_group_name) = ad_group_name else {
                // The ad group itself failed; its keywords and ad have
                // nothing to reference.
                continue;
            };

            for keyword in &set.keywords {
                keyword_operations.push(json!({
                    "create": {
                        "adGroup": ad_group_name,
                        "status": "ENABLED",
                        "keyword": {
                            "text": keyword,
                            "matchType": "BROAD",
                        }
                    }
                }));
            }

            let headlines: Vec<Value> = set
                .headlines
                .iter()
                .map(|text| json!({"text": text}))
                .collect();
            let descriptions: Vec<Value> = set
                .descriptions
                .iter()
                .map(|text| json!({"text": text}))
                .collect();
            ad_operations.push(json!({
                "create": {
                    "adGroup": ad_group_name,
                    "status": "ENABLED",
                    "ad": {
                        "finalUrls": [format!("{}/properties/{}", self.site_base_url, set.listing_id)],
                        "responsiveSearchAd": {
                            "headlines": headlines,
                            "descriptions": descriptions,
                        }
                    }
                }
            }));
        }

        counts.keywords_attempted = keyword_operations.len();
        if !keyword_operations.is_empty() {
            let keyword_response = self
                .ads
                .mutate(
                    access_token,
                    ResourceKind::AdGroupCriterion,
                    keyword_operations,
                    true,
                )
                .await?;
            counts.keywords_created = keyword_response.created_resource_names().len();
        }

        counts.ads_attempted = ad_operations.len();
        if !ad_operations.is_empty() {
            let ad_response = self
                .ads
                .mutate(access_token, ResourceKind::AdGroupAd, ad_operations, true)
                .await?;
            counts.ads_created = ad_response.created_resource_names().len();
        }

        Ok(counts)
    }
}

/// Builds the campaign create-operation. Start/end dates are compact
/// `YYYYMMDD` strings and are omitted entirely when absent; the platform
/// rejects empty date strings.
fn build_campaign_operation(
    request: &CampaignRequest,
    budget_resource: &str,
    run_timestamp: i64,
) -> Value {
    let mut create = json!({
        "name": format!("{} {}", request.name, run_timestamp),
        "campaignBudget": budget_resource,
        "advertisingChannelType": "SEARCH",
        "status": "ENABLED",
        "manualCpc": {},
        "networkSettings": {
            "targetGoogleSearch": true,
            "targetSearchNetwork": true,
            "targetContentNetwork": false,
            "targetPartnerSearchNetwork": false,
        }
    });

    if let Some(start) = request.start_date {
        create["startDate"] = json!(start.format("%Y%m%d").to_string());
    }
    if let Some(end) = request.end_date {
        create["endDate"] = json!(end.format("%Y%m%d").to_string());
    }

    json!({ "create": create })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn request_with_dates(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> CampaignRequest {
        CampaignRequest {
            id: Uuid::new_v4(),
            name: "Harbour View".to_string(),
            total_budget: 1_000.0,
            currency: None,
            target_locations: vec![],
            target_age_range: None,
            start_date: start,
            end_date: end,
            interests: vec![],
            listing_ids: vec![],
            platforms: vec![],
        }
    }

    #[test]
    fn campaign_operation_references_budget_and_formats_dates() {
        let request = request_with_dates(
            NaiveDate::from_ymd_opt(2025, 3, 1),
            NaiveDate::from_ymd_opt(2025, 3, 10),
        );
        let operation =
            build_campaign_operation(&request, "customers/1/campaignBudgets/99", 1_700_000_000);
        let create = &operation["create"];

        assert_eq!(create["campaignBudget"], "customers/1/campaignBudgets/99");
        assert_eq!(create["startDate"], "20250301");
        assert_eq!(create["endDate"], "20250310");
        assert_eq!(create["advertisingChannelType"], "SEARCH");
        assert_eq!(
            create["name"],
            format!("Harbour View {}", 1_700_000_000i64)
        );
    }

    #[test]
    fn campaign_operation_omits_absent_dates() {
        let request = request_with_dates(None, None);
        let operation =
            build_campaign_operation(&request, "customers/1/campaignBudgets/99", 7);
        let create = &operation["create"];

        assert!(create.get("startDate").is_none());
        assert!(create.get("endDate").is_none());
    }

    #[test]
    fn creative_counts_shortfall_description() {
        let counts = CreativeCounts {
            ad_groups_attempted: 2,
            ad_groups_created: 1,
            keywords_attempted: 20,
            keywords_created: 10,
            ads_attempted: 2,
            ads_created: 1,
        };
        assert!(!counts.complete());
        assert_eq!(
            counts.describe_shortfall(),
            "created 1/2 ad groups, 10/20 keywords, 1/2 ads"
        );
    }
}
