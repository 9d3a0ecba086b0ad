//! Ads Campaign Provisioning API Library
//!
//! This library provisions user-authored marketing campaigns as live
//! resource sets (budget, campaign, ad groups, keywords, ads) on the Google
//! Ads platform, on behalf of a real-estate marketplace application.
//!
//! # Modules
//!
//! - `budget`: Budget allocation (currency conversion, micros rounding).
//! - `config`: Configuration management.
//! - `creative`: Ad copy generation from listing snapshots.
//! - `errors`: Error handling types.
//! - `google_ads`: Google Ads API client (token exchange, batch mutations).
//! - `google_ads_models`: Google Ads wire models.
//! - `handlers`: HTTP request handlers.
//! - `listings`: Marketplace listing lookup client.
//! - `models`: Core data models.
//! - `provision`: The provisioning pipeline orchestrator.

pub mod budget;
pub mod config;
pub mod creative;
pub mod errors;
pub mod google_ads;
pub mod google_ads_models;
pub mod handlers;
pub mod listings;
pub mod models;
pub mod provision;
