use serde::Deserialize;

use crate::budget::{CENT_MICROS, DEFAULT_MIN_DAILY_MICROS};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub google_client_id: String,
    pub google_client_secret: String,
    pub google_refresh_token: String,
    pub google_developer_token: String,
    pub google_login_customer_id: Option<String>, // Manager account, optional
    pub google_customer_id: String,
    pub oauth_base_url: String,
    pub ads_base_url: String,
    pub listing_api_base_url: String,
    pub listing_api_key: String,
    pub site_base_url: String,
    pub currency_rate: f64,
    pub min_daily_budget_micros: i64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            google_client_id: required_var("GOOGLE_ADS_CLIENT_ID")?,
            google_client_secret: required_var("GOOGLE_ADS_CLIENT_SECRET")?,
            google_refresh_token: required_var("GOOGLE_ADS_REFRESH_TOKEN")?,
            google_developer_token: required_var("GOOGLE_ADS_DEVELOPER_TOKEN")?,
            google_login_customer_id: std::env::var("GOOGLE_ADS_LOGIN_CUSTOMER_ID")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(|s| normalize_customer_id(&s)),
            google_customer_id: required_var("GOOGLE_ADS_CUSTOMER_ID")
                .map(|s| normalize_customer_id(&s))
                .and_then(|id| {
                    if id.is_empty() {
                        anyhow::bail!("GOOGLE_ADS_CUSTOMER_ID must contain digits");
                    }
                    Ok(id)
                })?,
            oauth_base_url: url_var_or(
                "GOOGLE_OAUTH_BASE_URL",
                "https://oauth2.googleapis.com",
            )?,
            ads_base_url: url_var_or("GOOGLE_ADS_BASE_URL", "https://googleads.googleapis.com")?,
            listing_api_base_url: required_var("LISTING_API_BASE_URL").and_then(|url| {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    anyhow::bail!("LISTING_API_BASE_URL must start with http:// or https://");
                }
                Ok(url)
            })?,
            listing_api_key: required_var("LISTING_API_KEY")?,
            site_base_url: required_var("SITE_BASE_URL").and_then(|url| {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    anyhow::bail!("SITE_BASE_URL must start with http:// or https://");
                }
                Ok(url.trim_end_matches('/').to_string())
            })?,
            currency_rate: required_var("CURRENCY_RATE")
                .and_then(|raw| {
                    raw.parse::<f64>()
                        .map_err(|_| anyhow::anyhow!("CURRENCY_RATE must be a number"))
                })
                .and_then(|rate| {
                    if !rate.is_finite() || rate <= 0.0 {
                        anyhow::bail!("CURRENCY_RATE must be greater than zero");
                    }
                    Ok(rate)
                })?,
            min_daily_budget_micros: match std::env::var("MIN_DAILY_BUDGET_MICROS") {
                Ok(raw) => parse_min_daily_micros(&raw)?,
                Err(_) => DEFAULT_MIN_DAILY_MICROS,
            },
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Ads API base URL: {}", config.ads_base_url);
        tracing::debug!("OAuth base URL: {}", config.oauth_base_url);
        tracing::debug!("Listing API base URL: {}", config.listing_api_base_url);
        tracing::debug!("Target customer ID: {}", config.google_customer_id);
        if let Some(ref manager) = config.google_login_customer_id {
            tracing::info!("Acting through manager account: {}", manager);
        }
        tracing::debug!("Currency rate: {}", config.currency_rate);
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}

/// Reads a required, non-empty environment variable.
fn required_var(name: &str) -> anyhow::Result<String> {
    std::env::var(name)
        .map_err(|_| anyhow::anyhow!("{} environment variable required", name))
        .and_then(|value| {
            if value.trim().is_empty() {
                anyhow::bail!("{} cannot be empty", name);
            }
            Ok(value)
        })
}

/// Reads an optional URL variable, falling back to a default, and validates
/// the scheme prefix.
fn url_var_or(name: &str, default: &str) -> anyhow::Result<String> {
    let url = std::env::var(name).unwrap_or_else(|_| default.to_string());
    if !url.starts_with("http://") && !url.starts_with("https://") {
        anyhow::bail!("{} must start with http:// or https://", name);
    }
    Ok(url.trim_end_matches('/').to_string())
}

/// Parses the daily-spend floor. The floor is applied after the allocator
/// floors amounts to the cent, so it must itself be a whole-cent value or
/// clamped budgets come out at amounts the platform rejects.
fn parse_min_daily_micros(raw: &str) -> anyhow::Result<i64> {
    let value = raw
        .parse::<i64>()
        .map_err(|_| anyhow::anyhow!("MIN_DAILY_BUDGET_MICROS must be an integer"))?;
    if value < 0 {
        anyhow::bail!("MIN_DAILY_BUDGET_MICROS cannot be negative");
    }
    if value % CENT_MICROS != 0 {
        anyhow::bail!(
            "MIN_DAILY_BUDGET_MICROS must be a multiple of {} micros (one cent)",
            CENT_MICROS
        );
    }
    Ok(value)
}

/// Strips the dashes Google uses in displayed customer ids ("123-456-7890").
fn normalize_customer_id(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}
