use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Maximum number of characters of a remote response body kept in a
/// `Protocol` error. Bodies beyond this are cut off so a misbehaving
/// upstream cannot flood the logs.
pub const BODY_PREFIX_MAX_CHARS: usize = 512;

/// Application-specific error types.
///
/// These are the four outcome kinds the provisioning pipeline distinguishes:
/// credential exchange failures, local validation failures, explicit remote
/// rejections, and responses we could not interpret at all.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Token exchange with the ads platform failed. No mutations were issued.
    Auth(String),
    /// The campaign request was rejected locally, before any remote call.
    Validation(String),
    /// The remote platform refused one or more operations.
    RemoteRejected(String),
    /// An upstream service answered with something we could not interpret.
    Protocol {
        /// HTTP status of the response (0 when the request never completed).
        status: u16,
        /// Bounded prefix of the raw body, for diagnosis.
        body_prefix: String,
    },
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl AppError {
    /// Builds a `Protocol` error, truncating the body to a bounded prefix
    /// (UTF-8 safe, character based).
    pub fn protocol(status: u16, body: &str) -> Self {
        let body_prefix: String = body.chars().take(BODY_PREFIX_MAX_CHARS).collect();
        AppError::Protocol {
            status,
            body_prefix,
        }
    }
}

impl fmt::Display for AppError {
    /// Formats the error for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Auth(msg) => write!(f, "Authentication error: {}", msg),
            AppError::Validation(msg) => write!(f, "Validation error: {}", msg),
            AppError::RemoteRejected(msg) => write!(f, "Remote platform rejected: {}", msg),
            AppError::Protocol {
                status,
                body_prefix,
            } => write!(
                f,
                "Protocol error: unexpected response (status {}): {}",
                status, body_prefix
            ),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl IntoResponse for AppError {
    /// Converts the error into an HTTP response.
    ///
    /// `Validation` maps to 400 since it is a caller problem; everything else
    /// reflects an upstream failure and maps to 502. Full detail is logged,
    /// the response body carries the human-readable message.
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::Auth(msg) => {
                tracing::error!("Ads platform authentication failed: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    format!("Authentication error: {}", msg),
                )
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::RemoteRejected(msg) => {
                tracing::error!("Remote platform rejected operation: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    format!("Remote platform rejected: {}", msg),
                )
            }
            AppError::Protocol {
                status,
                body_prefix,
            } => {
                tracing::error!(
                    "Unexpected upstream response (status {}): {}",
                    status,
                    body_prefix
                );
                (
                    StatusCode::BAD_GATEWAY,
                    "Unexpected upstream response".to_string(),
                )
            }
            AppError::WithContext { source, context } => {
                // Log full context chain for debugging
                tracing::error!("Error with context: {} -> {}", context, source);
                // Delegate to underlying error's response
                return source.clone().into_response();
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    /// Converts a transport-level `reqwest::Error` into an `AppError`.
    ///
    /// A request that never produced a readable response is a protocol
    /// failure with status 0, not a remote rejection.
    fn from(err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16()).unwrap_or(0);
        AppError::protocol(status, &err.to_string())
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    ///
    /// # Arguments
    ///
    /// * `context` - The context message to add.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Add context lazily (only evaluated on error).
    ///
    /// # Arguments
    ///
    /// * `f` - A closure that produces the context message.
    #[allow(dead_code)]
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}
