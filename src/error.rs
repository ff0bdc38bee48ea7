//! Error taxonomy for query resolution.
//!
//! Every variant has a fixed user-facing rendering ([`QueryError::user_message`]).
//! The resolver converts errors into that text at its boundary, so callers
//! always get something displayable back.

use std::fmt;
use thiserror::Error;

/// Which input a [`QueryError::DataUnavailable`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Spreadsheet,
    Document,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Spreadsheet => write!(f, "notification spreadsheet"),
            DataSource::Document => write!(f, "building code document"),
        }
    }
}

/// Failure of the language model service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No client was created at startup (credential missing or bad config).
    #[error("language model client is not configured")]
    NotConfigured,
    #[error("credential environment variable {0} is not set")]
    MissingCredential(String),
    #[error("request to language model failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("language model API error {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid language model response: {0}")]
    InvalidResponse(String),
}

impl ServiceError {
    /// True when the client never came up, as opposed to a call that failed.
    pub fn is_unconfigured(&self) -> bool {
        matches!(
            self,
            ServiceError::NotConfigured | ServiceError::MissingCredential(_)
        )
    }
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("{input} unavailable: {reason}")]
    DataUnavailable { input: DataSource, reason: String },
    #[error(transparent)]
    ServiceUnavailable(#[from] ServiceError),
    #[error("no address matching '{address}' at threshold {threshold}")]
    NoMatch { address: String, threshold: f64 },
    #[error("query is empty")]
    EmptyQuery,
}

pub const MSG_EMPTY_QUERY: &str = "Please type a query before submitting.";
pub const MSG_RECORDS_UNAVAILABLE: &str = "Notification data is not available for consultation.";
pub const MSG_DOCUMENT_UNAVAILABLE: &str = "The building code is not available for consultation.";
pub const MSG_SERVICE_UNAVAILABLE: &str = "The AI service is not available at the moment.";
pub const MSG_NO_MATCH: &str = "No notification found for the given address.";

impl QueryError {
    pub fn data_unavailable(input: DataSource, reason: impl Into<String>) -> Self {
        QueryError::DataUnavailable {
            input,
            reason: reason.into(),
        }
    }

    /// Machine-readable code, used as the HTTP `outcome` field.
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::DataUnavailable { .. } => "data_unavailable",
            QueryError::ServiceUnavailable(_) => "service_unavailable",
            QueryError::NoMatch { .. } => "no_match",
            QueryError::EmptyQuery => "empty_query",
        }
    }

    /// The advisory text shown to staff in place of an answer.
    pub fn user_message(&self) -> String {
        match self {
            QueryError::EmptyQuery => MSG_EMPTY_QUERY.to_string(),
            QueryError::DataUnavailable {
                input: DataSource::Spreadsheet,
                ..
            } => MSG_RECORDS_UNAVAILABLE.to_string(),
            QueryError::DataUnavailable {
                input: DataSource::Document,
                ..
            } => MSG_DOCUMENT_UNAVAILABLE.to_string(),
            QueryError::NoMatch { .. } => MSG_NO_MATCH.to_string(),
            QueryError::ServiceUnavailable(e) if e.is_unconfigured() => {
                MSG_SERVICE_UNAVAILABLE.to_string()
            }
            QueryError::ServiceUnavailable(e) => format!("Error processing the query: {}", e),
        }
    }
}
