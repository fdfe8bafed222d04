//! Error types for provider access.
//!
//! Application code works in `anyhow::Result`; these variants are wrapped
//! into it so callers that care can `downcast_ref` them.

use thiserror::Error;

use crate::services::SessionKind;

#[derive(Error, Debug)]
pub enum DataSourceError {
    /// The provider answered with a non-success HTTP status.
    #[error("provider returned status {status} for {url}")]
    Status { status: u16, url: String },

    /// No event in the season matches the requested name.
    #[error("no event matching '{name}' in {year}")]
    UnknownEvent { year: i32, name: String },

    /// The provider does not publish a classification for this session.
    #[error("session {0} is not available from this provider")]
    UnsupportedSession(SessionKind),

    /// Session code could not be parsed.
    #[error("unknown session type '{0}'")]
    UnknownSession(String),

    /// A field could not be converted into its domain type.
    #[error("invalid {field}: '{value}'")]
    InvalidField { field: &'static str, value: String },

    /// The response body was not the expected JSON.
    #[error("failed to decode provider response: {0}")]
    Decode(#[from] serde_json::Error),
}
