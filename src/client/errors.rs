//! Errors raised by the studio client.
//!
//! Every failure the client can produce is an [`OrchestrationApiError`];
//! callers never see a raw `reqwest` error.

use std::time::Duration;

use thiserror::Error;

/// Failure talking to the orchestration service.
#[derive(Debug, Error)]
pub enum OrchestrationApiError {
    /// The verb is not one the client speaks. Raised before any I/O.
    #[error("Unsupported HTTP method: {method}")]
    UnsupportedMethod { method: String },

    /// Connection refused, DNS failure, request timeout and the like.
    #[error("API request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-2xx status.
    #[error("API request to {url} failed: HTTP {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    /// The service answered 2xx with a body that is not JSON.
    #[error("API response from {url} is not valid JSON: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// A field the client depends on is absent from a response.
    #[error("{context}: response has no `{field}`")]
    MissingField { context: String, field: String },

    /// The run did not reach a terminal state within the wait budget.
    #[error("Crew run {job_id} did not finish within {waited:?} ({polls} status checks)")]
    Timeout {
        job_id: String,
        waited: Duration,
        polls: u32,
    },

    /// Too many status checks in a row failed.
    #[error("Gave up on run {job_id} after {failures} consecutive failed status checks: {last}")]
    PollingFailed {
        job_id: String,
        failures: u32,
        #[source]
        last: Box<OrchestrationApiError>,
    },
}

impl OrchestrationApiError {
    /// HTTP status of a non-2xx response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Body of a non-2xx response, as the service sent it.
    pub fn response_body(&self) -> Option<&str> {
        match self {
            Self::Status { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub fn missing_field(context: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingField {
            context: context.into(),
            field: field.into(),
        }
    }
}

pub type ApiResult<T> = Result<T, OrchestrationApiError>;
