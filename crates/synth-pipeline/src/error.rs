//! Pipeline error types.

use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

use synth_payload::GenerateError;

/// Failures below the HTTP status level.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid request: {0}")]
    Request(#[from] http::Error),

    #[error("request failed: {0}")]
    Send(#[from] hyper_util::client::legacy::Error),

    #[error("reading response body failed: {0}")]
    Body(#[from] hyper::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

/// Why a submission to ingestion did not succeed.
#[derive(Debug, Error)]
pub enum PublishFailure {
    #[error("JSON marshalling failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("could not post data to ingestion: {0}")]
    Transport(#[from] TransportError),

    #[error(
        "Publishing failed at first step: could not post data to CMS notifier. Status code: {0}"
    )]
    Status(u16),
}

/// A failed submission, tagged with the attempt it belongs to.
#[derive(Debug, Error)]
#[error("{reason}")]
pub struct PublishError {
    pub tid: String,
    pub submitted_at: DateTime<Utc>,
    #[source]
    pub reason: PublishFailure,
}

/// A publish cycle that ended before anything reached the verifier.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("generating synthetic record failed: {0}")]
    Generate(#[from] GenerateError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}
