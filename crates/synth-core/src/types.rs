//! Records that flow through the monitoring pipeline.
//!
//! A `SyntheticRecord` is built per cycle and posted to ingestion. A
//! successful post produces a `PostedRecord`, which the verifier consumes
//! exactly once and turns into a `VerificationOutcome`.

use std::fmt;
use std::time::Instant;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Length of the random payload carried by every synthetic record.
pub const PAYLOAD_LEN: usize = 1000;

/// Logical type tag of every synthetic record.
pub const IMAGE_KIND: &str = "Image";

/// Prefix of every correlation token.
pub const TID_PREFIX: &str = "SYNTHETIC-REQ-MON_";

// ── SyntheticRecord ────────────────────────────────────────────────

/// A synthetic image record in the ingestion wire format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyntheticRecord {
    /// Stable correlation key for this monitor deployment.
    #[serde(rename = "uuid")]
    pub identifier: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Base64 (standard alphabet) encoding of the random payload.
    #[serde(rename = "value")]
    pub payload: String,
    pub attributes: String,
    pub workflow_status: String,
    pub system_attributes: String,
    pub usage_tickets: String,
    /// Always empty for synthetic records.
    pub linked_objects: Vec<serde_json::Value>,
}

impl SyntheticRecord {
    /// Decode the payload back into raw bytes.
    pub fn payload_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.payload)
    }
}

/// Encode raw payload bytes for transit.
pub fn encode_payload(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

// ── PostedRecord ───────────────────────────────────────────────────

/// A record accepted by ingestion, awaiting verification.
#[derive(Debug, Clone)]
pub struct PostedRecord {
    /// Correlation token sent as `X-Request-Id`.
    pub tid: String,
    /// Wall-clock time the publish attempt began.
    pub submitted_at: DateTime<Utc>,
    /// Monotonic time the publish attempt began; the settle window counts from here.
    pub submitted_instant: Instant,
    /// Payload exactly as submitted (base64).
    pub payload: String,
}

impl PostedRecord {
    pub fn decode_payload(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.payload)
    }
}

// ── VerificationOutcome ────────────────────────────────────────────

/// Terminal classification of one monitoring cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// The stored object matched the submitted payload.
    Succeeded,
    /// Metadata rendering failed; nothing was submitted.
    GenerationFailed,
    /// Ingestion rejected the record or could not be reached.
    SubmissionFailed,
    /// Fetching or reading the stored object failed below HTTP status level.
    InfrastructureFailure,
    /// Storage answered 404 after the settle window.
    NotFound,
    /// Storage answered with a non-success status other than 404.
    UnexpectedStatus,
    /// Storage returned different bytes than were submitted.
    ContentMismatch,
}

impl OutcomeKind {
    pub fn label(&self) -> &'static str {
        match self {
            OutcomeKind::Succeeded => "succeeded",
            OutcomeKind::GenerationFailed => "generation failed",
            OutcomeKind::SubmissionFailed => "submission failed",
            OutcomeKind::InfrastructureFailure => "internal error",
            OutcomeKind::NotFound => "not found",
            OutcomeKind::UnexpectedStatus => "unexpected status",
            OutcomeKind::ContentMismatch => "content mismatch",
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One entry of the rolling history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    /// Submission time of the cycle this outcome belongs to.
    pub time: DateTime<Utc>,
    /// Correlation token; empty when the cycle failed before one was minted.
    pub tid: String,
    pub succeeded: bool,
    pub kind: OutcomeKind,
    /// Empty when `succeeded`.
    pub message: String,
}

impl VerificationOutcome {
    pub fn success(tid: impl Into<String>, time: DateTime<Utc>) -> Self {
        Self {
            time,
            tid: tid.into(),
            succeeded: true,
            kind: OutcomeKind::Succeeded,
            message: String::new(),
        }
    }

    /// Build a failed outcome. `kind` must not be `Succeeded`.
    pub fn failure(
        kind: OutcomeKind,
        tid: impl Into<String>,
        time: DateTime<Utc>,
        message: impl Into<String>,
    ) -> Self {
        debug_assert_ne!(kind, OutcomeKind::Succeeded);
        Self {
            time,
            tid: tid.into(),
            succeeded: false,
            kind,
            message: message.into(),
        }
    }
}
