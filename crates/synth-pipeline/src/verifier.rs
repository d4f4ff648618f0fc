//! Storage verifier.
//!
//! Turns one `PostedRecord` into exactly one `VerificationOutcome`:
//!
//! ```text
//! decode ─► settling ─► fetching ─┬─ transport error ─► InfrastructureFailure
//!                                 ├─ 404             ─► NotFound
//!                                 ├─ other non-2xx   ─► UnexpectedStatus
//!                                 └─ 2xx ─► comparing ─┬─ equal  ─► Succeeded
//!                                                      └─ differs ─► ContentMismatch
//! ```
//!
//! The settle window is a fixed wait counted from submission time. It is
//! not a retry backoff; there is a single fetch per record.

use std::time::Duration;

use bytes::Bytes;
use http::{Request, StatusCode};
use http::header::USER_AGENT;
use http_body_util::Full;
use tracing::{debug, info, warn};

use synth_core::{MonitorConfig, OutcomeKind, PostedRecord, VerificationOutcome};

use crate::client::{self, HttpClient};

const INTERNAL_ERR: &str = "Internal error: ";

pub struct Verifier {
    client: HttpClient,
    endpoint: String,
    settle_window: Duration,
}

impl Verifier {
    pub fn new(client: HttpClient, config: &MonitorConfig) -> Self {
        Self {
            client,
            endpoint: config.storage_endpoint(),
            settle_window: config.settle_window,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn settle_window(&self) -> Duration {
        self.settle_window
    }

    /// Verify that `posted` became readable from storage, byte for byte.
    pub async fn verify(&self, posted: &PostedRecord) -> VerificationOutcome {
        let outcome = self.check(posted).await;
        if outcome.succeeded {
            info!(tid = %posted.tid, "synthetic publication verified");
        } else {
            warn!(
                tid = %posted.tid,
                kind = %outcome.kind,
                message = %outcome.message,
                "synthetic publication failed"
            );
        }
        outcome
    }

    async fn check(&self, posted: &PostedRecord) -> VerificationOutcome {
        let fail = |kind: OutcomeKind, message: String| {
            VerificationOutcome::failure(kind, posted.tid.clone(), posted.submitted_at, message)
        };

        let sent = match posted.decode_payload() {
            Ok(bytes) => bytes,
            Err(e) => {
                return fail(
                    OutcomeKind::InfrastructureFailure,
                    format!("{INTERNAL_ERR}Decoding posted image failed. {e}"),
                );
            }
        };

        let remaining = self
            .settle_window
            .saturating_sub(posted.submitted_instant.elapsed());
        debug!(tid = %posted.tid, settle = ?self.settle_window, ?remaining, "waiting for publication to settle");
        tokio::time::sleep(remaining).await;

        let req = match Request::get(self.endpoint.as_str())
            .header(USER_AGENT, client::USER_AGENT)
            .header("X-Request-Id", posted.tid.as_str())
            .body(Full::new(Bytes::new()))
        {
            Ok(req) => req,
            Err(e) => {
                return fail(
                    OutcomeKind::InfrastructureFailure,
                    format!("{INTERNAL_ERR}Building GET request to storage failed. {e}"),
                );
            }
        };

        let resp = match self.client.send(req).await {
            Ok(resp) => resp,
            Err(e) => {
                return fail(
                    OutcomeKind::InfrastructureFailure,
                    format!("{INTERNAL_ERR}Executing GET request to storage failed. {e}"),
                );
            }
        };

        match resp.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => {
                return fail(
                    OutcomeKind::NotFound,
                    "Image not found. Response status code: 404.".to_string(),
                );
            }
            status => {
                return fail(
                    OutcomeKind::UnexpectedStatus,
                    format!(
                        "GET request is not successful. Response status code: {}.",
                        status.as_u16()
                    ),
                );
            }
        }

        let received = match self.client.read_body(resp.into_body()).await {
            Ok(body) => body,
            Err(e) => {
                return fail(
                    OutcomeKind::InfrastructureFailure,
                    format!("{INTERNAL_ERR}Could not read response body. {e}"),
                );
            }
        };

        if received.as_ref() != sent.as_slice() {
            return fail(
                OutcomeKind::ContentMismatch,
                "Posted image content differs from the image in storage (content mismatch)."
                    .to_string(),
            );
        }

        VerificationOutcome::success(posted.tid.clone(), posted.submitted_at)
    }
}
