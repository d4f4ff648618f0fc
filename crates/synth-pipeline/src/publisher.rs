//! Ingestion publisher.
//!
//! Posts a synthetic record to the ingestion endpoint. A 2xx answer
//! yields the `PostedRecord` the verifier consumes; anything else is a
//! terminal submission failure for the cycle. No retries here: the next
//! cycle is the retry.

use std::time::Instant;

use bytes::Bytes;
use chrono::Utc;
use http::Request;
use http::header::{AUTHORIZATION, CONTENT_TYPE, HOST, USER_AGENT};
use http_body_util::Full;
use rand::Rng;
use rand::distr::Alphanumeric;
use tracing::{debug, warn};

use synth_core::{MonitorConfig, PostedRecord, SyntheticRecord, TID_PREFIX};

use crate::client::{self, HttpClient};
use crate::error::{PublishError, PublishFailure, TransportError};

/// Origin system the ingestion side expects synthetic images to come from.
pub const ORIGIN_SYSTEM_ID: &str = "methode-web-pub";

const TID_SUFFIX_LEN: usize = 10;

/// Mint a fresh per-attempt correlation token.
pub fn new_tid() -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TID_SUFFIX_LEN)
        .map(char::from)
        .collect();
    format!("{TID_PREFIX}{suffix}")
}

pub struct Publisher {
    client: HttpClient,
    endpoint: String,
    credentials: Option<String>,
    host_header: Option<String>,
}

impl Publisher {
    pub fn new(client: HttpClient, config: &MonitorConfig) -> Self {
        Self {
            client,
            endpoint: config.ingest_endpoint(),
            credentials: config.ingest_credentials.clone(),
            host_header: config.ingest_host_header.clone(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Submit `record` to ingestion.
    pub async fn publish(&self, record: &SyntheticRecord) -> Result<PostedRecord, PublishError> {
        let submitted_at = Utc::now();
        let submitted_instant = Instant::now();
        let tid = new_tid();

        match self.submit(record, &tid).await {
            Ok(()) => {
                debug!(%tid, endpoint = %self.endpoint, "synthetic record accepted by ingestion");
                Ok(PostedRecord {
                    tid,
                    submitted_at,
                    submitted_instant,
                    payload: record.payload.clone(),
                })
            }
            Err(reason) => {
                warn!(%tid, endpoint = %self.endpoint, error = %reason, "publish failed");
                Err(PublishError {
                    tid,
                    submitted_at,
                    reason,
                })
            }
        }
    }

    async fn submit(&self, record: &SyntheticRecord, tid: &str) -> Result<(), PublishFailure> {
        let body = serde_json::to_vec(record)?;

        let mut builder = Request::post(self.endpoint.as_str())
            .header("X-Request-Id", tid)
            .header("X-Origin-System-Id", ORIGIN_SYSTEM_ID)
            .header(CONTENT_TYPE, "application/json")
            .header(USER_AGENT, client::USER_AGENT);
        if let Some(ref credentials) = self.credentials {
            builder = builder.header(AUTHORIZATION, credentials.as_str());
        }
        if let Some(ref host) = self.host_header {
            builder = builder.header(HOST, host.as_str());
        }
        let req = builder
            .body(Full::new(Bytes::from(body)))
            .map_err(TransportError::from)?;

        let resp = self.client.send(req).await?;
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(PublishFailure::Status(status.as_u16()))
        }
    }
}
