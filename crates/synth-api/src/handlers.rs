//! Route handlers.

use std::fmt::Write as _;

use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use synth_core::VerificationOutcome;

use crate::ApiState;

pub const SYSTEM_CODE: &str = "synth-image-pub-monitor";
const BUSINESS_IMPACT: &str = "Image publication doesn't work";

/// Health document returned by `/__health`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthDocument {
    pub schema_version: u32,
    pub system_code: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub ok: bool,
    pub checks: Vec<HealthCheck>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheck {
    pub id: &'static str,
    pub name: &'static str,
    pub ok: bool,
    pub severity: u8,
    pub business_impact: &'static str,
    pub technical_summary: &'static str,
    pub panic_guide: &'static str,
    pub check_output: String,
    pub last_updated: String,
}

/// Pass/fail of the latest outcome, with a one-line explanation.
fn latest_publication_status(latest: Option<&VerificationOutcome>) -> (bool, String) {
    match latest {
        Some(outcome) if !outcome.succeeded => {
            (false, format!("Publication failed. {}", outcome.message))
        }
        _ => (true, "Ok".to_string()),
    }
}

/// GET /__health
pub async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let latest = state.monitor.history().latest();
    let (ok, output) = latest_publication_status(latest.as_ref());

    Json(HealthDocument {
        schema_version: 1,
        system_code: SYSTEM_CODE,
        name: "Synthetic publication monitor",
        description: "End-to-end image publication & monitor",
        ok,
        checks: vec![HealthCheck {
            id: "synthetic-image-publication",
            name: "End-to-end test of image publication",
            ok,
            severity: 1,
            business_impact: BUSINESS_IMPACT,
            technical_summary:
                "Lots of things could have gone wrong. Check the /history endpoint for more info",
            panic_guide: "Check the /history endpoint, then the ingestion and storage services",
            check_output: output,
            last_updated: Utc::now().to_rfc3339(),
        }],
    })
}

/// GET /__gtg
pub async fn good_to_go(State(state): State<ApiState>) -> impl IntoResponse {
    let headers = [
        (CONTENT_TYPE, "text/plain; charset=utf-8"),
        (CACHE_CONTROL, "no-cache"),
    ];
    if state.monitor.history().is_healthy() {
        (StatusCode::OK, headers, "OK")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, headers, BUSINESS_IMPACT)
    }
}

/// Render outcomes, numbered from the most recent.
pub fn render_history(recent_first: &[VerificationOutcome]) -> String {
    let mut out = String::new();
    for (i, outcome) in recent_first.iter().enumerate() {
        let _ = write!(
            out,
            "{}. {{ Date: {}, Tid: {}, Succeeded: {}, Message: {}}}\n\n",
            i + 1,
            outcome.time.to_rfc3339(),
            outcome.tid,
            outcome.succeeded,
            outcome.message,
        );
    }
    out
}

/// GET /history
pub async fn history(State(state): State<ApiState>) -> impl IntoResponse {
    info!("history request");
    let body = render_history(&state.monitor.history().recent_first());
    (
        StatusCode::OK,
        [(CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
}

/// POST /forcePublish
pub async fn force_publish(State(state): State<ApiState>) -> impl IntoResponse {
    info!("force publish");
    match state.monitor.publish_once().await {
        Ok(tid) => (
            StatusCode::OK,
            format!("Force publish succeeded. Verification pending for TID: {tid}"),
        ),
        Err(e) => {
            warn!(error = %e, "force publish failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Force publish failed. {e}"),
            )
        }
    }
}
