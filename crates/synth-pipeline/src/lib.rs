//! synth-pipeline — the publish → verify → record pipeline.
//!
//! # Architecture
//!
//! ```text
//! Monitor
//!   ├── ticker task / forced publish
//!   │   └── publish_once() ─ cycle lock ─┐
//!   │       ├── PayloadGenerator         │
//!   │       └── Publisher (POST /notify) │
//!   ├── verify worker  ◄── mpsc<PostedRecord>
//!   │   ├── Verifier (settle, GET /{uuid}, byte compare)
//!   │   └── optional RemediationHook
//!   └── history worker ◄── mpsc<VerificationOutcome>
//!       └── History::record()
//! ```
//!
//! Submission and generation failures skip the verify worker and go
//! straight to the history worker. Every cycle ends in exactly one
//! recorded outcome.

pub mod client;
pub mod error;
pub mod monitor;
pub mod publisher;
pub mod remediation;
pub mod verifier;

pub use client::HttpClient;
pub use error::{CycleError, PublishError, PublishFailure, TransportError};
pub use monitor::{Monitor, MonitorBuilder, MonitorWorkers};
pub use publisher::{Publisher, new_tid};
pub use remediation::{
    Kubectl, RemediationFuture, RemediationHook, RemediationStep, kubectl_hook, remediation_plan,
};
pub use verifier::Verifier;
