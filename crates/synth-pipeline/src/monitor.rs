//! Monitor — wires the generator, publisher, verifier and history together.
//!
//! `MonitorBuilder::start` spawns two workers:
//!
//! - the verify worker, fed `PostedRecord`s, runs one verification per
//!   record in submission order;
//! - the history worker, fed `VerificationOutcome`s, appends them to the
//!   shared `History`.
//!
//! Both hand-offs are unbounded channels so publishing never waits on a
//! slow verification. Publish cycles themselves are serialized by a cycle
//! lock: a forced publish and a scheduled tick never interleave their
//! submissions.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use synth_core::{MonitorConfig, OutcomeKind, PostedRecord, VerificationOutcome};
use synth_history::History;
use synth_payload::PayloadGenerator;

use crate::client::HttpClient;
use crate::error::CycleError;
use crate::publisher::Publisher;
use crate::remediation::RemediationHook;
use crate::verifier::Verifier;

/// Configures and starts a `Monitor`.
pub struct MonitorBuilder {
    config: MonitorConfig,
    history: Option<Arc<History>>,
    generator: Option<PayloadGenerator>,
    remediation: Option<RemediationHook>,
}

impl MonitorBuilder {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            history: None,
            generator: None,
            remediation: None,
        }
    }

    /// Share an existing history instead of creating a fresh one.
    pub fn history(mut self, history: Arc<History>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn generator(mut self, generator: PayloadGenerator) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Run `hook` on every verification outcome, as a detached task.
    pub fn remediation(mut self, hook: RemediationHook) -> Self {
        self.remediation = Some(hook);
        self
    }

    /// Spawn the workers. Must be called inside a tokio runtime.
    pub fn start(self) -> (Monitor, MonitorWorkers) {
        let client = HttpClient::new(self.config.request_timeout);
        let publisher = Publisher::new(client.clone(), &self.config);
        let verifier = Verifier::new(client, &self.config);
        let history = self.history.unwrap_or_default();

        let (posted_tx, posted_rx) = mpsc::unbounded_channel();
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();

        let verify = tokio::spawn(run_verify_worker(
            verifier,
            posted_rx,
            outcome_tx.clone(),
            Arc::clone(&history),
            self.remediation,
        ));
        let record = tokio::spawn(run_history_worker(outcome_rx, Arc::clone(&history)));

        info!(
            ingest = %self.config.ingest_endpoint(),
            storage = %self.config.storage_endpoint(),
            settle = ?self.config.settle_window,
            "monitor started"
        );

        let monitor = Monitor {
            inner: Arc::new(Inner {
                identifier: self.config.test_uuid,
                generator: self.generator.unwrap_or_default(),
                publisher,
                history,
                posted_tx,
                outcome_tx,
                cycle: Mutex::new(()),
            }),
        };
        (monitor, MonitorWorkers { verify, record })
    }
}

/// Handles to the background workers.
pub struct MonitorWorkers {
    verify: JoinHandle<()>,
    record: JoinHandle<()>,
}

impl MonitorWorkers {
    /// Stop both workers. An in-flight verification is abandoned.
    pub fn abort(self) {
        self.verify.abort();
        self.record.abort();
        debug!("monitor workers stopped");
    }

    /// Wait for both workers to drain. They exit once every `Monitor`
    /// handle has been dropped and the queued work is done.
    pub async fn join(self) {
        report_exit("verify", self.verify.await);
        report_exit("history", self.record.await);
    }
}

/// Log how a worker ended. Returns true if it panicked.
fn report_exit(worker: &'static str, result: Result<(), JoinError>) -> bool {
    match result {
        Ok(()) => false,
        Err(e) if e.is_panic() => {
            error!(worker, error = %e, "monitor worker panicked");
            true
        }
        Err(e) => {
            debug!(worker, error = %e, "monitor worker cancelled");
            false
        }
    }
}

struct Inner {
    identifier: String,
    generator: PayloadGenerator,
    publisher: Publisher,
    history: Arc<History>,
    posted_tx: mpsc::UnboundedSender<PostedRecord>,
    outcome_tx: mpsc::UnboundedSender<VerificationOutcome>,
    cycle: Mutex<()>,
}

/// Cheap-to-clone handle driving publish cycles.
#[derive(Clone)]
pub struct Monitor {
    inner: Arc<Inner>,
}

impl Monitor {
    pub fn builder(config: MonitorConfig) -> MonitorBuilder {
        MonitorBuilder::new(config)
    }

    pub fn history(&self) -> &Arc<History> {
        &self.inner.history
    }

    pub fn identifier(&self) -> &str {
        &self.inner.identifier
    }

    /// Run one publish cycle: generate, submit, and queue verification.
    ///
    /// Returns the correlation token once ingestion accepted the record.
    /// Generation and submission failures are recorded as failed outcomes
    /// before the error is returned; verification continues in the
    /// background either way.
    pub async fn publish_once(&self) -> Result<String, CycleError> {
        let _cycle = self.inner.cycle.lock().await;

        let record = match self.inner.generator.generate(&self.inner.identifier) {
            Ok(record) => record,
            Err(e) => {
                error!(error = %e, "synthetic record generation failed");
                self.emit(VerificationOutcome::failure(
                    OutcomeKind::GenerationFailed,
                    String::new(),
                    Utc::now(),
                    e.to_string(),
                ));
                return Err(e.into());
            }
        };

        let posted = match self.inner.publisher.publish(&record).await {
            Ok(posted) => posted,
            Err(e) => {
                self.emit(VerificationOutcome::failure(
                    OutcomeKind::SubmissionFailed,
                    e.tid.clone(),
                    e.submitted_at,
                    e.to_string(),
                ));
                return Err(e.into());
            }
        };

        let tid = posted.tid.clone();
        if let Err(mpsc::error::SendError(posted)) = self.inner.posted_tx.send(posted) {
            error!(%tid, "verify worker is gone; recording cycle as failed");
            self.emit(VerificationOutcome::failure(
                OutcomeKind::InfrastructureFailure,
                posted.tid,
                posted.submitted_at,
                "Internal error: verification worker unavailable.",
            ));
        } else {
            debug!(%tid, "queued for verification");
        }
        Ok(tid)
    }

    /// Publish immediately, then once per `interval` until `shutdown` fires.
    pub async fn run_ticker(&self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        info!(interval_secs = interval.as_secs(), "publish ticker started");

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.publish_once().await {
                        warn!(error = %e, "scheduled publish failed");
                    }
                }
                _ = shutdown.changed() => {
                    info!("publish ticker shutting down");
                    break;
                }
            }
        }
    }

    /// Spawn `run_ticker` on the runtime.
    pub fn spawn_ticker(
        &self,
        interval: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let monitor = self.clone();
        tokio::spawn(async move { monitor.run_ticker(interval, shutdown).await })
    }

    fn emit(&self, outcome: VerificationOutcome) {
        emit(&self.inner.outcome_tx, &self.inner.history, outcome);
    }
}

/// Hand `outcome` to the history worker, or record it directly if the
/// worker is gone, so no cycle is lost.
fn emit(
    tx: &mpsc::UnboundedSender<VerificationOutcome>,
    history: &History,
    outcome: VerificationOutcome,
) {
    if let Err(mpsc::error::SendError(outcome)) = tx.send(outcome) {
        warn!(tid = %outcome.tid, "history worker is gone; recording directly");
        history.record(outcome);
    }
}

async fn run_verify_worker(
    verifier: Verifier,
    mut posted_rx: mpsc::UnboundedReceiver<PostedRecord>,
    outcome_tx: mpsc::UnboundedSender<VerificationOutcome>,
    history: Arc<History>,
    remediation: Option<RemediationHook>,
) {
    debug!("verify worker starting");
    while let Some(posted) = posted_rx.recv().await {
        let outcome = verifier.verify(&posted).await;
        match remediation {
            // Detached so a stuck hook never delays the next verification.
            Some(ref hook) => {
                emit(&outcome_tx, &history, outcome.clone());
                tokio::spawn(hook(outcome));
            }
            None => emit(&outcome_tx, &history, outcome),
        }
    }
    debug!("verify worker stopped");
}

async fn run_history_worker(
    mut outcome_rx: mpsc::UnboundedReceiver<VerificationOutcome>,
    history: Arc<History>,
) {
    debug!("history worker starting");
    while let Some(outcome) = outcome_rx.recv().await {
        history.record(outcome);
    }
    debug!("history worker stopped");
}
