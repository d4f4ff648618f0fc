//! Optional remediation run after each verification outcome.
//!
//! Remediation is a one-shot side effect kept outside the pipeline core:
//! the verify worker hands every outcome to the hook after it has been
//! queued for the history. The hook runs on its own task, so a slow or
//! stuck hook never holds up verification, and its failures are only logged.
//!
//! The bundled kubectl hook mirrors what the on-call runbook does by hand:
//!
//! | Outcome | Actions |
//! |---|---|
//! | `Succeeded` | clear the `synthetic-image-alarm` configmap |
//! | `NotFound` | restart the `image-trace` job with the failing tid, raise the alarm configmap |
//! | anything else | nothing |

use std::pin::Pin;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, error, info};

use synth_core::{OutcomeKind, VerificationOutcome};

/// Future returned by a `RemediationHook`.
pub type RemediationFuture = Pin<Box<dyn std::future::Future<Output = ()> + Send>>;

/// Callback invoked with every verification outcome.
pub type RemediationHook = Arc<dyn Fn(VerificationOutcome) -> RemediationFuture + Send + Sync>;

const ALARM_CONFIGMAP: &str = "synthetic-image-alarm";
const TID_CONFIGMAP: &str = "synthetic-tid";
const TRACE_JOB: &str = "image-trace-job";
const TRACE_CRONJOB: &str = "cronjob/image-trace";

/// Default limit for a single kubectl step.
pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(30);

/// One kubectl invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemediationStep {
    /// `kubectl <args>`.
    Run(Vec<String>),
    /// `kubectl <args>` rendered to YAML, then piped into `kubectl apply -f -`.
    Apply(Vec<String>),
}

fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

/// Steps to run for `outcome`, in order.
pub fn remediation_plan(outcome: &VerificationOutcome) -> Vec<RemediationStep> {
    match outcome.kind {
        OutcomeKind::Succeeded => vec![RemediationStep::Run(args(&[
            "delete",
            "configmap",
            ALARM_CONFIGMAP,
            "--ignore-not-found",
        ]))],
        OutcomeKind::NotFound => vec![
            RemediationStep::Run(args(&["delete", "job", TRACE_JOB, "--ignore-not-found"])),
            RemediationStep::Run(args(&[
                "delete",
                "configmap",
                TID_CONFIGMAP,
                "--ignore-not-found",
            ])),
            RemediationStep::Run(vec![
                "create".to_string(),
                "configmap".to_string(),
                TID_CONFIGMAP.to_string(),
                format!("--from-literal=TID={}", outcome.tid),
            ]),
            RemediationStep::Run(args(&[
                "create",
                "job",
                &format!("--from={TRACE_CRONJOB}"),
                TRACE_JOB,
            ])),
            RemediationStep::Apply(args(&[
                "create",
                "configmap",
                ALARM_CONFIGMAP,
                "--from-literal=alarm=true",
                "--dry-run=client",
                "-o",
                "yaml",
            ])),
        ],
        _ => Vec::new(),
    }
}

/// Runs remediation steps against the current kube context.
#[derive(Debug, Clone)]
pub struct Kubectl {
    program: String,
    step_timeout: Duration,
}

impl Default for Kubectl {
    fn default() -> Self {
        Self::new("kubectl")
    }
}

impl Kubectl {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            step_timeout: DEFAULT_STEP_TIMEOUT,
        }
    }

    /// Abandon (and kill) any step that runs longer than `timeout`.
    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = timeout;
        self
    }

    /// Run every step for `outcome`. Returns the number of steps that succeeded.
    pub async fn remediate(&self, outcome: &VerificationOutcome) -> usize {
        let plan = remediation_plan(outcome);
        if plan.is_empty() {
            return 0;
        }
        info!(tid = %outcome.tid, kind = %outcome.kind, steps = plan.len(), "running remediation");

        let mut ok = 0;
        for step in &plan {
            let step_future = async {
                match step {
                    RemediationStep::Run(args) => self.run(args).await,
                    RemediationStep::Apply(args) => self.apply(args).await,
                }
            };
            let result = tokio::time::timeout(self.step_timeout, step_future)
                .await
                .unwrap_or_else(|_| Err(format!("timed out after {:?}", self.step_timeout)));
            match result {
                Ok(()) => ok += 1,
                Err(e) => error!(?step, error = %e, "remediation step failed"),
            }
        }
        ok
    }

    async fn run(&self, args: &[String]) -> Result<(), String> {
        debug!(program = %self.program, ?args, "kubectl");
        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| e.to_string())?;
        if output.status.success() {
            Ok(())
        } else {
            Err(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ))
        }
    }

    async fn apply(&self, args: &[String]) -> Result<(), String> {
        let rendered = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| e.to_string())?;
        if !rendered.status.success() {
            return Err(format!("rendering manifest exited with {}", rendered.status));
        }

        let mut child = Command::new(&self.program)
            .args(["apply", "-f", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| e.to_string())?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(&rendered.stdout)
                .await
                .map_err(|e| e.to_string())?;
        }
        let output = child.wait_with_output().await.map_err(|e| e.to_string())?;
        if output.status.success() {
            Ok(())
        } else {
            Err(format!(
                "apply exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ))
        }
    }
}

/// Wrap a `Kubectl` runner as a `RemediationHook`.
pub fn kubectl_hook(kubectl: Kubectl) -> RemediationHook {
    let kubectl = Arc::new(kubectl);
    Arc::new(move |outcome: VerificationOutcome| -> RemediationFuture {
        let kubectl = Arc::clone(&kubectl);
        Box::pin(async move {
            kubectl.remediate(&outcome).await;
        })
    })
}
