//! Single-foundation deployment flow.
//!
//! Drives a [`Pusher`] through one complete attempt: login, push, then
//! either delete the venerable app or roll back, and always clean up.
//! Whether a venerable app exists is taken from what the push's rename
//! actually did.

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::courier::Courier;
use crate::deployment::{DeployState, DeploymentInfo};
use crate::error::DeployError;
use crate::pusher::Pusher;

/// Summary of one deployment attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployReport {
    pub app: String,
    pub foundation: String,
    /// Last protocol state reached.
    pub state: DeployState,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Platform logs fetched while handling a failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<String>,
    /// Best-effort steps that did not succeed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl DeployReport {
    fn start(app: &str, foundation: &str) -> Self {
        let now = Utc::now();
        Self {
            app: app.to_string(),
            foundation: foundation.to_string(),
            state: DeployState::Initial,
            started_at: now,
            finished_at: now,
            logs: None,
            warnings: Vec::new(),
        }
    }

    fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self
    }
}

/// A failed deployment attempt together with what was recorded about it.
#[derive(Debug, thiserror::Error)]
#[error(
    "deployment of {} to {} failed ({})",
    .report.app,
    .report.foundation,
    .report.state
)]
pub struct DeployFailure {
    pub report: Box<DeployReport>,
    #[source]
    pub source: DeployError,
}

/// Runs complete blue-green deployments against one foundation at a time.
#[derive(Debug)]
pub struct Deployer<C> {
    pusher: Pusher<C>,
}

impl<C: Courier> Deployer<C> {
    pub fn new(courier: C) -> Self {
        Self {
            pusher: Pusher::new(courier),
        }
    }

    /// Deploy the staged app at `app_path` to `foundation_url`.
    ///
    /// Courier resources are released whether or not the deploy succeeds.
    /// A cleanup failure fails an otherwise successful deploy; after a
    /// failed deploy it is only recorded as a warning.
    pub fn deploy(
        &self,
        foundation_url: &str,
        app_path: &Path,
        info: &DeploymentInfo,
        out: &mut impl Write,
    ) -> Result<DeployReport, DeployFailure> {
        let mut report = DeployReport::start(&info.app_name, foundation_url);
        let span = tracing::info_span!("deploy", app = %info.app_name, foundation = foundation_url);
        let _guard = span.enter();

        let outcome = self.run(foundation_url, app_path, info, out, &mut report);
        let clean_up = self.pusher.clean_up();

        match (outcome, clean_up) {
            (Ok(()), Ok(())) => {
                tracing::info!(state = %report.state, "deployment finished");
                Ok(report.finish())
            }
            (Ok(()), Err(source)) => Err(fail(report, source)),
            (Err(source), clean_up) => {
                if let Err(err) = clean_up {
                    tracing::warn!(error = %err, "clean up failed after failed deployment");
                    report.warnings.push(format!("clean up failed: {}", err));
                }
                Err(fail(report, source))
            }
        }
    }

    fn run(
        &self,
        foundation_url: &str,
        app_path: &Path,
        info: &DeploymentInfo,
        out: &mut impl Write,
        report: &mut DeployReport,
    ) -> Result<(), DeployError> {
        if let Err(e) = info.validate() {
            report.state = DeployState::Failed;
            return Err(DeployError::InvalidDeployment {
                reason: e.to_string(),
            });
        }

        if let Err(err) = self.pusher.login(foundation_url, info, out) {
            report.state = DeployState::Failed;
            return Err(err);
        }

        let parked = match self.pusher.push(app_path, &info.domain, info, out) {
            Ok(state) => state,
            Err(err) => {
                report.logs = err
                    .logs()
                    .map(|logs| String::from_utf8_lossy(logs).into_owned());
                report.state = match err.first_deploy() {
                    Some(first_deploy) => {
                        let rollback = self.pusher.rollback(info, first_deploy);
                        report.warnings.extend(rollback.warnings);
                        DeployState::RolledBack
                    }
                    None => DeployState::Failed,
                };
                return Err(err);
            }
        };
        report.state = DeployState::RouteBound;

        // A first deploy parks nothing, so there is no venerable app to remove
        if parked == DeployState::VenerableCreated {
            self.pusher.delete_venerable(info, foundation_url)?;
        }
        report.state = DeployState::Completed;
        Ok(())
    }
}

fn fail(report: DeployReport, source: DeployError) -> DeployFailure {
    tracing::error!(state = %report.state, error = %source, "deployment failed");
    DeployFailure {
        report: Box::new(report.finish()),
        source,
    }
}
