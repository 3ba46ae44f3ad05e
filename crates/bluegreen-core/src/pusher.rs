//! Blue-green push protocol against a single foundation.
//!
//! A push parks the live app under its venerable name, pushes the new bits
//! under the live name and binds the route. The venerable app keeps serving
//! until the new one is routable. After that the caller either deletes the
//! venerable app or rolls back.
//!
//! Callers must serialize all calls for the same application name.

use std::io::Write;
use std::path::Path;

use crate::courier::{Courier, CourierError};
use crate::deployment::{DeployState, DeploymentInfo};
use crate::error::DeployError;

/// Outcome of the best-effort rollback steps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RollbackReport {
    /// The half-deployed app was deleted.
    pub deleted: bool,
    /// The venerable app was renamed back. `None` on a first deploy.
    pub restored: Option<bool>,
    pub warnings: Vec<String>,
}

impl RollbackReport {
    /// Whether every attempted step succeeded.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Runs deployment steps through a [`Courier`].
#[derive(Debug)]
pub struct Pusher<C> {
    courier: C,
}

impl<C: Courier> Pusher<C> {
    pub fn new(courier: C) -> Self {
        Self { courier }
    }

    /// Log into a foundation and target the org and space.
    ///
    /// Raw login output always goes to `out`.
    pub fn login(
        &self,
        foundation_url: &str,
        info: &DeploymentInfo,
        out: &mut impl Write,
    ) -> Result<(), DeployError> {
        tracing::debug!(
            foundation = foundation_url,
            username = %info.username,
            org = %info.org,
            space = %info.space,
            "logging into cloud foundry"
        );

        let result = self.courier.login(
            foundation_url,
            &info.username,
            &info.password,
            &info.org,
            &info.space,
            info.skip_ssl,
        );
        write_output(out, output_of(&result));
        if let Err(source) = result {
            return Err(DeployError::Login {
                url: foundation_url.to_string(),
                source,
            });
        }

        tracing::info!(foundation = foundation_url, "logged into cloud foundry");
        Ok(())
    }

    /// Push a new version of the app at `app_path` and bind it to `domain`.
    ///
    /// Returns the state the rename step reached: [`DeployState::FirstDeploy`]
    /// when no live app was parked, [`DeployState::VenerableCreated`]
    /// otherwise. On failure the returned error carries recent platform logs
    /// when they could be fetched, see [`DeployError::logs`], and the same
    /// classification through [`DeployError::first_deploy`].
    pub fn push(
        &self,
        app_path: &Path,
        domain: &str,
        info: &DeploymentInfo,
        out: &mut impl Write,
    ) -> Result<DeployState, DeployError> {
        let app = info.app_name.as_str();
        let venerable = info.venerable_name();

        let state = match self.courier.rename(app, &venerable) {
            Ok(_) => {
                tracing::info!(app, venerable = %venerable, "renamed app");
                DeployState::VenerableCreated
            }
            Err(err) => {
                if self.courier.exists(app) {
                    tracing::error!(app, error = %err, "cannot rename, app already exists");
                    return Err(DeployError::RenameConflict {
                        app: app.to_string(),
                        output: rename_output(&err),
                    });
                }
                tracing::info!(app, "new app detected");
                DeployState::FirstDeploy
            }
        };
        let first_deploy = state == DeployState::FirstDeploy;

        tracing::info!(app, domain, %state, "pushing new app");
        tracing::debug!(app, path = %app_path.display(), "using staged artifact");
        let push_result = self.courier.push(app, app_path, info.instances);
        write_output(out, output_of(&push_result));
        let push_output = match push_result {
            Ok(output) => lossy(&output),
            Err(err) => {
                let output = err.output_text();
                return Err(match self.courier.logs(app) {
                    Ok(logs) => DeployError::PushFailed {
                        output,
                        logs,
                        first_deploy,
                    },
                    Err(source) => DeployError::PushLogsUnavailable {
                        logs: non_empty(&source.output),
                        source,
                        first_deploy,
                    },
                });
            }
        };
        tracing::info!(app, state = %DeployState::BitsTransferred, "output from Cloud Foundry:\n{}", push_output);

        tracing::debug!(app, domain, "mapping route");
        let route_result = self.courier.map_route(app, domain);
        write_output(out, output_of(&route_result));
        match route_result {
            Ok(output) => {
                tracing::debug!(app, "{}", lossy(&output));
            }
            Err(source) => {
                return Err(match self.courier.logs(app) {
                    Ok(logs) => DeployError::RouteFailed {
                        logs,
                        source,
                        first_deploy,
                    },
                    Err(err) => {
                        tracing::warn!(app, route_error = %source, error = %err, "cannot fetch logs after route failure");
                        DeployError::RouteLogsUnavailable {
                            push_output,
                            first_deploy,
                        }
                    }
                });
            }
        }

        tracing::info!(app, domain, state = %DeployState::RouteBound, "application route created at {}.{}", app, domain);
        Ok(state)
    }

    /// Delete the venerable app once the new version is routable.
    pub fn delete_venerable(
        &self,
        info: &DeploymentInfo,
        foundation_url: &str,
    ) -> Result<(), DeployError> {
        let name = info.venerable_name();
        if let Err(source) = self.courier.delete(&name) {
            return Err(DeployError::DeleteVenerable { name, source });
        }

        tracing::info!(app = %name, "deleted {}", name);
        tracing::info!(foundation = foundation_url, "finished push successfully on {}", foundation_url);
        Ok(())
    }

    /// Undo a failed push.
    ///
    /// Deletes the new app and, unless this was a first deploy, renames the
    /// venerable app back. Every step is attempted; failures are reported,
    /// never returned.
    pub fn rollback(&self, info: &DeploymentInfo, first_deploy: bool) -> RollbackReport {
        let app = info.app_name.as_str();
        let venerable = info.venerable_name();
        let mut report = RollbackReport::default();
        tracing::error!(app, first_deploy, "rolling back deploy of {}", app);

        match self.courier.delete(app) {
            Ok(_) => {
                tracing::info!(app, "deleted {}", app);
                report.deleted = true;
            }
            Err(err) => {
                tracing::warn!(app, error = %err, "unable to delete {}", app);
                report
                    .warnings
                    .push(format!("unable to delete {}: {}", app, err));
            }
        }

        if !first_deploy {
            match self.courier.rename(&venerable, app) {
                Ok(_) => {
                    tracing::info!(app, venerable = %venerable, "renamed app from {} to {}", venerable, app);
                    report.restored = Some(true);
                }
                Err(err) => {
                    tracing::warn!(app, venerable = %venerable, error = %err, "unable to rename venerable app");
                    report.restored = Some(false);
                    report.warnings.push(format!(
                        "unable to rename venerable app {}: {}",
                        venerable, err
                    ));
                }
            }
        }

        report
    }

    /// Release courier staging resources.
    pub fn clean_up(&self) -> Result<(), DeployError> {
        self.courier.clean_up().map_err(DeployError::from)
    }

    pub fn exists(&self, app_name: &str) -> bool {
        self.courier.exists(app_name)
    }
}

fn output_of(result: &Result<Vec<u8>, CourierError>) -> &[u8] {
    match result {
        Ok(output) => output,
        Err(err) => &err.output,
    }
}

fn rename_output(err: &CourierError) -> String {
    if err.output.is_empty() {
        err.message.clone()
    } else {
        err.output_text()
    }
}

fn non_empty(bytes: &[u8]) -> Option<Vec<u8>> {
    (!bytes.is_empty()).then(|| bytes.to_vec())
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Forward raw platform output to the caller's sink.
fn write_output(out: &mut impl Write, output: &[u8]) {
    if output.is_empty() {
        return;
    }
    if let Err(e) = out.write_all(output).and_then(|_| out.flush()) {
        tracing::warn!(error = %e, "failed to write platform output");
    }
}
