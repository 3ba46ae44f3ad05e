//! Courier backed by the Cloud Foundry `cf` CLI.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::Context;
use tempfile::TempDir;

use super::{Courier, CourierError, CourierResult};

/// Drives a foundation through the `cf` command line interface.
///
/// Every instance owns a private `CF_HOME`, so login state never leaks
/// between concurrent deployments.
#[derive(Debug)]
pub struct CfCourier {
    binary: PathBuf,
    home: TempDir,
}

impl CfCourier {
    /// Create a courier that invokes `cf` from `PATH`.
    pub fn new() -> anyhow::Result<Self> {
        Self::with_binary("cf")
    }

    /// Create a courier that invokes the given `cf` executable.
    pub fn with_binary(binary: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let home = tempfile::Builder::new()
            .prefix("bluegreen-cf-home-")
            .tempdir()
            .context("Failed to create CF_HOME directory")?;
        Ok(Self {
            binary: binary.into(),
            home,
        })
    }

    /// The private `CF_HOME` used for every invocation.
    pub fn home_dir(&self) -> &Path {
        self.home.path()
    }

    fn run_cf(&self, cwd: Option<&Path>, args: &[OsString]) -> CourierResult {
        let subcommand = args
            .first()
            .map(|a| a.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut cmd = Command::new(&self.binary);
        cmd.args(args).env("CF_HOME", self.home.path());
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        let output = cmd.output().map_err(|e| {
            CourierError::new(format!(
                "failed to run {} {}: {}",
                self.binary.display(),
                subcommand,
                e
            ))
        })?;

        let mut combined = output.stdout;
        combined.extend_from_slice(&output.stderr);
        if output.status.success() {
            return Ok(combined);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let cause = match stderr.trim() {
            "" => output.status.to_string(),
            trimmed => trimmed.to_string(),
        };
        Err(CourierError::with_output(
            format!("cf {} failed: {}", subcommand, cause),
            combined,
        ))
    }
}

impl Courier for CfCourier {
    fn login(
        &self,
        url: &str,
        username: &str,
        password: &str,
        org: &str,
        space: &str,
        skip_ssl: bool,
    ) -> CourierResult {
        self.run_cf(None, &login_args(url, username, password, org, space, skip_ssl))
    }

    fn rename(&self, app_name: &str, new_name: &str) -> CourierResult {
        self.run_cf(None, &os_args(&["rename", app_name, new_name]))
    }

    fn push(&self, app_name: &str, app_path: &Path, instances: u16) -> CourierResult {
        let instances = instances.to_string();
        self.run_cf(
            Some(app_path),
            &os_args(&["push", app_name, "-i", instances.as_str()]),
        )
    }

    fn map_route(&self, app_name: &str, domain: &str) -> CourierResult {
        self.run_cf(None, &os_args(&["map-route", app_name, domain, "-n", app_name]))
    }

    fn delete(&self, app_name: &str) -> CourierResult {
        self.run_cf(None, &os_args(&["delete", app_name, "-f"]))
    }

    fn exists(&self, app_name: &str) -> bool {
        self.run_cf(None, &os_args(&["app", app_name])).is_ok()
    }

    fn logs(&self, app_name: &str) -> CourierResult {
        self.run_cf(None, &os_args(&["logs", app_name, "--recent"]))
    }

    fn clean_up(&self) -> Result<(), CourierError> {
        match std::fs::remove_dir_all(self.home.path()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CourierError::new(format!(
                "cannot remove CF_HOME {}: {}",
                self.home.path().display(),
                e
            ))),
        }
    }
}

fn os_args(args: &[&str]) -> Vec<OsString> {
    args.iter().map(OsString::from).collect()
}

fn login_args(
    url: &str,
    username: &str,
    password: &str,
    org: &str,
    space: &str,
    skip_ssl: bool,
) -> Vec<OsString> {
    let mut args = os_args(&[
        "login", "-a", url, "-u", username, "-p", password, "-o", org, "-s", space,
    ]);
    if skip_ssl {
        args.push(OsString::from("--skip-ssl-validation"));
    }
    args
}
