//! Platform control capability.
//!
//! The [`Courier`] trait is the only path through which orchestration code
//! touches a foundation:
//! - Command-style operations return the raw platform output
//! - Failures keep whatever output was produced before the failure
//! - `exists` is a side-effect-free probe

mod cf;

pub use cf::CfCourier;

use std::path::Path;

/// Raw output of a platform command.
pub type CourierResult = Result<Vec<u8>, CourierError>;

/// A failed platform operation.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct CourierError {
    /// Human-readable cause.
    pub message: String,
    /// Raw output produced before the failure.
    pub output: Vec<u8>,
}

impl CourierError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            output: Vec::new(),
        }
    }

    pub fn with_output(message: impl Into<String>, output: impl Into<Vec<u8>>) -> Self {
        Self {
            message: message.into(),
            output: output.into(),
        }
    }

    /// Captured output, lossily decoded.
    pub fn output_text(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

/// Operations against a platform-as-a-service foundation.
pub trait Courier {
    /// Authenticate and target an org and space.
    fn login(
        &self,
        url: &str,
        username: &str,
        password: &str,
        org: &str,
        space: &str,
        skip_ssl: bool,
    ) -> CourierResult;

    /// Rename an application.
    fn rename(&self, app_name: &str, new_name: &str) -> CourierResult;

    /// Upload and start the bits at `app_path` under `app_name`.
    fn push(&self, app_name: &str, app_path: &Path, instances: u16) -> CourierResult;

    /// Bind `app_name` to a route on `domain`.
    fn map_route(&self, app_name: &str, domain: &str) -> CourierResult;

    /// Delete an application. Fails when the app is absent.
    fn delete(&self, app_name: &str) -> CourierResult;

    /// Whether an application with this name currently exists.
    fn exists(&self, app_name: &str) -> bool;

    /// Recent platform logs for an application.
    fn logs(&self, app_name: &str) -> CourierResult;

    /// Release any staging resources held by the courier.
    fn clean_up(&self) -> Result<(), CourierError>;
}

impl<C: Courier + ?Sized> Courier for &C {
    fn login(
        &self,
        url: &str,
        username: &str,
        password: &str,
        org: &str,
        space: &str,
        skip_ssl: bool,
    ) -> CourierResult {
        (**self).login(url, username, password, org, space, skip_ssl)
    }

    fn rename(&self, app_name: &str, new_name: &str) -> CourierResult {
        (**self).rename(app_name, new_name)
    }

    fn push(&self, app_name: &str, app_path: &Path, instances: u16) -> CourierResult {
        (**self).push(app_name, app_path, instances)
    }

    fn map_route(&self, app_name: &str, domain: &str) -> CourierResult {
        (**self).map_route(app_name, domain)
    }

    fn delete(&self, app_name: &str) -> CourierResult {
        (**self).delete(app_name)
    }

    fn exists(&self, app_name: &str) -> bool {
        (**self).exists(app_name)
    }

    fn logs(&self, app_name: &str) -> CourierResult {
        (**self).logs(app_name)
    }

    fn clean_up(&self) -> Result<(), CourierError> {
        (**self).clean_up()
    }
}
