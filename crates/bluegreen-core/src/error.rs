//! Error types for deployment orchestration.

use crate::courier::CourierError;

/// Errors produced by the blue-green deployment protocol.
///
/// Each variant is one distinguishable outcome of [`crate::pusher::Pusher`].
/// Variants that fetched platform logs before failing carry them so the
/// caller can show operators the platform-side context.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// The deployment description cannot identify an application.
    #[error("invalid deployment: {reason}")]
    InvalidDeployment { reason: String },

    /// The live app could not be renamed even though it exists.
    #[error("cannot rename, app already exists: {app}: {output}")]
    RenameConflict {
        /// Application that blocked the rename.
        app: String,
        /// Raw output of the failed rename.
        output: String,
    },

    /// Bits transfer failed; recent platform logs were retrieved.
    #[error("output from Cloud Foundry:\n{output}")]
    PushFailed {
        /// Raw output of the failed push.
        output: String,
        /// Recent platform logs for the app.
        logs: Vec<u8>,
        /// No venerable app was parked before the failure.
        first_deploy: bool,
    },

    /// Bits transfer failed and the platform logs could not be retrieved.
    #[error("cannot fetch logs after failed push: {source}")]
    PushLogsUnavailable {
        /// Whatever the log fetch produced before failing.
        logs: Option<Vec<u8>>,
        /// The log-fetch failure.
        source: CourierError,
        /// No venerable app was parked before the failure.
        first_deploy: bool,
    },

    /// Route binding failed; recent platform logs were retrieved.
    #[error("cannot map route: {source}")]
    RouteFailed {
        /// Recent platform logs for the app.
        logs: Vec<u8>,
        /// The route-mapping failure.
        source: CourierError,
        /// No venerable app was parked before the failure.
        first_deploy: bool,
    },

    /// Route binding failed and the platform logs could not be retrieved.
    ///
    /// The message is the output of the preceding successful push.
    #[error("{push_output}")]
    RouteLogsUnavailable {
        /// Raw output of the push that preceded the route failure.
        push_output: String,
        /// No venerable app was parked before the failure.
        first_deploy: bool,
    },

    /// Authentication against a foundation failed.
    #[error("cannot login to {url}: {source}")]
    Login {
        /// Foundation API endpoint.
        url: String,
        /// Underlying login failure.
        source: CourierError,
    },

    /// The venerable app could not be deleted after a successful push.
    #[error("cannot delete {name}: {source}")]
    DeleteVenerable {
        /// Name of the venerable app.
        name: String,
        /// Underlying delete failure.
        source: CourierError,
    },

    /// A courier failure passed through unchanged.
    #[error(transparent)]
    Courier(#[from] CourierError),
}

impl DeployError {
    /// Platform diagnostic logs captured while handling the failure, if any.
    pub fn logs(&self) -> Option<&[u8]> {
        match self {
            DeployError::PushFailed { logs, .. } | DeployError::RouteFailed { logs, .. } => {
                Some(logs)
            }
            DeployError::PushLogsUnavailable { logs, .. } => logs.as_deref(),
            _ => None,
        }
    }

    /// Whether the failed push ran as a first deploy.
    ///
    /// `None` when the failure happened before the live app was parked, or
    /// outside of a push.
    pub fn first_deploy(&self) -> Option<bool> {
        match self {
            DeployError::PushFailed { first_deploy, .. }
            | DeployError::PushLogsUnavailable { first_deploy, .. }
            | DeployError::RouteFailed { first_deploy, .. }
            | DeployError::RouteLogsUnavailable { first_deploy, .. } => Some(*first_deploy),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_failure_message_contains_output() {
        let err = DeployError::PushFailed {
            output: "staging failed".to_string(),
            logs: b"recent logs".to_vec(),
            first_deploy: false,
        };
        assert_eq!(err.to_string(), "output from Cloud Foundry:\nstaging failed");
        assert_eq!(err.logs(), Some(&b"recent logs"[..]));
        assert_eq!(err.first_deploy(), Some(false));
    }

    #[test]
    fn login_message_wraps_url_and_cause() {
        let err = DeployError::Login {
            url: "https://api.example.com".to_string(),
            source: CourierError::new("bad credentials"),
        };
        assert_eq!(
            err.to_string(),
            "cannot login to https://api.example.com: bad credentials"
        );
        assert!(err.logs().is_none());
        assert_eq!(err.first_deploy(), None);
    }

    #[test]
    fn route_fallback_message_is_push_output() {
        let err = DeployError::RouteLogsUnavailable {
            push_output: "app started".to_string(),
            first_deploy: true,
        };
        assert_eq!(err.to_string(), "app started");
        assert_eq!(err.first_deploy(), Some(true));
    }

    #[test]
    fn courier_errors_pass_through_unchanged() {
        let err: DeployError = CourierError::new("cannot remove CF_HOME").into();
        assert_eq!(err.to_string(), "cannot remove CF_HOME");
    }
}
