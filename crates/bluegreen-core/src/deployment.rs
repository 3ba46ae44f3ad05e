//! Deployment target description and derived application identity.

use serde::{Deserialize, Serialize};

/// Suffix appended to the live app name while a new version is being pushed.
pub const VENERABLE_SUFFIX: &str = "-venerable";

/// Target application, placement and credentials for one deployment attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentInfo {
    pub app_name: String,
    /// Desired instance count.
    pub instances: u16,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    pub org: String,
    pub space: String,
    #[serde(default)]
    pub skip_ssl: bool,
    /// Domain the app route is bound to.
    pub domain: String,
}

impl DeploymentInfo {
    /// Reject deployment descriptions that cannot identify an application.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.app_name.trim().is_empty() {
            anyhow::bail!("Application name must not be empty");
        }
        if self.app_name.ends_with(VENERABLE_SUFFIX) {
            anyhow::bail!(
                "Application name '{}' must not end with '{}'",
                self.app_name,
                VENERABLE_SUFFIX
            );
        }
        Ok(())
    }

    /// Name the current live app is parked under during a push.
    pub fn venerable_name(&self) -> String {
        venerable_name(&self.app_name)
    }
}

pub fn venerable_name(app_name: &str) -> String {
    format!("{}{}", app_name, VENERABLE_SUFFIX)
}

/// Position of one deployment attempt in the blue-green protocol.
///
/// Never persisted: every call recomputes its position from courier answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployState {
    Initial,
    /// No live app existed, so nothing was parked.
    FirstDeploy,
    /// The live app was renamed to its venerable name.
    VenerableCreated,
    BitsTransferred,
    /// The new app is routable.
    RouteBound,
    /// The venerable app was removed after a successful push.
    Completed,
    /// The push failed and the foundation was rolled back.
    RolledBack,
    /// The attempt failed without needing a rollback.
    Failed,
}

impl std::fmt::Display for DeployState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            DeployState::Initial => "initial",
            DeployState::FirstDeploy => "first deploy",
            DeployState::VenerableCreated => "venerable created",
            DeployState::BitsTransferred => "bits transferred",
            DeployState::RouteBound => "route bound",
            DeployState::Completed => "completed",
            DeployState::RolledBack => "rolled back",
            DeployState::Failed => "failed",
        };
        f.write_str(label)
    }
}
