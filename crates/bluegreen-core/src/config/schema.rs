//! Schema of the bluegreen.toml environments file.

use std::collections::BTreeMap;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use url::Url;

fn default_instances() -> u16 {
    1
}

/// Root of bluegreen.toml.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Deployment environments keyed by the name used on the command line.
    #[serde(default)]
    pub environments: BTreeMap<String, Environment>,
}

impl ConfigFile {
    pub fn validate(&self) -> anyhow::Result<()> {
        for (key, environment) in &self.environments {
            environment
                .validate()
                .with_context(|| format!("Invalid environment '{}'", key))?;
        }
        Ok(())
    }
}

/// A named group of foundations sharing a route domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub name: String,
    /// Foundation API endpoints.
    pub foundations: Vec<String>,
    /// Domain every app route in this environment is bound to.
    pub domain: String,
    #[serde(default)]
    pub skip_ssl: bool,
    /// Instance count used when a deploy does not specify one.
    #[serde(default = "default_instances")]
    pub instances: u16,
}

impl Environment {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.foundations.is_empty() {
            anyhow::bail!("Environment '{}' has no foundations", self.name);
        }
        if self.domain.trim().is_empty() {
            anyhow::bail!("Environment '{}' has no domain", self.name);
        }
        for foundation in &self.foundations {
            foundation_url(foundation)?;
        }
        Ok(())
    }

    /// Resolve which foundation to deploy to.
    ///
    /// With no request the first foundation is used. A requested foundation
    /// must belong to this environment.
    pub fn select_foundation(&self, requested: Option<&str>) -> anyhow::Result<Url> {
        let Some(requested) = requested else {
            let first = self
                .foundations
                .first()
                .ok_or_else(|| anyhow::anyhow!("Environment '{}' has no foundations", self.name))?;
            return foundation_url(first);
        };

        let wanted = foundation_url(requested)?;
        for foundation in &self.foundations {
            let candidate = foundation_url(foundation)?;
            if candidate == wanted {
                return Ok(candidate);
            }
        }
        anyhow::bail!(
            "Foundation '{}' is not part of environment '{}'",
            requested,
            self.name
        )
    }
}

/// Parse a foundation endpoint, assuming https when no scheme is given.
pub fn foundation_url(foundation: &str) -> anyhow::Result<Url> {
    let trimmed = foundation.trim();
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };
    let url = Url::parse(&candidate)
        .with_context(|| format!("Invalid foundation URL: {}", foundation))?;
    if url.host_str().is_none() {
        anyhow::bail!("Foundation URL has no host: {}", foundation);
    }
    Ok(url)
}
