//! Deployment configuration.
//!
//! Environments and their foundations come from bluegreen.toml; platform
//! credentials come from the process environment:
//! - `CF_USERNAME`: platform user
//! - `CF_PASSWORD`: platform password

pub mod parser;
pub mod schema;
pub mod store;

use std::collections::BTreeMap;

pub use parser::{parse_config_toml, parse_config_toml_str};
pub use schema::{ConfigFile, Environment, foundation_url};
pub use store::ConfigStore;

pub const USERNAME_VAR: &str = "CF_USERNAME";
pub const PASSWORD_VAR: &str = "CF_PASSWORD";

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub username: String,
    pub password: String,
    pub environments: BTreeMap<String, Environment>,
}

impl Config {
    /// Combine a parsed config file with credentials read through `lookup`.
    ///
    /// Unset and empty variables are both treated as missing.
    pub fn new(
        lookup: impl Fn(&str) -> Option<String>,
        file: ConfigFile,
    ) -> anyhow::Result<Self> {
        let read = |name: &str| lookup(name).filter(|value| !value.is_empty());
        let username = read(USERNAME_VAR);
        let password = read(PASSWORD_VAR);

        let missing: Vec<&str> = [(USERNAME_VAR, &username), (PASSWORD_VAR, &password)]
            .into_iter()
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| name)
            .collect();
        let (Some(username), Some(password)) = (username, password) else {
            anyhow::bail!("missing environment variables: {}", missing.join(", "));
        };

        Ok(Self {
            username,
            password,
            environments: file.environments,
        })
    }

    /// Look up an environment by its configuration key.
    pub fn environment(&self, key: &str) -> anyhow::Result<&Environment> {
        self.environments.get(key).ok_or_else(|| {
            let known: Vec<&str> = self.environments.keys().map(String::as_str).collect();
            anyhow::anyhow!(
                "Unknown environment '{}' (configured: {})",
                key,
                if known.is_empty() {
                    "none".to_string()
                } else {
                    known.join(", ")
                }
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    fn file() -> ConfigFile {
        parse_config_toml_str(
            r#"
[environments.test]
name = "Test"
foundations = ["api1.example.com", "api2.example.com"]
domain = "test.example.com"
"#,
        )
        .unwrap()
    }

    #[test]
    fn reads_credentials_from_environment() {
        let config = Config::new(
            lookup(&[(USERNAME_VAR, "cf-user"), (PASSWORD_VAR, "cf-pass")]),
            file(),
        )
        .unwrap();

        assert_eq!(config.username, "cf-user");
        assert_eq!(config.password, "cf-pass");
        assert_eq!(config.environment("test").unwrap().name, "Test");
    }

    #[test]
    fn missing_variable_is_named() {
        let err = Config::new(lookup(&[(USERNAME_VAR, ""), (PASSWORD_VAR, "cf-pass")]), file())
            .unwrap_err();
        assert_eq!(err.to_string(), "missing environment variables: CF_USERNAME");
    }

    #[test]
    fn all_missing_variables_are_listed_in_order() {
        let err = Config::new(lookup(&[]), file()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "missing environment variables: CF_USERNAME, CF_PASSWORD"
        );
    }

    #[test]
    fn unknown_environment_lists_configured_keys() {
        let config = Config::new(
            lookup(&[(USERNAME_VAR, "u"), (PASSWORD_VAR, "p")]),
            file(),
        )
        .unwrap();
        let err = config.environment("prod").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unknown environment 'prod' (configured: test)"
        );
    }
}
