//! TOML parser with helpful error messages

use super::schema::ConfigFile;
use anyhow::{Context, Result};
use std::path::Path;

/// Parse bluegreen.toml with detailed error messages
pub fn parse_config_toml(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config_toml_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse bluegreen.toml content from string
pub fn parse_config_toml_str(content: &str) -> Result<ConfigFile> {
    let config: ConfigFile =
        toml::from_str(content).map_err(|e| enhance_toml_error(e, content))?;

    config.validate()?;

    Ok(config)
}

/// Enhance TOML parsing errors with the offending lines
fn enhance_toml_error(error: toml::de::Error, content: &str) -> anyhow::Error {
    let message = error.message().to_string();

    let line_num = error
        .span()
        .map(|span| content[..span.start.min(content.len())].matches('\n').count() + 1);

    match line_num {
        Some(line_num) => anyhow::anyhow!(
            "TOML parsing error at line {}:\n{}\n\nError: {}",
            line_num,
            get_line_context(content, line_num),
            message
        ),
        None => anyhow::anyhow!("TOML parsing error: {}", message),
    }
}

/// Get context lines around an error
fn get_line_context(content: &str, line_num: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let start = line_num.saturating_sub(2);
    let end = (line_num + 2).min(lines.len());

    lines[start.min(end)..end]
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let num = start + i + 1;
            let marker = if num == line_num { ">>>" } else { "   " };
            format!("{} {:4} | {}", marker, num, line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_config() {
        let toml = r#"
[environments.test]
name = "Test"
foundations = ["api1.example.com", "api2.example.com"]
domain = "test.example.com"

[environments.prod]
name = "Prod"
foundations = ["api3.example.com", "api4.example.com"]
domain = "example.com"
skip_ssl = true
instances = 4
"#;

        let config = parse_config_toml_str(toml).unwrap();
        assert_eq!(config.environments.len(), 2);

        let test = &config.environments["test"];
        assert_eq!(test.foundations.len(), 2);
        assert_eq!(test.instances, 1);
        assert!(!test.skip_ssl);

        let prod = &config.environments["prod"];
        assert_eq!(prod.domain, "example.com");
        assert_eq!(prod.instances, 4);
        assert!(prod.skip_ssl);
    }

    #[test]
    fn test_parse_empty_config() {
        let config = parse_config_toml_str("").unwrap();
        assert!(config.environments.is_empty());
    }

    #[test]
    fn test_parse_invalid_toml_points_at_line() {
        let toml = "\n[environments.test\nname = \"Test\"\n"; // Missing closing bracket

        let err = parse_config_toml_str(toml).unwrap_err().to_string();
        assert!(err.starts_with("TOML parsing error"));
    }

    #[test]
    fn test_validation_failure_names_environment() {
        let toml = r#"
[environments.broken]
name = "Broken"
foundations = []
domain = "example.com"
"#;

        let err = format!("{:#}", parse_config_toml_str(toml).unwrap_err());
        assert!(err.contains("Invalid environment 'broken'"));
        assert!(err.contains("has no foundations"));
    }
}
