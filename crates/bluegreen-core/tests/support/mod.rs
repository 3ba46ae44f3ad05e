#![allow(dead_code)]

pub mod courier;
pub mod logs;

use bluegreen_core::deployment::DeploymentInfo;

pub fn deployment_info(app_name: &str) -> DeploymentInfo {
    DeploymentInfo {
        app_name: app_name.to_string(),
        instances: 2,
        username: "deployer".to_string(),
        password: "hunter2".to_string(),
        org: "platform".to_string(),
        space: "staging".to_string(),
        skip_ssl: true,
        domain: "apps.example.com".to_string(),
    }
}
