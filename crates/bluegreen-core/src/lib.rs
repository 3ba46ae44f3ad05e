//! Bluegreen Core Library
//!
//! Zero-downtime deployment of application bundles onto Cloud Foundry
//! foundations. The heart of the crate is [`pusher::Pusher`], which runs the
//! rename/push/route/rollback protocol against an injected [`courier::Courier`].

pub mod config;
pub mod courier;
pub mod deployer;
pub mod deployment;
pub mod error;
pub mod extractor;
pub mod pusher;

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{Config, ConfigStore, Environment};

    // Platform control
    pub use crate::courier::{CfCourier, Courier, CourierError};

    // Orchestration
    pub use crate::deployer::{DeployFailure, DeployReport, Deployer};
    pub use crate::deployment::{DeployState, DeploymentInfo};
    pub use crate::error::DeployError;
    pub use crate::pusher::{Pusher, RollbackReport};

    // Artifacts
    pub use crate::extractor::Extractor;
}
