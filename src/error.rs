use std::path::PathBuf;

use thiserror::Error;

use crate::object::Network;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("unknown network `{0}`, expected one of testnet, mainnet, devnet")]
    UnknownNetwork(String),

    #[error("no deployments found for {network}")]
    NoDeployments { network: Network },

    #[error("deployment #{id} not found on {network}\nAvailable deployments:\n{available}")]
    DeploymentNotFound {
        network: Network,
        id: u64,
        available: String,
    },

    #[error("no usable deployment found on {network}: nothing is marked active\nAvailable deployments:\n{available}")]
    NoUsableDeployment { network: Network, available: String },

    #[error("deployment #{id} on {network} has no UpgradeCap object, it cannot be upgraded\nAvailable deployments:\n{available}")]
    MissingUpgradeCapability {
        network: Network,
        id: u64,
        available: String,
    },

    #[error("lock file {} not found", .0.display())]
    LockFileMissing(PathBuf),

    #[error("published-version `{value}` in [env.{network}] is not a usable version")]
    InvalidLockVersion { network: Network, value: String },

    #[error("malformed document {}: {source}", path.display())]
    MalformedDocument {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RegistryError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RegistryError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;
