use std::{fs, path::Path};

use sui_deploy_runner::{client::MoveCall, DeploymentRecord};
use thiserror::Error;

mod operation;
pub use operation::*;

pub const BRIDGE_NFT_MODULE: &str = "bridge_nft";
pub const BRIDGE_CONFIG: &str = "BridgeConfig";

#[derive(Error, Debug)]
pub enum OperationError {
    #[error("deployment #{id} has no {object} object, was it published by this package?")]
    MissingObject { id: u64, object: &'static str },

    #[error("could not read receivers from {path}: {reason}")]
    Receivers { path: String, reason: String },

    #[error(transparent)]
    Chain(#[from] sui_deploy_runner::client::ChainError),
}

/// Call builder for the bridge NFT package of one deployment
///
/// Every entry function takes the shared `BridgeConfig` object as its first
/// argument, so it has to be present in the deployment's captured objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeNft {
    pub package_id: String,
    pub config_id: String,
}

impl BridgeNft {
    pub fn from_deployment(record: &DeploymentRecord) -> Result<Self, OperationError> {
        let config_id = record
            .object(BRIDGE_CONFIG)
            .ok_or(OperationError::MissingObject {
                id: record.id,
                object: BRIDGE_CONFIG,
            })?;
        Ok(Self {
            package_id: record.package_id.clone(),
            config_id: config_id.to_string(),
        })
    }

    fn call(&self, function: &str, mut arguments: Vec<String>) -> MoveCall {
        arguments.insert(0, self.config_id.clone());
        MoveCall {
            package: self.package_id.clone(),
            module: BRIDGE_NFT_MODULE.to_string(),
            function: function.to_string(),
            arguments,
        }
    }

    pub fn mint_call(&self, receiver: &str) -> MoveCall {
        self.call("mint", vec![receiver.to_string()])
    }

    pub fn transfer_ownership_call(&self, new_owner: &str) -> MoveCall {
        self.call("transfer_ownership", vec![new_owner.to_string()])
    }

    pub fn accept_ownership_call(&self) -> MoveCall {
        self.call("accept_ownership", Vec::new())
    }
}

/// Read the receiver list, a non-empty JSON array of addresses
pub fn load_receivers<P: AsRef<Path>>(path: P) -> Result<Vec<String>, OperationError> {
    let path = path.as_ref();
    let error = |reason: String| OperationError::Receivers {
        path: path.display().to_string(),
        reason,
    };
    let content = fs::read(path).map_err(|e| error(e.to_string()))?;
    let receivers: Vec<String> =
        serde_json::from_slice(&content).map_err(|e| error(e.to_string()))?;
    if receivers.is_empty() {
        return Err(error("the list must be a non-empty array".to_string()));
    }
    Ok(receivers)
}
