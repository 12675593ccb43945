//! Boundary to the Sui toolchain
//!
//! Building, signing and submitting transactions is delegated to the `sui`
//! binary. This module only shapes its JSON output into the digest and the
//! created-object map the registry needs.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    process::Output,
};

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

use crate::object::{Network, PACKAGE};

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with status {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: i32,
        stderr: String,
    },

    #[error("unexpected output from `{command}`: {reason}")]
    MalformedOutput { command: String, reason: String },

    #[error("transaction {digest} failed: {error}")]
    TransactionFailed { digest: String, error: String },
}

pub type Result<T> = std::result::Result<T, ChainError>;

/// Bytecode of a Move package as produced by `sui move build --dump-bytecode-as-base64`
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct CompiledPackage {
    #[serde(skip)]
    pub path: PathBuf,
    pub modules: Vec<String>,
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub digest: Vec<u8>,
}

/// Digest of an executed transaction plus the objects it created, keyed by logical name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionOutcome {
    pub digest: String,
    pub created: BTreeMap<String, String>,
}

impl TransactionOutcome {
    pub fn package_id(&self) -> Option<&str> {
        self.created.get(PACKAGE).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveCall {
    pub package: String,
    pub module: String,
    pub function: String,
    pub arguments: Vec<String>,
}

impl MoveCall {
    pub fn target(&self) -> String {
        format!("{}::{}::{}", self.package, self.module, self.function)
    }
}

/// Compiles a package ahead of a publish or upgrade
///
/// For [`SuiCliClient`] this is a pre-flight check only: `sui client publish`
/// and `sui client upgrade` rebuild from [`CompiledPackage::path`], so the
/// bytecode fields are reported but not resubmitted. A package that does not
/// compile fails here, before any transaction is signed.
#[async_trait]
pub trait PackageBuilder: Send + Sync {
    async fn build(&self, path: &Path) -> Result<CompiledPackage>;
}

#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Address that signs every transaction sent through this client
    async fn active_address(&self) -> Result<String>;

    async fn publish(&self, package: &CompiledPackage) -> Result<TransactionOutcome>;

    /// Upgrade the lineage currently at `current_package_id`
    ///
    /// The `sui` binary takes the package being replaced from the package's
    /// `Move.lock`, so [`SuiCliClient`] only logs `current_package_id`.
    async fn upgrade(
        &self,
        package: &CompiledPackage,
        current_package_id: &str,
        upgrade_cap: &str,
    ) -> Result<TransactionOutcome>;

    async fn call(&self, call: &MoveCall) -> Result<TransactionOutcome>;
}

pub fn explorer_tx_url(network: Network, digest: &str) -> String {
    format!("https://suiscan.xyz/{network}/tx/{digest}")
}

/// Logical name of an on-chain type: `0x2::package::UpgradeCap` becomes `UpgradeCap`
pub fn object_name(object_type: &str) -> &str {
    let without_generics = object_type
        .split_once('<')
        .map_or(object_type, |(head, _)| head);
    without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
}

/// Collect `objectChanges` of a transaction response into a name -> object id map
///
/// The published package is stored under `Package`. When several created
/// objects share a type name the first one wins.
pub fn created_objects(response: &serde_json::Value) -> BTreeMap<String, String> {
    let mut objects = BTreeMap::new();
    let Some(changes) = response["objectChanges"].as_array() else {
        return objects;
    };
    for change in changes {
        match change["type"].as_str() {
            Some("published") => {
                if let Some(package_id) = change["packageId"].as_str() {
                    objects.insert(PACKAGE.to_string(), package_id.to_string());
                }
            }
            Some("created") => {
                if let (Some(object_type), Some(object_id)) =
                    (change["objectType"].as_str(), change["objectId"].as_str())
                {
                    objects
                        .entry(object_name(object_type).to_string())
                        .or_insert_with(|| object_id.to_string());
                }
            }
            _ => {}
        }
    }
    objects
}

/// Turn a `--json` transaction response into an outcome, rejecting failed executions
pub fn parse_transaction_response(command: &str, response: &serde_json::Value) -> Result<TransactionOutcome> {
    let digest = response["digest"]
        .as_str()
        .ok_or_else(|| ChainError::MalformedOutput {
            command: command.to_string(),
            reason: "missing `digest`".to_string(),
        })?
        .to_string();
    let status = &response["effects"]["status"];
    if let Some(state) = status["status"].as_str() {
        if state != "success" {
            return Err(ChainError::TransactionFailed {
                digest,
                error: status["error"].as_str().unwrap_or(state).to_string(),
            });
        }
    }
    Ok(TransactionOutcome {
        digest,
        created: created_objects(response),
    })
}

pub fn parse_build_output(command: &str, path: &Path, stdout: &str) -> Result<CompiledPackage> {
    let mut package: CompiledPackage =
        serde_json::from_str(stdout).map_err(|e| ChainError::MalformedOutput {
            command: command.to_string(),
            reason: e.to_string(),
        })?;
    package.path = path.to_path_buf();
    Ok(package)
}

/// Runs the `sui` binary against the configured environment
#[derive(Debug, Clone)]
pub struct SuiCliClient {
    pub binary: String,
    pub network: Network,
    pub gas_budget: Option<u64>,
}

impl SuiCliClient {
    pub fn new(binary: impl Into<String>, network: Network, gas_budget: Option<u64>) -> Self {
        Self {
            binary: binary.into(),
            network,
            gas_budget,
        }
    }

    /// Point the CLI at this client's network
    pub async fn switch_env(&self) -> Result<()> {
        let network = self.network.to_string();
        self.run(&["client", "switch", "--env", network.as_str()]).await?;
        Ok(())
    }

    async fn run(&self, args: &[&str]) -> Result<String> {
        let command = format!("{} {}", self.binary, args.join(" "));
        debug!("Running command: {command}");
        let output = Command::new(&self.binary)
            .args(args)
            .output()
            .await
            .map_err(|source| ChainError::Spawn {
                command: command.clone(),
                source,
            })?;
        check_output(&command, output)
    }

    async fn run_transaction(&self, mut args: Vec<String>) -> Result<TransactionOutcome> {
        if let Some(budget) = self.gas_budget {
            args.push("--gas-budget".to_string());
            args.push(budget.to_string());
        }
        args.push("--json".to_string());
        let args = args.iter().map(String::as_str).collect::<Vec<_>>();
        let command = format!("{} {}", self.binary, args.join(" "));
        let stdout = self.run(&args).await?;
        let response: serde_json::Value =
            serde_json::from_str(&stdout).map_err(|e| ChainError::MalformedOutput {
                command: command.clone(),
                reason: e.to_string(),
            })?;
        parse_transaction_response(&command, &response)
    }
}

fn check_output(command: &str, output: Output) -> Result<String> {
    if !output.status.success() {
        return Err(ChainError::CommandFailed {
            command: command.to_string(),
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[async_trait]
impl PackageBuilder for SuiCliClient {
    async fn build(&self, path: &Path) -> Result<CompiledPackage> {
        info!("Building Move package at: {}", path.display());
        let path_str = path_arg(path);
        let args = [
            "move",
            "build",
            "--with-unpublished-dependencies",
            "--dump-bytecode-as-base64",
            "--path",
            path_str.as_str(),
        ];
        let stdout = self.run(&args).await?;
        let package = parse_build_output(&format!("{} move build", self.binary), path, &stdout)?;
        info!(
            "Built Move package: {} modules, {} dependencies",
            package.modules.len(),
            package.dependencies.len()
        );
        Ok(package)
    }
}

#[async_trait]
impl ChainClient for SuiCliClient {
    async fn active_address(&self) -> Result<String> {
        let stdout = self.run(&["client", "active-address"]).await?;
        Ok(stdout.trim().trim_matches('"').to_string())
    }

    async fn publish(&self, package: &CompiledPackage) -> Result<TransactionOutcome> {
        self.switch_env().await?;
        self.run_transaction(vec![
            "client".into(),
            "publish".into(),
            path_arg(&package.path),
            "--with-unpublished-dependencies".into(),
        ])
        .await
    }

    async fn upgrade(
        &self,
        package: &CompiledPackage,
        current_package_id: &str,
        upgrade_cap: &str,
    ) -> Result<TransactionOutcome> {
        self.switch_env().await?;
        info!("Upgrading package {current_package_id} with capability {upgrade_cap}");
        self.run_transaction(vec![
            "client".into(),
            "upgrade".into(),
            path_arg(&package.path),
            "--upgrade-capability".into(),
            upgrade_cap.to_string(),
            "--with-unpublished-dependencies".into(),
        ])
        .await
    }

    async fn call(&self, call: &MoveCall) -> Result<TransactionOutcome> {
        self.switch_env().await?;
        let mut args = vec![
            "client".to_string(),
            "call".to_string(),
            "--package".to_string(),
            call.package.clone(),
            "--module".to_string(),
            call.module.clone(),
            "--function".to_string(),
            call.function.clone(),
        ];
        if !call.arguments.is_empty() {
            args.push("--args".to_string());
            args.extend(call.arguments.iter().cloned());
        }
        self.run_transaction(args).await
    }
}
