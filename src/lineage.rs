use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::{
    error::{RegistryError, Result},
    object::{describe_deployments, DeploymentRecord, LastUpgrade, Network, NetworkRegistry},
};

/// Everything captured from a publish transaction that becomes a new lineage root
#[derive(Debug, Clone)]
pub struct PublishedPackage {
    pub kind: String,
    pub digest: String,
    pub package_id: String,
    /// Created objects other than the package itself, e.g. `UpgradeCap`
    pub objects: BTreeMap<String, String>,
    pub operators: BTreeMap<String, String>,
}

pub fn next_id(deployments: &[DeploymentRecord]) -> u64 {
    deployments.iter().map(|d| d.id).max().unwrap_or(0) + 1
}

/// Append a new, inactive record for a freshly published package
pub fn publish(
    registry: &mut NetworkRegistry,
    network: Network,
    package: PublishedPackage,
    now: DateTime<Utc>,
) -> &DeploymentRecord {
    let deployments = registry.deployments_mut(network);
    let record = DeploymentRecord {
        kind: package.kind,
        id: next_id(deployments),
        active: false,
        digest: package.digest,
        created_at: now,
        package_id: package.package_id,
        objects: package.objects,
        operators: package.operators,
        last_upgrade: None,
    };
    info!("Recorded deployment #{} on {network}", record.id);
    deployments.push(record);
    &deployments[deployments.len() - 1]
}

/// Make `id` the only active record of `network`
pub fn mark_active(
    registry: &mut NetworkRegistry,
    network: Network,
    id: u64,
) -> Result<&DeploymentRecord> {
    let deployments = registry.deployments_mut(network);
    let Some(index) = deployments.iter().position(|d| d.id == id) else {
        return Err(RegistryError::DeploymentNotFound {
            network,
            id,
            available: describe_deployments(deployments),
        });
    };
    for deployment in deployments.iter_mut() {
        deployment.active = false;
    }
    deployments[index].active = true;
    info!("Deployment #{id} is now active on {network}");
    Ok(&deployments[index])
}

pub fn require_upgrade_cap<'a>(
    registry: &NetworkRegistry,
    network: Network,
    record: &'a DeploymentRecord,
) -> Result<&'a str> {
    record
        .upgrade_cap()
        .ok_or_else(|| RegistryError::MissingUpgradeCapability {
            network,
            id: record.id,
            available: describe_deployments(registry.deployments(network)),
        })
}

/// Point an existing lineage at its upgraded package
///
/// Only `Package` and `lastUpgrade` change; the previous upgrade entry is overwritten.
pub fn apply_upgrade(
    registry: &mut NetworkRegistry,
    network: Network,
    id: u64,
    new_package_id: &str,
    tx_digest: &str,
    now: DateTime<Utc>,
) -> Result<LastUpgrade> {
    let deployments = registry.deployments_mut(network);
    let Some(record) = deployments.iter_mut().find(|d| d.id == id) else {
        return Err(RegistryError::DeploymentNotFound {
            network,
            id,
            available: describe_deployments(deployments),
        });
    };
    let previous_package_id = std::mem::replace(&mut record.package_id, new_package_id.to_string());
    let last_upgrade = LastUpgrade {
        previous_package_id,
        upgraded_at: now,
        tx_digest: tx_digest.to_string(),
    };
    record.last_upgrade = Some(last_upgrade.clone());
    info!(
        "Deployment #{id} on {network} upgraded {} -> {new_package_id}",
        last_upgrade.previous_package_id
    );
    Ok(last_upgrade)
}
