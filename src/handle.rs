use std::{collections::BTreeMap, path::Path, time::Duration};

use chrono::Utc;
use eyre::eyre;
use tracing::warn;

use crate::{
    client::{explorer_tx_url, ChainClient, PackageBuilder},
    error::RegistryError,
    lineage::{self, PublishedPackage},
    lockfile::{self, LockPatch},
    object::{
        describe_deployments, DeploymentRecord, LastUpgrade, Network, Selector,
        DEFAULT_RECORD_KIND, PACKAGE,
    },
    registry::RegistryStore,
    resolver,
};

pub const ADMIN_ROLE: &str = "Admin";

/// What an upgrade changed, in the registry and in `Move.lock`
#[derive(Debug, Clone)]
pub struct UpgradeSummary {
    pub deployment_id: u64,
    pub new_package_id: String,
    pub last_upgrade: LastUpgrade,
    pub lock_patch: Option<LockPatch>,
}

/// Publish the package at `package_path` and record it as a new, inactive deployment
pub async fn deploy_package<C>(
    client: &C,
    store: &RegistryStore,
    network: Network,
    package_path: &Path,
    pause: Duration,
) -> eyre::Result<DeploymentRecord>
where
    C: ChainClient + PackageBuilder,
{
    let deployer_address = client.active_address().await?;
    println!("Deployer: {deployer_address}");

    let package = client.build(package_path).await?;
    println!("Deploying");
    tokio::time::sleep(pause).await;
    let outcome = client.publish(&package).await?;
    tokio::time::sleep(pause).await;

    println!("Transaction digest: {}", outcome.digest);
    println!("View transaction: {}", explorer_tx_url(network, &outcome.digest));

    let mut objects = outcome.created;
    let package_id = objects
        .remove(PACKAGE)
        .ok_or_else(|| eyre!("publish transaction {} created no package", outcome.digest))?;
    let published = PublishedPackage {
        kind: DEFAULT_RECORD_KIND.to_string(),
        digest: outcome.digest,
        package_id,
        objects,
        operators: BTreeMap::from([(ADMIN_ROLE.to_string(), deployer_address)]),
    };
    let record = store.transaction(|registry| {
        Ok::<_, RegistryError>(lineage::publish(registry, network, published, Utc::now()).clone())
    })?;

    println!("\nDEPLOYMENT SUCCESSFUL");
    println!("Deployment ID: {}", record.id);
    println!("Network: {network}");
    println!("Created: {}", record.created_at.to_rfc3339());
    println!("Package: {}", record.package_id);
    println!("\nDeployment saved to: {}", store.path().display());
    println!("\nTo make this deployment active, run the following command:\n");
    println!("runner --network {network} mark-active --id {}\n", record.id);
    Ok(record)
}

pub fn mark_active_deployment(
    store: &RegistryStore,
    network: Network,
    id: u64,
) -> eyre::Result<DeploymentRecord> {
    let record = store.transaction(|registry| {
        lineage::mark_active(registry, network, id).map(DeploymentRecord::clone)
    })?;

    println!("\nACTIVE DEPLOYMENT UPDATED");
    println!("Deployment ID: {}", record.id);
    println!("Network: {network}");
    println!("Created: {}", record.created_at.to_rfc3339());
    println!("Package: {}", record.package_id);
    println!("\nScripts using DEPLOYMENT_ID=active will now use this deployment.\n");
    Ok(record)
}

/// Upgrade the package of the resolved deployment, then mirror the new package id into `Move.lock`
///
/// Returns `None` when the upgrade transaction did not report a new package.
pub async fn upgrade_deployment<C>(
    client: &C,
    store: &RegistryStore,
    network: Network,
    selector: Selector,
    package_path: &Path,
) -> eyre::Result<Option<UpgradeSummary>>
where
    C: ChainClient + PackageBuilder,
{
    let deployer_address = client.active_address().await?;
    println!("Deployer: {deployer_address}");

    let (record, upgrade_cap) = store.read(|registry| {
        let record = resolver::resolve(registry, network, selector)?.record;
        let upgrade_cap = lineage::require_upgrade_cap(registry, network, record)?;
        Ok::<_, RegistryError>((record.clone(), upgrade_cap.to_string()))
    })?;

    let package = client.build(package_path).await?;
    let outcome = client
        .upgrade(&package, &record.package_id, &upgrade_cap)
        .await?;
    println!("Digest: {}", outcome.digest);
    println!("View transaction: {}", explorer_tx_url(network, &outcome.digest));

    let Some(new_package_id) = outcome.package_id() else {
        warn!("No new package ID found in upgrade result {}", outcome.digest);
        return Ok(None);
    };
    let last_upgrade = store.transaction(|registry| {
        lineage::apply_upgrade(
            registry,
            network,
            record.id,
            new_package_id,
            &outcome.digest,
            Utc::now(),
        )
    })?;

    let lock_patch = match lockfile::sync_file(
        lockfile::lock_file_path(package_path),
        network,
        new_package_id,
    ) {
        Ok(patch) => Some(patch),
        Err(RegistryError::LockFileMissing(path)) => {
            warn!("{} not found, skipping update", path.display());
            None
        }
        Err(e @ RegistryError::InvalidLockVersion { .. }) => {
            warn!(
                "{} left unchanged: {e}",
                lockfile::lock_file_path(package_path).display()
            );
            None
        }
        Err(e) => return Err(e.into()),
    };

    println!("\nUPGRADE SUCCESSFUL");
    println!("Deployment ID: {}", record.id);
    println!("Old Package: {}", last_upgrade.previous_package_id);
    println!("New Package: {new_package_id}\n");
    Ok(Some(UpgradeSummary {
        deployment_id: record.id,
        new_package_id: new_package_id.to_string(),
        last_upgrade,
        lock_patch,
    }))
}

pub fn list_deployments(store: &RegistryStore, network: Network) -> eyre::Result<()> {
    store.read(|registry| {
        let deployments = registry.deployments(network);
        println!("Deployments on {network}:");
        println!("{}", describe_deployments(deployments));
        for d in deployments {
            if let Some(last) = &d.last_upgrade {
                println!(
                    "  #{} package {} (upgraded from {} at {})",
                    d.id,
                    d.package_id,
                    last.previous_package_id,
                    last.upgraded_at.to_rfc3339()
                );
            }
        }
        Ok::<_, RegistryError>(())
    })?;
    Ok(())
}
