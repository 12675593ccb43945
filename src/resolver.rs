use tracing::{info, warn};

use crate::{
    error::{RegistryError, Result},
    object::{describe_deployments, DeploymentRecord, Network, NetworkRegistry, Selector},
};

/// The deployment an operation will run against
#[derive(Debug, Clone)]
pub struct Resolution<'a> {
    pub record: &'a DeploymentRecord,
    /// Set when the requested selector matched nothing and the active record was used instead
    pub fallback_notice: Option<String>,
}

impl Resolution<'_> {
    pub fn fell_back(&self) -> bool {
        self.fallback_notice.is_some()
    }
}

/// Pick exactly one record: the requested one if it exists, otherwise whatever is active
pub fn resolve(
    registry: &NetworkRegistry,
    network: Network,
    selector: Selector,
) -> Result<Resolution<'_>> {
    let deployments = registry.deployments(network);
    if deployments.is_empty() {
        return Err(RegistryError::NoDeployments { network });
    }

    let find_active = || deployments.iter().find(|d| d.active);
    let requested = match &selector {
        Selector::Active => {
            let active = find_active();
            if active.is_none() {
                warn!("No active deployment set for {network}, use `mark-active` to set one");
            }
            active
        }
        Selector::Id(id) => {
            let found = deployments.iter().find(|d| d.id == *id);
            if found.is_none() {
                warn!("Deployment #{id} not found on {network}");
            }
            found
        }
        Selector::Unmatched(raw) => {
            warn!("`{raw}` is not a deployment id, ids are positive integers");
            None
        }
    };

    if let Some(record) = requested {
        info!(
            "Using deployment #{} (created: {})",
            record.id,
            record.created_at.to_rfc3339()
        );
        return Ok(Resolution {
            record,
            fallback_notice: None,
        });
    }

    match find_active() {
        Some(record) => {
            let notice = format!("Falling back to active deployment #{}", record.id);
            warn!("{notice}");
            Ok(Resolution {
                record,
                fallback_notice: Some(notice),
            })
        }
        None => Err(RegistryError::NoUsableDeployment {
            network,
            available: describe_deployments(deployments),
        }),
    }
}
