use std::{collections::BTreeMap, convert::Infallible, fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};

use crate::error::RegistryError;

pub const DEFAULT_RECORD_KIND: &str = "bridgeToken";
pub const UPGRADE_CAP: &str = "UpgradeCap";
pub const PACKAGE: &str = "Package";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Network {
    Testnet,
    Mainnet,
    Devnet,
}

impl Network {
    /// Networks every registry document carries, even before the first publish
    pub const ALL: [Network; 3] = [Network::Testnet, Network::Mainnet, Network::Devnet];

    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Testnet => "testnet",
            Network::Mainnet => "mainnet",
            Network::Devnet => "devnet",
        }
    }
}

impl Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Network {
    type Err = RegistryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "testnet" => Ok(Network::Testnet),
            "mainnet" => Ok(Network::Mainnet),
            "devnet" => Ok(Network::Devnet),
            _ => Err(RegistryError::UnknownNetwork(value.to_string())),
        }
    }
}

/// Which deployment an operation should run against
///
/// Text that is neither `active` nor a positive id is kept as `Unmatched`, it
/// selects nothing and resolution falls back to the active record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selector {
    #[default]
    Active,
    Id(u64),
    Unmatched(String),
}

impl Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Selector::Active => write!(f, "active"),
            Selector::Id(id) => write!(f, "{id}"),
            Selector::Unmatched(raw) => write!(f, "{raw}"),
        }
    }
}

impl FromStr for Selector {
    type Err = Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value == "active" {
            return Ok(Selector::Active);
        }
        Ok(match value.parse::<u64>() {
            Ok(id) if id > 0 => Selector::Id(id),
            _ => Selector::Unmatched(value.to_string()),
        })
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LastUpgrade {
    #[serde(rename = "previousPackage")]
    pub previous_package_id: String,
    pub upgraded_at: DateTime<Utc>,
    #[serde(rename = "digest")]
    pub tx_digest: String,
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DeploymentRecord {
    #[serde(rename = "type", default = "default_record_kind")]
    pub kind: String,
    pub id: u64,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub digest: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "Package")]
    pub package_id: String,
    #[serde(rename = "Objects", default)]
    pub objects: BTreeMap<String, String>,
    #[serde(rename = "Operators", default)]
    pub operators: BTreeMap<String, String>,
    #[serde(
        rename = "lastUpgrade",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_upgrade: Option<LastUpgrade>,
}

fn default_record_kind() -> String {
    DEFAULT_RECORD_KIND.to_string()
}

impl DeploymentRecord {
    /// The capability object that authorizes upgrades, if one was captured at publish time
    pub fn upgrade_cap(&self) -> Option<&str> {
        self.objects
            .get(UPGRADE_CAP)
            .map(String::as_str)
            .filter(|cap| !cap.is_empty())
    }

    pub fn object(&self, name: &str) -> Option<&str> {
        self.objects.get(name).map(String::as_str)
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkDeployments {
    #[serde(default)]
    pub deployments: Vec<DeploymentRecord>,
}

/// The whole registry document, one entry per network
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct NetworkRegistry {
    pub networks: BTreeMap<String, NetworkDeployments>,
}

impl NetworkRegistry {
    pub fn empty() -> Self {
        let networks = Network::ALL
            .iter()
            .map(|network| (network.to_string(), NetworkDeployments::default()))
            .collect();
        Self { networks }
    }

    pub fn deployments(&self, network: Network) -> &[DeploymentRecord] {
        self.networks
            .get(network.as_str())
            .map(|entry| entry.deployments.as_slice())
            .unwrap_or_default()
    }

    pub fn deployments_mut(&mut self, network: Network) -> &mut Vec<DeploymentRecord> {
        &mut self
            .networks
            .entry(network.to_string())
            .or_default()
            .deployments
    }
}

/// Render one line per record so an operator can pick a valid selector
pub fn describe_deployments(deployments: &[DeploymentRecord]) -> String {
    if deployments.is_empty() {
        return "  (none)".to_string();
    }
    deployments
        .iter()
        .map(|d| {
            let active_marker = if d.active { " [ACTIVE]" } else { "" };
            format!("  - #{} ({}){active_marker}", d.id, d.created_at.to_rfc3339())
        })
        .collect::<Vec<_>>()
        .join("\n")
}
