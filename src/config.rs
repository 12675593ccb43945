use std::{path::PathBuf, time::Duration};

use clap::Args;
use tracing_subscriber::EnvFilter;

use crate::{
    client::SuiCliClient,
    object::{Network, Selector},
    registry::{RegistryStore, DEFAULT_REGISTRY_PATH},
};

/// Pause inserted around publish transactions so the faucet and indexer can catch up
pub const DEPLOY_PAUSE: Duration = Duration::from_secs(3);
/// Pause between consecutive calls of a batch
pub const BATCH_PAUSE: Duration = Duration::from_secs(2);

/// Settings shared by the runner and the operator scripts, each one overridable from the environment
#[derive(Args, Debug, Clone)]
pub struct RunnerArgs {
    /// The network to operate on, options are `testnet`, `mainnet`, `devnet`
    #[arg(short, long, env = "DEPLOY_ON", default_value_t = Network::Testnet)]
    pub network: Network,

    /// Which deployment to operate on, `active` or a deployment id
    #[arg(long, env = "DEPLOYMENT_ID", default_value_t = Selector::Active)]
    pub deployment: Selector,

    /// The deployment registry document
    #[arg(long, env = "DEPLOYMENT_REGISTRY", default_value = DEFAULT_REGISTRY_PATH)]
    pub registry: PathBuf,

    /// Directory of the Move package, which also holds its `Move.lock`
    #[arg(long, env = "MOVE_PACKAGE_PATH", default_value = ".")]
    pub package_path: PathBuf,

    /// The `sui` binary used to build and send transactions
    #[arg(long, env = "SUI_BIN", default_value = "sui")]
    pub sui_bin: String,

    /// Gas budget in MIST, if None, the CLI estimates one
    #[arg(long, env = "GAS_BUDGET")]
    pub gas_budget: Option<u64>,
}

impl RunnerArgs {
    pub fn store(&self) -> RegistryStore {
        RegistryStore::new(&self.registry)
    }

    pub fn client(&self) -> SuiCliClient {
        SuiCliClient::new(self.sui_bin.clone(), self.network, self.gas_budget)
    }
}

/// Load `.env` and install the tracing subscriber, `RUST_LOG` overrides the default `info` level
pub fn init_logging() {
    let _ = dotenvy::dotenv();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .try_init();
}
