use clap::{Parser, Subcommand};

use sui_deploy_runner::config::RunnerArgs;

#[derive(Parser)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub runner: RunnerArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Publish the Move package as a new deployment, which stays inactive until marked active
    Deploy,
    /// Upgrade the package of the selected deployment and sync `Move.lock`
    Upgrade,
    /// Mark a deployment as the active one for the network
    MarkActive {
        /// The deployment id that scripts using `active` will operate on
        #[arg(long, env = "DEPLOYMENT_ID")]
        id: u64,
    },
    /// List recorded deployments of the network
    List,
}
