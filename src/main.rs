use clap::Parser;

mod command;

use command::{Cli, Commands};
use sui_deploy_runner::{
    config::{init_logging, DEPLOY_PAUSE},
    handle::*,
};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    init_logging();
    let cli = Cli::parse();
    let runner = cli.runner;
    let store = runner.store();
    match cli.command {
        Commands::Deploy => {
            deploy_package(
                &runner.client(),
                &store,
                runner.network,
                &runner.package_path,
                DEPLOY_PAUSE,
            )
            .await?;
        }
        Commands::Upgrade => {
            upgrade_deployment(
                &runner.client(),
                &store,
                runner.network,
                runner.deployment.clone(),
                &runner.package_path,
            )
            .await?;
        }
        Commands::MarkActive { id } => {
            mark_active_deployment(&store, runner.network, id)?;
        }
        Commands::List => list_deployments(&store, runner.network)?,
    }
    Ok(())
}
