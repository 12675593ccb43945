use std::path::PathBuf;

use bridge_nft_operations::{load_receivers, mint_batch, BridgeNft};
use clap::Parser;
use sui_deploy_runner::{
    client::ChainClient,
    config::{init_logging, RunnerArgs, BATCH_PAUSE},
    load_deployment,
};

/// Mint one bridge NFT to every address in the receivers file
#[derive(Parser)]
struct Args {
    #[command(flatten)]
    runner: RunnerArgs,

    /// JSON array of receiver addresses
    #[arg(long, default_value = "receivers.json")]
    receivers: PathBuf,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    init_logging();
    let args = Args::parse();
    let runner = args.runner;

    let deployment = load_deployment(
        &runner.registry,
        runner.network,
        runner.deployment.clone(),
    )?;
    let nft = BridgeNft::from_deployment(&deployment)?;
    let client = runner.client();
    println!("Deployer: {}", client.active_address().await?);

    let receivers = load_receivers(&args.receivers)?;
    println!("\nFound {} receiver(s) to mint to", receivers.len());
    println!("Network: {}", runner.network);

    mint_batch(&client, runner.network, &nft, &receivers, BATCH_PAUSE)
        .await
        .print();
    Ok(())
}
