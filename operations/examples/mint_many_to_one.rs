use std::path::PathBuf;

use bridge_nft_operations::{load_receivers, mint_batch, BridgeNft};
use clap::Parser;
use sui_deploy_runner::{
    client::ChainClient,
    config::{init_logging, RunnerArgs, BATCH_PAUSE},
    load_deployment,
};

/// Mint several bridge NFTs to the first address of the receivers file
#[derive(Parser)]
struct Args {
    #[command(flatten)]
    runner: RunnerArgs,

    /// JSON array of receiver addresses, only the first one is used
    #[arg(long, default_value = "receivers.json")]
    receivers: PathBuf,

    /// How many NFTs to mint
    #[arg(long, default_value_t = 5)]
    count: usize,
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
    let receiver = receivers[0].clone();
    println!("\nMinting {} NFT(s) to: {receiver}", args.count);
    println!("Network: {}", runner.network);

    let repeated = vec![receiver; args.count];
    mint_batch(&client, runner.network, &nft, &repeated, BATCH_PAUSE)
        .await
        .print();
    Ok(())
}
