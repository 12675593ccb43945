use bridge_nft_operations::{accept_ownership, BridgeNft};
use clap::Parser;
use sui_deploy_runner::{
    client::{explorer_tx_url, ChainClient},
    config::{init_logging, RunnerArgs},
    load_deployment,
};

/// Accept a pending ownership transfer as the active `sui` address
#[derive(Parser)]
struct Args {
    #[command(flatten)]
    runner: RunnerArgs,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    init_logging();
    let runner = Args::parse().runner;

    let deployment = load_deployment(
        &runner.registry,
        runner.network,
        runner.deployment.clone(),
    )?;
    let nft = BridgeNft::from_deployment(&deployment)?;
    let client = runner.client();
    let address = client.active_address().await?;
    println!("Accepting ownership as: {address}");
    println!("Network: {}\n", runner.network);

    let outcome = accept_ownership(&client, &nft).await.map_err(|e| {
        eyre::eyre!("{e}\nMake sure that ownership was transferred to this address first")
    })?;
    println!("Ownership accepted successfully!");
    println!("New owner: {address}");
    println!("View transaction: {}", explorer_tx_url(runner.network, &outcome.digest));
    Ok(())
}
