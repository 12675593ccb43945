use bridge_nft_operations::{transfer_ownership, BridgeNft};
use clap::Parser;
use sui_deploy_runner::{
    client::{explorer_tx_url, ChainClient},
    config::{init_logging, RunnerArgs},
    load_deployment,
};

/// Start a two-step ownership transfer of the bridge NFT package
#[derive(Parser)]
struct Args {
    #[command(flatten)]
    runner: RunnerArgs,

    /// Address that must accept the ownership afterwards
    #[arg(long, env = "NEW_OWNER")]
    new_owner: String,
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
    println!("Current owner: {}", client.active_address().await?);
    println!("\nTransferring ownership to: {}", args.new_owner);
    println!("Network: {}\n", runner.network);

    let outcome = transfer_ownership(&client, &nft, &args.new_owner).await?;
    println!("Ownership transfer initiated successfully!");
    println!("TX Digest: {}", outcome.digest);
    println!("View transaction: {}", explorer_tx_url(runner.network, &outcome.digest));
    println!(
        "\nThe new owner ({}) must now accept ownership by running:",
        args.new_owner
    );
    println!("cargo run -p bridge-nft-operations --example accept_ownership");
    Ok(())
}
