use std::time::Duration;

use sui_deploy_runner::{
    client::{explorer_tx_url, ChainClient, TransactionOutcome},
    Network,
};
use tracing::{error, info};

use crate::{BridgeNft, OperationError};

/// Tally of a batch, failures never abort the remaining items
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MintReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

pub async fn mint<C: ChainClient>(
    client: &C,
    nft: &BridgeNft,
    receiver: &str,
) -> Result<TransactionOutcome, OperationError> {
    Ok(client.call(&nft.mint_call(receiver)).await?)
}

pub async fn transfer_ownership<C: ChainClient>(
    client: &C,
    nft: &BridgeNft,
    new_owner: &str,
) -> Result<TransactionOutcome, OperationError> {
    Ok(client.call(&nft.transfer_ownership_call(new_owner)).await?)
}

pub async fn accept_ownership<C: ChainClient>(
    client: &C,
    nft: &BridgeNft,
) -> Result<TransactionOutcome, OperationError> {
    Ok(client.call(&nft.accept_ownership_call()).await?)
}

/// Mint one NFT to each receiver in order, pausing between successful mints
pub async fn mint_batch<C: ChainClient>(
    client: &C,
    network: Network,
    nft: &BridgeNft,
    receivers: &[String],
    pause: Duration,
) -> MintReport {
    let mut report = MintReport {
        total: receivers.len(),
        ..Default::default()
    };
    for (i, receiver) in receivers.iter().enumerate() {
        println!("\n[{}/{}] Minting to: {receiver}", i + 1, receivers.len());
        match mint(client, nft, receiver).await {
            Ok(outcome) => {
                info!("Minted to {receiver} successfully");
                println!("View transaction: {}", explorer_tx_url(network, &outcome.digest));
                report.succeeded += 1;
                if i + 1 < receivers.len() {
                    tokio::time::sleep(pause).await;
                }
            }
            Err(e) => {
                error!("Mint to {receiver} failed: {e}");
                report.failed += 1;
            }
        }
    }
    report
}

impl MintReport {
    pub fn print(&self) {
        println!("\nMINTING COMPLETE");
        println!("Total: {}", self.total);
        println!("Success: {}", self.succeeded);
        println!("Failed: {}", self.failed);
    }
}
