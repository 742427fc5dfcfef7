//! The chain client through which deployment transactions are submitted

use std::{future::Future, str::FromStr, time::Duration};

use alloy::{
    network::{Ethereum, TransactionBuilder},
    primitives::{Address, TxHash},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::{TransactionReceipt, TransactionRequest},
    signers::local::PrivateKeySigner,
    transports::http::reqwest::Url,
};
use tracing::{debug, info};

use crate::{
    constants::RECEIPT_POLL_INTERVAL,
    errors::ScriptError,
    types::{DeploymentResult, DeploymentTx},
};

/// Submits contract creation transactions on behalf of a deployer account
pub trait ChainClient {
    /// The address of the deploying account
    fn deployer(&self) -> Address;

    /// Broadcast the creation transaction and wait for it to be confirmed
    fn deploy(
        &self,
        tx: DeploymentTx,
    ) -> impl Future<Output = Result<DeploymentResult, ScriptError>>;
}

/// A [`ChainClient`] talking to a node over JSON-RPC, signing locally
pub struct RpcClient {
    /// The signing provider
    provider: DynProvider<Ethereum>,
    /// The deployer's address
    deployer: Address,
    /// The number of confirmations to wait for, at least 1
    confirmations: u64,
    /// How long to wait for the confirmations, if bounded
    timeout: Option<Duration>,
}

/// Sets up the client with which to deploy contracts, connecting to the
/// node at `rpc_url` and signing with `priv_key`
pub async fn setup_client(
    priv_key: &str,
    rpc_url: &str,
    confirmations: u64,
    timeout: Option<Duration>,
) -> Result<RpcClient, ScriptError> {
    let signer = PrivateKeySigner::from_str(priv_key)
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    let deployer = signer.address();

    let url = Url::parse(rpc_url).map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    let provider = ProviderBuilder::new().wallet(signer).connect_http(url);
    let provider = DynProvider::new(provider);

    let chain_id = provider
        .get_chain_id()
        .await
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    info!("connected to chain {} as {}", chain_id, deployer);

    Ok(RpcClient {
        provider,
        deployer,
        confirmations: confirmations.max(1),
        timeout,
    })
}

impl ChainClient for RpcClient {
    fn deployer(&self) -> Address {
        self.deployer
    }

    async fn deploy(&self, tx: DeploymentTx) -> Result<DeploymentResult, ScriptError> {
        let mut request = TransactionRequest::default()
            .with_deploy_code(tx.init_code)
            .with_value(tx.value);
        if let Some(gas_limit) = tx.gas_limit {
            request = request.with_gas_limit(gas_limit);
        }

        let pending = self
            .provider
            .send_transaction(request)
            .await
            .map_err(|e| ScriptError::ContractDeployment(e.to_string()))?;

        let tx_hash = *pending.tx_hash();
        debug!(
            "deployment transaction {} sent, awaiting {} confirmation(s)",
            tx_hash, self.confirmations
        );

        let receipt = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.await_receipt(tx_hash))
                .await
                .map_err(|_| {
                    ScriptError::ContractDeployment(format!(
                        "timed out after {:?} awaiting {} confirmation(s) of {}",
                        timeout, self.confirmations, tx_hash
                    ))
                })??,
            None => self.await_receipt(tx_hash).await?,
        };

        check_receipt(&receipt)
    }
}

impl RpcClient {
    /// Poll for the receipt of `tx_hash` until it has the required number of
    /// confirmations.
    ///
    /// Watching the pending transaction through alloy is unreliable against
    /// some nodes, so the receipt is fetched directly.
    async fn await_receipt(&self, tx_hash: TxHash) -> Result<TransactionReceipt, ScriptError> {
        loop {
            let receipt = self
                .provider
                .get_transaction_receipt(tx_hash)
                .await
                .map_err(|e| ScriptError::ContractDeployment(e.to_string()))?;

            if let Some(included) = receipt.as_ref().and_then(|r| r.block_number) {
                let head = self
                    .provider
                    .get_block_number()
                    .await
                    .map_err(|e| ScriptError::ContractDeployment(e.to_string()))?;

                if confirmations_reached(head, included, self.confirmations) {
                    return receipt.ok_or_else(|| {
                        ScriptError::ContractDeployment(format!("no receipt for {tx_hash}"))
                    });
                }
            }

            tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
        }
    }
}

/// Whether a transaction included in block `included` has `required`
/// confirmations once the chain head is at `head`
pub fn confirmations_reached(head: u64, included: u64, required: u64) -> bool {
    head >= included && head - included + 1 >= required
}

/// Check that a mined creation transaction succeeded and created a contract
pub fn check_receipt(receipt: &TransactionReceipt) -> Result<DeploymentResult, ScriptError> {
    let tx_hash = receipt.transaction_hash;
    if !receipt.status() {
        return Err(ScriptError::ContractDeployment(format!(
            "deployment transaction {tx_hash} reverted"
        )));
    }

    let address = receipt.contract_address.ok_or_else(|| {
        ScriptError::ContractDeployment(format!("receipt for {tx_hash} has no contract address"))
    })?;

    Ok(DeploymentResult {
        address,
        tx_hash,
        block_number: receipt.block_number,
        gas_used: receipt.gas_used,
    })
}
