use {
    alloy::{
        network::{ReceiptResponse, TransactionBuilder},
        primitives::{Address, Bytes, TxHash},
        providers::Provider,
        rpc::types::TransactionRequest,
    },
    anyhow::{Context, Result, ensure},
    ethrpc::Web3,
    std::time::Duration,
};

/// A confirmed contract creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub contract: String,
    pub address: Address,
    pub transaction_hash: TxHash,
    pub block_number: Option<u64>,
}

/// Submits contract creation transactions.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ContractDeploying: Send + Sync {
    /// The account the deployments are sent from.
    fn deployer(&self) -> Address;

    /// Sends a transaction creating `contract` from `code` and waits until it
    /// is confirmed. Fails if the transaction reverts.
    async fn deploy(&self, contract: &str, code: Bytes) -> Result<Deployment>;
}

/// Deploys contracts on the chain behind a [`Web3`].
pub struct OnchainDeployer {
    web3: Web3,
    confirmations: u64,
    receipt_timeout: Duration,
}

impl OnchainDeployer {
    pub fn new(web3: Web3, confirmations: u64, receipt_timeout: Duration) -> Self {
        Self {
            web3,
            confirmations,
            receipt_timeout,
        }
    }
}

#[async_trait::async_trait]
impl ContractDeploying for OnchainDeployer {
    fn deployer(&self) -> Address {
        self.web3.account.address()
    }

    async fn deploy(&self, contract: &str, code: Bytes) -> Result<Deployment> {
        let tx = TransactionRequest::default()
            .with_from(self.deployer())
            .with_deploy_code(code);
        let pending = self
            .web3
            .provider
            .send_transaction(tx)
            .await
            .context("failed to submit deployment transaction")?;
        let transaction_hash = *pending.tx_hash();
        tracing::debug!(contract, ?transaction_hash, "submitted deployment transaction");

        let receipt = pending
            .with_required_confirmations(self.confirmations)
            .with_timeout(Some(self.receipt_timeout))
            .get_receipt()
            .await
            .with_context(|| format!("deployment transaction {transaction_hash} not confirmed"))?;
        ensure!(
            receipt.status(),
            "deployment transaction {transaction_hash} reverted"
        );
        let address = receipt.contract_address().with_context(|| {
            format!("receipt of {transaction_hash} does not contain a contract address")
        })?;

        Ok(Deployment {
            contract: contract.to_string(),
            address,
            transaction_hash,
            block_number: receipt.block_number(),
        })
    }
}
