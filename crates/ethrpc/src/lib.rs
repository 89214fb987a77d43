mod instrumentation;
pub mod signer;

pub use signer::Account;
use {
    alloy::{
        network::EthereumWallet,
        providers::{DynProvider, Provider, ProviderBuilder},
        rpc::client::ClientBuilder,
    },
    anyhow::Context,
    instrumentation::InstrumentationLayer,
    url::Url,
};

pub type AlloyProvider = DynProvider;

/// A provider together with the account that authorizes the transactions
/// sent through it.
#[derive(Debug, Clone)]
pub struct Web3 {
    pub provider: AlloyProvider,
    pub account: Account,
}

impl Web3 {
    /// Connects to the node at `url`.
    ///
    /// With a local signer transactions get signed by this process. Without
    /// one the first account managed by the node is used and the node signs
    /// (Hardhat and Anvil dev accounts).
    pub async fn connect(
        url: &Url,
        signer: Option<alloy::signers::local::PrivateKeySigner>,
    ) -> anyhow::Result<Self> {
        match signer {
            Some(signer) => {
                let account = Account::Local(signer.address());
                let provider = provider(url, Some(EthereumWallet::new(signer)));
                Ok(Self { provider, account })
            }
            None => {
                let provider = provider(url, None);
                let address = signer::node_account(&provider)
                    .await
                    .context("could not resolve a node managed account")?;
                Ok(Self {
                    provider,
                    account: Account::Node(address),
                })
            }
        }
    }
}

/// Creates an instrumented HTTP provider. Transactions are signed by
/// `wallet` if one is given.
pub fn provider(url: &Url, wallet: Option<EthereumWallet>) -> AlloyProvider {
    let rpc = ClientBuilder::default()
        .layer(InstrumentationLayer {
            label: "main".into(),
        })
        .http(url.clone());
    match wallet {
        Some(wallet) => ProviderBuilder::new()
            .wallet(wallet)
            .connect_client(rpc)
            .erased(),
        None => ProviderBuilder::new().connect_client(rpc).erased(),
    }
}
