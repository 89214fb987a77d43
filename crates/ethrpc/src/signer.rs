use {
    crate::AlloyProvider,
    alloy::{
        primitives::Address,
        providers::Provider,
        signers::local::{MnemonicBuilder, PrivateKeySigner, coins_bip39::English},
    },
    anyhow::{Context, Result},
    std::fmt::{self, Display, Formatter},
};

/// The account that authorizes transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Account {
    /// Transactions get signed by a key held by this process.
    Local(Address),
    /// Transactions get signed by the node.
    Node(Address),
}

impl Account {
    pub fn address(&self) -> Address {
        match self {
            Self::Local(address) | Self::Node(address) => *address,
        }
    }
}

impl Display for Account {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(address) => write!(f, "{address} (local key)"),
            Self::Node(address) => write!(f, "{address} (node managed)"),
        }
    }
}

/// Parses a hex encoded secp256k1 private key. The `0x` prefix is optional.
pub fn from_private_key(key: &str) -> Result<PrivateKeySigner> {
    key.trim()
        .parse()
        .context("private key is not a valid hex encoded secp256k1 key")
}

/// Derives the signer at `index` of the standard Ethereum derivation path
/// `m/44'/60'/0'/0/{index}` from a BIP-39 mnemonic.
pub fn from_mnemonic(phrase: &str, index: u32) -> Result<PrivateKeySigner> {
    MnemonicBuilder::<English>::default()
        .phrase(phrase.trim())
        .index(index)
        .context("invalid derivation index")?
        .build()
        .context("mnemonic does not derive a valid key")
}

/// Returns the first account the node signs for.
pub async fn node_account(provider: &AlloyProvider) -> Result<Address> {
    let accounts = provider
        .get_accounts()
        .await
        .context("eth_accounts request failed")?;
    accounts
        .first()
        .copied()
        .context("no signer available: node does not manage any accounts")
}
