use {
    crate::deployment::MarketParameters,
    alloy::{primitives::Address, signers::local::PrivateKeySigner},
    anyhow::{Context, Result},
    std::{
        fmt::{self, Display, Formatter},
        path::PathBuf,
        time::Duration,
    },
    tracing::level_filters::LevelFilter,
    url::Url,
};

#[derive(clap::Parser)]
#[command(version, about = "Deploys the CourtFactory and Market contracts")]
pub struct Arguments {
    #[clap(flatten)]
    pub logging: LoggingArguments,

    /// The Ethereum node URL to connect to.
    #[clap(long, env, default_value = "http://localhost:8545")]
    pub node_url: Url,

    /// Hex encoded private key of the deployer. Without a private key or a
    /// mnemonic the first account managed by the node deploys.
    #[clap(long, env, hide_env_values = true, conflicts_with = "mnemonic")]
    pub private_key: Option<String>,

    /// BIP-39 mnemonic the deployer key gets derived from.
    #[clap(long, env, hide_env_values = true)]
    pub mnemonic: Option<String>,

    /// Account index on the standard derivation path of `--mnemonic`.
    #[clap(long, env, default_value = "0")]
    pub mnemonic_index: u32,

    /// Directory containing the Hardhat compiler artifacts.
    #[clap(long, env, default_value = "artifacts")]
    pub artifacts: PathBuf,

    /// Number of blocks a deployment has to be buried under before the next
    /// step starts.
    #[clap(
        long,
        env,
        default_value = "1",
        value_parser = clap::value_parser!(u64).range(1..),
    )]
    pub confirmations: u64,

    /// How long to wait for a deployment to get confirmed.
    #[clap(
        long,
        env,
        default_value = "5m",
        value_parser = humantime::parse_duration,
    )]
    pub receipt_timeout: Duration,

    #[clap(flatten)]
    pub market: MarketArguments,
}

#[derive(clap::Parser)]
pub struct LoggingArguments {
    #[clap(
        long,
        env,
        default_value = "warn,deploy_market=debug,contracts=debug,ethrpc=debug"
    )]
    pub log_filter: String,

    #[clap(long, env, default_value = "error")]
    pub log_stderr_threshold: LevelFilter,

    /// Output log events as JSON.
    #[clap(long, env)]
    pub log_json: bool,
}

/// Constructor arguments of the Market contract. The CourtFactory address
/// is not configurable, it always comes from the preceding deployment.
#[derive(clap::Parser)]
pub struct MarketArguments {
    /// Label of the traded pair.
    #[clap(long, env, default_value = "wETH/INR")]
    pub market_pair: String,

    /// Human readable description of the market.
    #[clap(long, env, default_value = "Eth to Inr p2p trade")]
    pub market_description: String,

    /// The ERC20 token traded on the market.
    #[clap(long, env, default_value = "0xa6fa4fb5f76172d178d61b04b0ecd319c5d1c0aa")]
    pub market_token: Address,

    /// Comma separated list of the parties permitted on the market.
    #[clap(
        long,
        env,
        use_value_delimiter = true,
        num_args = 1..,
        default_value = "0xD3db9D11c09cECd2E91bdE73F710dE6094179FA0",
    )]
    pub market_parties: Vec<Address>,
}

impl Arguments {
    /// The locally held deployer key, if one is configured.
    pub fn signer(&self) -> Result<Option<PrivateKeySigner>> {
        match (&self.private_key, &self.mnemonic) {
            (Some(key), _) => ethrpc::signer::from_private_key(key).map(Some),
            (None, Some(phrase)) => ethrpc::signer::from_mnemonic(phrase, self.mnemonic_index)
                .with_context(|| format!("mnemonic index {}", self.mnemonic_index))
                .map(Some),
            (None, None) => Ok(None),
        }
    }
}

impl LoggingArguments {
    pub fn config(&self) -> observe::config::Config {
        observe::config::Config::new(&self.log_filter, self.log_stderr_threshold, self.log_json)
    }
}

impl MarketArguments {
    pub fn parameters(&self) -> MarketParameters {
        MarketParameters {
            pair: self.market_pair.clone(),
            description: self.market_description.clone(),
            token: self.market_token,
            parties: self.market_parties.clone(),
        }
    }
}

impl Display for Arguments {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Self {
            logging,
            node_url,
            private_key,
            mnemonic,
            mnemonic_index,
            artifacts,
            confirmations,
            receipt_timeout,
            market,
        } = self;

        write!(f, "{logging}")?;
        writeln!(f, "node_url: {node_url}")?;
        display_secret_option(f, "private_key", private_key)?;
        display_secret_option(f, "mnemonic", mnemonic)?;
        writeln!(f, "mnemonic_index: {mnemonic_index}")?;
        writeln!(f, "artifacts: {}", artifacts.display())?;
        writeln!(f, "confirmations: {confirmations}")?;
        writeln!(f, "receipt_timeout: {receipt_timeout:?}")?;
        write!(f, "{market}")?;
        Ok(())
    }
}

impl Display for LoggingArguments {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Self {
            log_filter,
            log_stderr_threshold,
            log_json,
        } = self;

        writeln!(f, "log_filter: {log_filter}")?;
        writeln!(f, "log_stderr_threshold: {log_stderr_threshold}")?;
        writeln!(f, "log_json: {log_json}")?;
        Ok(())
    }
}

impl Display for MarketArguments {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Self {
            market_pair,
            market_description,
            market_token,
            market_parties,
        } = self;

        writeln!(f, "market_pair: {market_pair}")?;
        writeln!(f, "market_description: {market_description}")?;
        writeln!(f, "market_token: {market_token}")?;
        display_list(f, "market_parties", market_parties)?;
        Ok(())
    }
}

fn display_secret_option<T>(f: &mut Formatter<'_>, name: &str, option: &Option<T>) -> fmt::Result {
    match option {
        Some(_) => writeln!(f, "{name}: SECRET"),
        None => writeln!(f, "{name}: None"),
    }
}

fn display_list<T>(f: &mut Formatter<'_>, name: &str, iter: impl IntoIterator<Item = T>) -> fmt::Result
where
    T: Display,
{
    write!(f, "{name}: [")?;
    for (i, t) in iter.into_iter().enumerate() {
        if i != 0 {
            f.write_str(", ")?;
        }
        write!(f, "{t}")?;
    }
    writeln!(f, "]")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use {super::*, alloy::primitives::address, clap::Parser};

    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn defaults_match_the_wethinr_market() {
        let args = Arguments::try_parse_from(["deploy-market"]).unwrap();

        assert_eq!(args.node_url.as_str(), "http://localhost:8545/");
        assert_eq!(args.artifacts, PathBuf::from("artifacts"));
        assert_eq!(args.confirmations, 1);
        assert_eq!(args.receipt_timeout, Duration::from_secs(300));
        assert_eq!(
            args.market.parameters(),
            MarketParameters {
                pair: "wETH/INR".into(),
                description: "Eth to Inr p2p trade".into(),
                token: address!("0xa6fa4fb5f76172d178d61b04b0ecd319c5d1c0aa"),
                parties: vec![address!("0xD3db9D11c09cECd2E91bdE73F710dE6094179FA0")],
            }
        );
        assert!(args.signer().unwrap().is_none());
    }

    #[test]
    fn default_logging_includes_rpc_requests() {
        let args = Arguments::try_parse_from(["deploy-market"]).unwrap();

        assert!(
            args.logging
                .log_filter
                .split(',')
                .any(|directive| directive == "ethrpc=debug")
        );
        assert_eq!(args.logging.log_stderr_threshold, LevelFilter::ERROR);
        assert!(!args.logging.log_json);
    }

    #[test]
    fn parses_party_list() {
        let args = Arguments::try_parse_from([
            "deploy-market",
            "--market-parties",
            "0x0000000000000000000000000000000000000001,0x0000000000000000000000000000000000000002",
        ])
        .unwrap();
        assert_eq!(
            args.market.market_parties,
            [Address::with_last_byte(1), Address::with_last_byte(2)]
        );

        assert!(
            Arguments::try_parse_from(["deploy-market", "--market-parties", "0x01"]).is_err()
        );
    }

    #[test]
    fn private_key_and_mnemonic_are_exclusive() {
        assert!(
            Arguments::try_parse_from([
                "deploy-market",
                "--private-key",
                DEV_KEY,
                "--mnemonic",
                "test test test test test test test test test test test junk",
            ])
            .is_err()
        );
    }

    #[test]
    fn zero_confirmations_are_rejected() {
        assert!(Arguments::try_parse_from(["deploy-market", "--confirmations", "0"]).is_err());
    }

    #[test]
    fn resolves_local_signer() {
        let args =
            Arguments::try_parse_from(["deploy-market", "--private-key", DEV_KEY]).unwrap();
        assert_eq!(
            args.signer().unwrap().unwrap().address(),
            address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
        );

        let args = Arguments::try_parse_from([
            "deploy-market",
            "--mnemonic",
            "test test test test test test test test test test test junk",
            "--mnemonic-index",
            "1",
        ])
        .unwrap();
        assert_eq!(
            args.signer().unwrap().unwrap().address(),
            address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8")
        );
    }

    #[test]
    fn display_hides_secrets() {
        let args =
            Arguments::try_parse_from(["deploy-market", "--private-key", DEV_KEY]).unwrap();
        let displayed = args.to_string();

        assert!(displayed.contains("private_key: SECRET"));
        assert!(displayed.contains("mnemonic: None"));
        assert!(!displayed.contains(DEV_KEY));
        assert!(displayed.contains(
            "market_parties: [0xD3db9D11c09cECd2E91bdE73F710dE6094179FA0]"
        ));
    }
}
