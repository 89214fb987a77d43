//! The deployment procedure: a CourtFactory first, then a Market bound to
//! that CourtFactory.

use {
    crate::deployer::{ContractDeploying, Deployment},
    alloy::{dyn_abi::DynSolValue, primitives::Address},
    anyhow::{Context, Result, ensure},
    contracts::{Artifacts, ContractFactory},
};

pub const COURT_FACTORY: &str = "CourtFactory";
pub const MARKET: &str = "Market";

/// The Market constructor arguments known before anything is deployed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketParameters {
    pub pair: String,
    pub description: String,
    pub token: Address,
    pub parties: Vec<Address>,
}

impl MarketParameters {
    /// `(pair, description, token, parties, court_factory)`
    fn constructor_args(&self, court_factory: Address) -> Vec<DynSolValue> {
        vec![
            DynSolValue::String(self.pair.clone()),
            DynSolValue::String(self.description.clone()),
            DynSolValue::Address(self.token),
            DynSolValue::Array(
                self.parties
                    .iter()
                    .copied()
                    .map(DynSolValue::Address)
                    .collect(),
            ),
            DynSolValue::Address(court_factory),
        ]
    }
}

/// Outcome of a complete run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployed {
    pub deployer: Address,
    pub court_factory: Deployment,
    pub market: Deployment,
}

/// Both contract factories with validated constructor arguments.
#[derive(Debug, Clone)]
pub struct Plan {
    court_factory: ContractFactory,
    market: ContractFactory,
    parameters: MarketParameters,
}

impl Plan {
    /// Resolves both artifacts. See [`Plan::new`].
    pub fn prepare(artifacts: &Artifacts, parameters: MarketParameters) -> Result<Self> {
        let court_factory = artifacts
            .load(COURT_FACTORY)
            .with_context(|| format!("loading {COURT_FACTORY} artifact"))?;
        let market = artifacts
            .load(MARKET)
            .with_context(|| format!("loading {MARKET} artifact"))?;
        Self::new(
            ContractFactory::new(court_factory),
            ContractFactory::new(market),
            parameters,
        )
    }

    /// Checks that both constructors accept their arguments so that a
    /// mismatching artifact fails before the first transaction is sent. The
    /// CourtFactory address is not known yet at this point and is checked
    /// with a placeholder.
    pub fn new(
        court_factory: ContractFactory,
        market: ContractFactory,
        parameters: MarketParameters,
    ) -> Result<Self> {
        ensure!(
            !parameters.parties.is_empty(),
            "a market needs at least one permitted party"
        );
        court_factory
            .deploy_code(&[])
            .context("invalid CourtFactory constructor")?;
        market
            .deploy_code(&parameters.constructor_args(Address::ZERO))
            .context("invalid Market constructor")?;

        Ok(Self {
            court_factory,
            market,
            parameters,
        })
    }

    /// Deploys the CourtFactory and then the Market. The Market deployment
    /// only starts once the CourtFactory is confirmed since it needs its
    /// address. The first failure aborts the run.
    pub async fn execute(&self, deployer: &dyn ContractDeploying) -> Result<Deployed> {
        let code = self.court_factory.deploy_code(&[])?;
        let court_factory = deployer
            .deploy(self.court_factory.name(), code)
            .await
            .with_context(|| format!("deploying {COURT_FACTORY}"))?;
        tracing::info!(
            address = %court_factory.address,
            transaction = ?court_factory.transaction_hash,
            block = ?court_factory.block_number,
            "courtFactory deployed"
        );

        let code = self
            .market
            .deploy_code(&self.parameters.constructor_args(court_factory.address))?;
        let market = deployer
            .deploy(self.market.name(), code)
            .await
            .with_context(|| format!("deploying {MARKET}"))?;
        tracing::info!(
            address = %market.address,
            transaction = ?market.transaction_hash,
            block = ?market.block_number,
            "market deployed"
        );

        Ok(Deployed {
            deployer: deployer.deployer(),
            court_factory,
            market,
        })
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::deployer::MockContractDeploying,
        alloy::primitives::{B256, Bytes, address},
        anyhow::anyhow,
        contracts::{Artifact, test_util::hardhat_artifact},
        mockall::Sequence,
        std::{fs, path::Path},
    };

    const DEPLOYER: Address = address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
    const COURT_FACTORY_ADDRESS: Address = address!("0x1458cFeb334bddBAB3b57f278eD4e7C5c0E7f97c");
    const MARKET_ADDRESS: Address = address!("0xf1aD98Ee4A050aF17834d3c4b4Da3a07C53De4DB");

    const MARKET_INPUTS: [(&str, &str); 5] = [
        ("_pair", "string"),
        ("_description", "string"),
        ("_token", "address"),
        ("_parties", "address[]"),
        ("_courtFactory", "address"),
    ];

    fn factory(name: &str, inputs: &[(&str, &str)]) -> ContractFactory {
        let json = hardhat_artifact(name, inputs).to_string();
        ContractFactory::new(Artifact::parse(&json).unwrap())
    }

    fn parameters() -> MarketParameters {
        MarketParameters {
            pair: "wETH/INR".into(),
            description: "Eth to Inr p2p trade".into(),
            token: address!("0xa6fa4fb5f76172d178d61b04b0ecd319c5d1c0aa"),
            parties: vec![address!("0xD3db9D11c09cECd2E91bdE73F710dE6094179FA0")],
        }
    }

    fn plan() -> Plan {
        Plan::new(
            factory(COURT_FACTORY, &[]),
            factory(MARKET, &MARKET_INPUTS),
            parameters(),
        )
        .unwrap()
    }

    fn deployment(contract: &str, address: Address, tx: u8) -> Deployment {
        Deployment {
            contract: contract.to_string(),
            address,
            transaction_hash: B256::with_last_byte(tx),
            block_number: Some(u64::from(tx)),
        }
    }

    #[tokio::test]
    async fn deploys_court_factory_then_market() {
        let plan = plan();
        let market = factory(MARKET, &MARKET_INPUTS);
        let mut deployer = MockContractDeploying::new();
        let mut seq = Sequence::new();

        deployer
            .expect_deploy()
            .times(1)
            .withf(|contract, code| contract.to_string() == COURT_FACTORY && code[..] == [0x60, 0x80])
            .returning(|_, _| Ok(deployment(COURT_FACTORY, COURT_FACTORY_ADDRESS, 1)))
            .in_sequence(&mut seq);
        deployer
            .expect_deploy()
            .times(1)
            .withf(move |contract, code| {
                contract.to_string() == MARKET
                    && market
                        .constructor_args(code)
                        .is_ok_and(|args| args == parameters().constructor_args(COURT_FACTORY_ADDRESS))
            })
            .returning(|_, _| Ok(deployment(MARKET, MARKET_ADDRESS, 2)))
            .in_sequence(&mut seq);
        deployer.expect_deployer().return_const(DEPLOYER);

        let deployed = plan.execute(&deployer).await.unwrap();
        assert_eq!(
            deployed,
            Deployed {
                deployer: DEPLOYER,
                court_factory: deployment(COURT_FACTORY, COURT_FACTORY_ADDRESS, 1),
                market: deployment(MARKET, MARKET_ADDRESS, 2),
            }
        );
    }

    #[tokio::test]
    async fn market_is_bound_to_the_deployed_court_factory() {
        let plan = plan();
        let market = factory(MARKET, &MARKET_INPUTS);
        let mut deployer = MockContractDeploying::new();

        deployer
            .expect_deploy()
            .withf(|contract, _| contract.to_string() == COURT_FACTORY)
            .returning(|_, _| Ok(deployment(COURT_FACTORY, Address::repeat_byte(0x42), 1)));
        deployer
            .expect_deploy()
            .withf(|contract, _| contract.to_string() == MARKET)
            .returning(move |_, code: Bytes| {
                let args = market.constructor_args(&code).unwrap();
                assert_eq!(
                    args.last(),
                    Some(&DynSolValue::Address(Address::repeat_byte(0x42)))
                );
                Ok(deployment(MARKET, MARKET_ADDRESS, 2))
            });
        deployer.expect_deployer().return_const(DEPLOYER);

        plan.execute(&deployer).await.unwrap();
    }

    #[tokio::test]
    async fn court_factory_failure_stops_the_run() {
        let plan = plan();
        let mut deployer = MockContractDeploying::new();

        deployer
            .expect_deploy()
            .times(1)
            .withf(|contract, _| contract.to_string() == COURT_FACTORY)
            .returning(|_, _| Err(anyhow!("insufficient funds for gas * price + value")));
        deployer
            .expect_deploy()
            .withf(|contract, _| contract.to_string() == MARKET)
            .never();
        deployer.expect_deployer().never();

        let err = plan.execute(&deployer).await.unwrap_err();
        assert_eq!(err.to_string(), "deploying CourtFactory");
        assert_eq!(
            err.root_cause().to_string(),
            "insufficient funds for gas * price + value"
        );
    }

    #[tokio::test]
    async fn market_failure_fails_the_run() {
        let plan = plan();
        let mut deployer = MockContractDeploying::new();
        let mut seq = Sequence::new();

        deployer
            .expect_deploy()
            .times(1)
            .returning(|_, _| Ok(deployment(COURT_FACTORY, COURT_FACTORY_ADDRESS, 1)))
            .in_sequence(&mut seq);
        deployer
            .expect_deploy()
            .times(1)
            .returning(|_, _| Err(anyhow!("deployment transaction reverted")))
            .in_sequence(&mut seq);
        deployer.expect_deployer().never();

        let err = plan.execute(&deployer).await.unwrap_err();
        assert_eq!(err.to_string(), "deploying Market");
    }

    #[tokio::test]
    async fn every_run_deploys_fresh_contracts() {
        let plan = plan();
        let mut deployer = MockContractDeploying::new();
        let mut next = 0u8;

        deployer.expect_deploy().times(4).returning(move |contract, _| {
            next += 1;
            Ok(deployment(contract, Address::with_last_byte(next), next))
        });
        deployer.expect_deployer().return_const(DEPLOYER);

        let first = plan.execute(&deployer).await.unwrap();
        let second = plan.execute(&deployer).await.unwrap();
        assert_ne!(first.court_factory.address, second.court_factory.address);
        assert_ne!(first.market.address, second.market.address);
    }

    #[test]
    fn rejects_market_without_parties() {
        let mut parameters = parameters();
        parameters.parties.clear();

        let err = Plan::new(
            factory(COURT_FACTORY, &[]),
            factory(MARKET, &MARKET_INPUTS),
            parameters,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "a market needs at least one permitted party");
    }

    #[test]
    fn rejects_mismatching_market_constructor() {
        let mut inputs = MARKET_INPUTS.to_vec();
        inputs.push(("_fee", "uint256"));

        let err = Plan::new(
            factory(COURT_FACTORY, &[]),
            factory(MARKET, &inputs),
            parameters(),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "invalid Market constructor");
    }

    #[test]
    fn rejects_court_factory_with_constructor_arguments() {
        let err = Plan::new(
            factory(COURT_FACTORY, &[("_owner", "address")]),
            factory(MARKET, &MARKET_INPUTS),
            parameters(),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "invalid CourtFactory constructor");
    }

    #[test]
    fn prepares_from_hardhat_artifacts() {
        fn write(root: &Path, name: &str, inputs: &[(&str, &str)]) {
            let dir = root.join(format!("contracts/{name}.sol"));
            fs::create_dir_all(&dir).unwrap();
            fs::write(
                dir.join(format!("{name}.json")),
                hardhat_artifact(name, inputs).to_string(),
            )
            .unwrap();
        }

        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), COURT_FACTORY, &[]);
        let artifacts = Artifacts::new(dir.path());

        let err = Plan::prepare(&artifacts, parameters()).unwrap_err();
        assert_eq!(err.to_string(), "loading Market artifact");

        write(dir.path(), MARKET, &MARKET_INPUTS);
        Plan::prepare(&artifacts, parameters()).unwrap();
    }
}
