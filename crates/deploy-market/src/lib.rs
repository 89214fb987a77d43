pub mod arguments;
pub mod deployer;
pub mod deployment;

use {
    crate::{
        arguments::Arguments,
        deployer::OnchainDeployer,
        deployment::{Deployed, Plan},
    },
    anyhow::{Context, Result},
    clap::Parser,
    contracts::Artifacts,
    ethrpc::Web3,
    std::process::ExitCode,
};

/// Parses the arguments, runs the deployment and maps the outcome to the
/// process exit code.
pub async fn start(args: impl Iterator<Item = String>) -> ExitCode {
    let args = Arguments::parse_from(args);
    observe::tracing::initialize(&args.logging.config());
    tracing::info!("running deploy-market with validated arguments:\n{}", args);

    let (lines, code) = report(&run(args).await);
    for line in lines {
        println!("{line}");
    }
    code
}

/// Maps the outcome of a run to the lines printed on stdout and the process
/// exit code. Failures are logged.
fn report(outcome: &Result<Deployed>) -> (Vec<String>, ExitCode) {
    match outcome {
        Ok(deployed) => (
            vec![
                format!("courtFactory deployed to {}", deployed.court_factory.address),
                format!("market deployed to {}", deployed.market.address),
            ],
            ExitCode::SUCCESS,
        ),
        Err(err) => {
            tracing::error!(?err, "deployment failed");
            (Vec::new(), ExitCode::FAILURE)
        }
    }
}

pub async fn run(args: Arguments) -> Result<Deployed> {
    let signer = args.signer()?;
    let web3 = Web3::connect(&args.node_url, signer)
        .await
        .context("failed to resolve the deployment signer")?;
    println!("deploying using {}", web3.account);

    let plan = Plan::prepare(&Artifacts::new(&args.artifacts), args.market.parameters())?;
    let deployer = OnchainDeployer::new(web3, args.confirmations, args.receipt_timeout);
    plan.execute(&deployer).await
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::deployer::Deployment,
        alloy::primitives::{Address, TxHash, address},
        anyhow::anyhow,
    };

    fn deployment(contract: &str, address: Address) -> Deployment {
        Deployment {
            contract: contract.to_string(),
            address,
            transaction_hash: TxHash::ZERO,
            block_number: Some(1),
        }
    }

    #[test]
    fn success_prints_both_addresses() {
        let court_factory = address!("0x5FbDB2315678afecb367f032d93F642f64180aa3");
        let market = address!("0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512");
        let deployed = Deployed {
            deployer: address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"),
            court_factory: deployment("CourtFactory", court_factory),
            market: deployment("Market", market),
        };

        let (lines, code) = report(&Ok(deployed));

        assert_eq!(
            lines,
            [
                format!("courtFactory deployed to {court_factory}"),
                format!("market deployed to {market}"),
            ]
        );
        assert_eq!(code, ExitCode::SUCCESS);
    }

    #[test]
    fn failure_exits_with_code_one() {
        let err = anyhow!("execution reverted").context("deploying CourtFactory");

        let (lines, code) = report(&Err(err));

        assert!(lines.is_empty());
        assert_eq!(code, ExitCode::from(1));
    }
}
