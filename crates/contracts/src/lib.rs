//! Compiled contract artifacts and the factories that turn them into
//! contract creation code.
pub mod artifact;
pub mod factory;

pub use {
    artifact::{Artifact, Artifacts},
    factory::ContractFactory,
};

#[cfg(any(test, feature = "test-util"))]
pub mod test_util {
    use serde_json::{Value, json};

    /// A Hardhat artifact for `name` whose constructor takes `inputs`
    /// (`(name, type)` pairs). The bytecode is a dummy `PUSH1 0x80`.
    pub fn hardhat_artifact(name: &str, inputs: &[(&str, &str)]) -> Value {
        let inputs: Vec<_> = inputs
            .iter()
            .map(|(name, ty)| json!({ "internalType": ty, "name": name, "type": ty }))
            .collect();
        let mut abi = vec![json!({
            "inputs": [],
            "name": "owner",
            "outputs": [{ "internalType": "address", "name": "", "type": "address" }],
            "stateMutability": "view",
            "type": "function",
        })];
        if !inputs.is_empty() {
            abi.push(json!({
                "inputs": inputs,
                "stateMutability": "nonpayable",
                "type": "constructor",
            }));
        }
        json!({
            "_format": "hh-sol-artifact-1",
            "contractName": name,
            "sourceName": format!("contracts/{name}.sol"),
            "abi": abi,
            "bytecode": "0x6080",
            "deployedBytecode": "0x6080",
            "linkReferences": {},
            "deployedLinkReferences": {},
        })
    }
}
