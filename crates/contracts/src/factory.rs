use {
    crate::artifact::Artifact,
    alloy::{
        dyn_abi::{DynSolType, DynSolValue, Specifier},
        json_abi::Param,
        primitives::Bytes,
    },
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{contract} constructor takes {expected} arguments but {actual} were given")]
    ArgumentCount {
        contract: String,
        expected: usize,
        actual: usize,
    },
    #[error("{contract} constructor argument {index} ({name}) must be of type {expected}")]
    ArgumentType {
        contract: String,
        index: usize,
        name: String,
        expected: String,
    },
    #[error("{contract} constructor argument {index} has an unsupported type")]
    UnsupportedType {
        contract: String,
        index: usize,
        #[source]
        source: alloy::dyn_abi::Error,
    },
    #[error("creation code is not based on the {0} bytecode")]
    ForeignCode(String),
    #[error("failed to decode {contract} constructor arguments")]
    Decoding {
        contract: String,
        #[source]
        source: alloy::dyn_abi::Error,
    },
}

/// Builds contract creation code for one compiled contract.
#[derive(Debug, Clone)]
pub struct ContractFactory {
    artifact: Artifact,
}

impl ContractFactory {
    pub fn new(artifact: Artifact) -> Self {
        Self { artifact }
    }

    pub fn name(&self) -> &str {
        &self.artifact.contract_name
    }

    /// The constructor parameters, empty if the contract has no explicit
    /// constructor.
    pub fn constructor_inputs(&self) -> &[Param] {
        self.artifact
            .abi
            .constructor
            .as_ref()
            .map(|constructor| constructor.inputs.as_slice())
            .unwrap_or_default()
    }

    /// Returns the init bytecode followed by the ABI encoded constructor
    /// arguments, ready to be sent as a contract creation transaction.
    pub fn deploy_code(&self, args: &[DynSolValue]) -> Result<Bytes, Error> {
        let types = self.constructor_types()?;
        if types.len() != args.len() {
            return Err(Error::ArgumentCount {
                contract: self.name().to_string(),
                expected: types.len(),
                actual: args.len(),
            });
        }
        for (index, ((ty, param), arg)) in types
            .iter()
            .zip(self.constructor_inputs())
            .zip(args)
            .enumerate()
        {
            if !ty.matches(arg) {
                return Err(Error::ArgumentType {
                    contract: self.name().to_string(),
                    index,
                    name: param.name.clone(),
                    expected: ty.sol_type_name().into_owned(),
                });
            }
        }

        let mut code = self.artifact.bytecode.to_vec();
        if !args.is_empty() {
            code.extend(DynSolValue::Tuple(args.to_vec()).abi_encode_params());
        }
        Ok(code.into())
    }

    /// Decodes the constructor arguments appended to creation code built by
    /// [`Self::deploy_code`].
    pub fn constructor_args(&self, code: &[u8]) -> Result<Vec<DynSolValue>, Error> {
        let encoded = code
            .strip_prefix(&self.artifact.bytecode[..])
            .ok_or_else(|| Error::ForeignCode(self.name().to_string()))?;
        let types = self.constructor_types()?;
        if types.is_empty() {
            return Ok(Vec::new());
        }

        let decoded = DynSolType::Tuple(types)
            .abi_decode_params(encoded)
            .map_err(|source| Error::Decoding {
                contract: self.name().to_string(),
                source,
            })?;
        match decoded {
            DynSolValue::Tuple(values) => Ok(values),
            value => Ok(vec![value]),
        }
    }

    fn constructor_types(&self) -> Result<Vec<DynSolType>, Error> {
        self.constructor_inputs()
            .iter()
            .enumerate()
            .map(|(index, param)| {
                param.resolve().map_err(|source| Error::UnsupportedType {
                    contract: self.name().to_string(),
                    index,
                    source,
                })
            })
            .collect()
    }
}
