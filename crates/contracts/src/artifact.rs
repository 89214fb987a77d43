//! Loading of Hardhat compiler artifacts (`hh-sol-artifact-1`).
//!
//! Hardhat writes one JSON file per contract to
//! `<artifacts>/<source path>/<ContractName>.json`. Contracts are looked up
//! by their plain name (`Market`) or by their fully qualified name
//! (`contracts/Market.sol:Market`) when the plain name is ambiguous.

use {
    alloy::{
        json_abi::JsonAbi,
        primitives::{Bytes, hex},
    },
    serde::Deserialize,
    std::{
        collections::BTreeMap,
        fs,
        path::{Path, PathBuf},
    },
    walkdir::WalkDir,
};

/// Directory Hardhat stores the full compiler input/output in. It never
/// contains per-contract artifacts.
const BUILD_INFO_DIR: &str = "build-info";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("artifacts directory {0} does not exist")]
    MissingDirectory(PathBuf),
    #[error("no artifact for contract {name} below {root}")]
    NotFound { name: String, root: PathBuf },
    #[error("contract name {name} is ambiguous, use one of the fully qualified names {candidates:?}")]
    Ambiguous {
        name: String,
        candidates: Vec<String>,
    },
    #[error("failed to walk artifacts directory")]
    Walk(#[from] walkdir::Error),
    #[error("failed to read artifact {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse artifact {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
    #[error("artifact {path} contains contract {found}, expected {expected}")]
    NameMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("{0} is abstract or an interface and has no creation bytecode")]
    NotDeployable(String),
    #[error("{name} must be linked against the libraries {libraries:?} before deployment")]
    UnlinkedLibraries {
        name: String,
        libraries: Vec<String>,
    },
    #[error("creation bytecode of {name} is not valid hex")]
    Bytecode {
        name: String,
        #[source]
        source: hex::FromHexError,
    },
}

/// The parts of a compiled contract needed to deploy it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub contract_name: String,
    pub source_name: Option<String>,
    pub abi: JsonAbi,
    /// Creation (init) bytecode without constructor arguments.
    pub bytecode: Bytes,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArtifact {
    contract_name: String,
    #[serde(default)]
    source_name: Option<String>,
    abi: JsonAbi,
    bytecode: String,
    /// `source -> library -> offsets`
    #[serde(default)]
    link_references: BTreeMap<String, BTreeMap<String, serde_json::Value>>,
}

impl Artifact {
    /// Parses the JSON contents of a Hardhat artifact.
    pub fn parse(json: &str) -> Result<Self, ParseError> {
        let raw: RawArtifact = serde_json::from_str(json)?;

        let libraries: Vec<_> = raw
            .link_references
            .iter()
            .flat_map(|(source, libraries)| {
                libraries
                    .keys()
                    .map(move |library| format!("{source}:{library}"))
            })
            .collect();
        if !libraries.is_empty() {
            return Err(ParseError::UnlinkedLibraries {
                name: raw.contract_name,
                libraries,
            });
        }

        let bytecode = hex::decode(raw.bytecode.trim()).map_err(|source| ParseError::Bytecode {
            name: raw.contract_name.clone(),
            source,
        })?;
        if bytecode.is_empty() {
            return Err(ParseError::NotDeployable(raw.contract_name));
        }

        Ok(Self {
            contract_name: raw.contract_name,
            source_name: raw.source_name,
            abi: raw.abi,
            bytecode: bytecode.into(),
        })
    }

    /// `<source>:<name>` if the source is known, the plain name otherwise.
    pub fn fully_qualified_name(&self) -> String {
        match &self.source_name {
            Some(source) => format!("{source}:{}", self.contract_name),
            None => self.contract_name.clone(),
        }
    }
}

/// A directory of Hardhat artifacts.
#[derive(Debug, Clone)]
pub struct Artifacts {
    root: PathBuf,
}

impl Artifacts {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves and loads the artifact of the contract `name`.
    pub fn load(&self, name: &str) -> Result<Artifact, Error> {
        let path = self.find(name)?;
        tracing::debug!(contract = name, path = %path.display(), "loading artifact");

        let json = fs::read_to_string(&path).map_err(|source| Error::Read {
            path: path.clone(),
            source,
        })?;
        let artifact = Artifact::parse(&json).map_err(|source| Error::Parse {
            path: path.clone(),
            source,
        })?;

        let expected = contract_name(name);
        if artifact.contract_name != expected {
            return Err(Error::NameMismatch {
                path,
                expected: expected.to_string(),
                found: artifact.contract_name,
            });
        }
        Ok(artifact)
    }

    fn find(&self, name: &str) -> Result<PathBuf, Error> {
        if !self.root.is_dir() {
            return Err(Error::MissingDirectory(self.root.clone()));
        }
        let not_found = || Error::NotFound {
            name: name.to_string(),
            root: self.root.clone(),
        };

        if let Some((source, contract)) = name.rsplit_once(':') {
            let path = self.root.join(source).join(format!("{contract}.json"));
            return if path.is_file() {
                Ok(path)
            } else {
                Err(not_found())
            };
        }

        let file_name = format!("{name}.json");
        let mut candidates = Vec::new();
        for entry in WalkDir::new(&self.root)
            .into_iter()
            .filter_entry(|entry| entry.file_name() != BUILD_INFO_DIR)
        {
            let entry = entry?;
            if entry.file_type().is_file() && entry.file_name() == file_name.as_str() {
                candidates.push(entry.into_path());
            }
        }
        candidates.sort();

        match candidates.len() {
            0 => Err(not_found()),
            1 => Ok(candidates.remove(0)),
            _ => Err(Error::Ambiguous {
                name: name.to_string(),
                candidates: candidates
                    .iter()
                    .map(|path| self.qualified_name(path, name))
                    .collect(),
            }),
        }
    }

    fn qualified_name(&self, path: &Path, name: &str) -> String {
        let source = path
            .parent()
            .and_then(|dir| dir.strip_prefix(&self.root).ok())
            .map(|dir| dir.to_string_lossy().replace('\\', "/"))
            .unwrap_or_default();
        format!("{source}:{name}")
    }
}

/// Strips the source path off a fully qualified contract name.
fn contract_name(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, contract)| contract)
}
