//! Compiled contract artifacts.
//!
//! The registry indexes the JSON artifacts emitted by the Solidity toolchain
//! (`<artifacts>/contracts/<Source>.sol/<Contract>.json`) and hands out a
//! [`ContractArtifact`] per contract name. Compilation itself happens elsewhere.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use alloy_core::{
    dyn_abi::{DynSolValue, JsonAbiExt},
    json_abi::JsonAbi,
    primitives::Bytes,
};
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

/// The default artifacts directory.
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

/// A compiled contract, as found on disk.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractArtifact {
    pub contract_name: String,
    #[serde(default)]
    pub source_name: String,
    pub abi: JsonAbi,
    /// Hex creation bytecode. Kept as text since unlinked library placeholders are not hex.
    pub bytecode: String,
    #[serde(default)]
    pub link_references: BTreeMap<String, Value>,
}

impl ContractArtifact {
    /// Init code for a deployment: creation bytecode followed by the ABI encoded constructor
    /// arguments.
    pub fn deploy_code(&self, args: &[DynSolValue]) -> Result<Bytes> {
        if !self.link_references.is_empty() {
            anyhow::bail!(
                "Contract {} references unlinked libraries: {}",
                self.contract_name,
                self.link_references
                    .keys()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        let mut code = hex::decode(self.bytecode.trim_start_matches("0x"))
            .with_context(|| format!("Invalid bytecode for contract {}", self.contract_name))?;
        if code.is_empty() {
            anyhow::bail!(
                "Contract {} has no bytecode: it is abstract or an interface",
                self.contract_name
            );
        }

        let encoded_args = match &self.abi.constructor {
            Some(constructor) => constructor.abi_encode_input(args).with_context(|| {
                format!(
                    "Invalid constructor arguments for {} (expected {} argument(s), got {})",
                    self.contract_name,
                    constructor.inputs.len(),
                    args.len()
                )
            })?,
            None if args.is_empty() => Vec::new(),
            None => anyhow::bail!(
                "Contract {} has no constructor but {} argument(s) were given",
                self.contract_name,
                args.len()
            ),
        };

        code.extend_from_slice(&encoded_args);
        Ok(code.into())
    }
}

/// Index of every artifact found below an artifacts directory.
#[derive(Debug, Clone, Default)]
pub struct ArtifactRegistry {
    artifacts: BTreeMap<String, Vec<(PathBuf, ContractArtifact)>>,
}

impl ArtifactRegistry {
    /// Scan `dir` recursively for contract artifacts.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            anyhow::bail!("Artifacts directory not found: {}", dir.display());
        }

        let mut registry = Self::default();
        registry.scan(dir)?;

        tracing::debug!(
            path = %dir.display(),
            contracts = registry.artifacts.len(),
            "Artifacts loaded"
        );
        Ok(registry)
    }

    fn scan(&mut self, dir: &Path) -> Result<()> {
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read directory {}", dir.display()))?;

        for entry in entries {
            let path = entry
                .with_context(|| format!("Failed to read entry in {}", dir.display()))?
                .path();
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default();

            if path.is_dir() {
                // Compiler inputs and outputs, not artifacts.
                if file_name != "build-info" {
                    self.scan(&path)?;
                }
                continue;
            }

            if !file_name.ends_with(".json") || file_name.ends_with(".dbg.json") {
                continue;
            }

            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read artifact {}", path.display()))?;
            let value: Value = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse artifact {}", path.display()))?;

            if value.get("contractName").is_none() || value.get("bytecode").is_none() {
                tracing::trace!(path = %path.display(), "Skipping non-artifact JSON file");
                continue;
            }

            let artifact: ContractArtifact = serde_json::from_value(value)
                .with_context(|| format!("Malformed artifact {}", path.display()))?;
            self.insert(path, artifact);
        }

        Ok(())
    }

    /// Register an artifact under its contract name.
    pub fn insert(&mut self, path: PathBuf, artifact: ContractArtifact) {
        self.artifacts
            .entry(artifact.contract_name.clone())
            .or_default()
            .push((path, artifact));
    }

    /// Names of every known contract, sorted.
    pub fn contract_names(&self) -> impl Iterator<Item = &str> {
        self.artifacts.keys().map(String::as_str)
    }

    /// Look up a contract by name.
    ///
    /// `name` is either a bare contract name or a fully qualified `sourceName:contractName`,
    /// which selects one contract among several sharing the same name.
    pub fn get(&self, name: &str) -> Result<&ContractArtifact> {
        let (source, contract) = match name.rsplit_once(':') {
            Some((source, contract)) => (Some(source), contract),
            None => (None, name),
        };

        let candidates: Vec<_> = self
            .artifacts
            .get(contract)
            .into_iter()
            .flatten()
            .map(|(path, artifact)| (path, artifact))
            .filter(|(_, artifact)| source.is_none_or(|source| artifact.source_name == source))
            .collect();

        match candidates.as_slice() {
            [(_, artifact)] => Ok(*artifact),
            [] => anyhow::bail!(
                "Contract {} not found in artifacts. Known contracts: [{}]",
                name,
                self.contract_names().collect::<Vec<_>>().join(", ")
            ),
            _ => anyhow::bail!(
                "Contract name {} is ambiguous, use one of: {}",
                name,
                candidates
                    .iter()
                    .map(|(path, artifact)| format!(
                        "{}:{} ({})",
                        artifact.source_name,
                        artifact.contract_name,
                        path.display()
                    ))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
}
