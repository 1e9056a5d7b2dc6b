//! Loading of compiled contract artifacts.
//!
//! Artifacts are the JSON files emitted by the Solidity build toolchain, one per
//! contract, named `<ContractName>.json`.

use std::{
    fs,
    path::{Path, PathBuf},
};

use alloy::primitives::Bytes;
use serde::Deserialize;

use crate::{
    config::CompilerConfig,
    constants::{ARTIFACT_EXTENSION, METADATA_LENGTH_BYTES},
    errors::ScriptError,
};

/// A compiled contract
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    /// The name of the contract
    pub contract_name: String,
    /// The creation code of the contract
    pub bytecode: Bytes,
    /// The runtime code of the contract
    #[serde(default)]
    pub deployed_bytecode: Bytes,
    /// The compiler that produced the artifact
    pub compiler: Option<CompilerInfo>,
    /// The solc metadata, as a JSON string
    pub metadata: Option<String>,
}

/// The compiler section of an artifact
#[derive(Debug, Clone, Deserialize)]
pub struct CompilerInfo {
    /// The compiler name, e.g. `solc`
    pub name: String,
    /// The full compiler version, e.g. `0.6.12+commit.27d51765.Emscripten.clang`
    pub version: String,
}

/// The subset of the solc metadata we check
#[derive(Debug, Deserialize)]
struct SolcMetadata {
    /// The compilation settings
    settings: SolcSettings,
}

/// The settings section of the solc metadata
#[derive(Debug, Deserialize)]
struct SolcSettings {
    /// The optimizer settings
    optimizer: Option<SolcOptimizer>,
}

/// The optimizer section of the solc metadata
#[derive(Debug, Deserialize)]
struct SolcOptimizer {
    /// Whether the optimizer was enabled
    enabled: bool,
    /// The number of optimizer runs
    runs: u64,
}

impl Artifact {
    /// Parse an artifact from its JSON representation
    pub fn from_json(json: &str) -> Result<Self, ScriptError> {
        let artifact: Self =
            serde_json::from_str(json).map_err(|e| ScriptError::ArtifactParsing(e.to_string()))?;

        if artifact.bytecode.is_empty() {
            return Err(ScriptError::ArtifactParsing(format!(
                "{} has no creation code, is it abstract or an interface?",
                artifact.contract_name
            )));
        }

        Ok(artifact)
    }

    /// Check that the artifact was built with the given compiler settings.
    ///
    /// Artifacts lacking compiler information are accepted as-is.
    pub fn check_compiler(&self, expected: &CompilerConfig) -> Result<(), ScriptError> {
        if let Some(compiler) = &self.compiler {
            let version = compiler.version.split('+').next().unwrap_or_default();
            if version != expected.version {
                return Err(ScriptError::CompilerMismatch(format!(
                    "{} was compiled with {} {}, expected {}",
                    self.contract_name, compiler.name, compiler.version, expected.version
                )));
            }
        }

        let Some(metadata) = &self.metadata else {
            return Ok(());
        };
        let metadata: SolcMetadata = serde_json::from_str(metadata)
            .map_err(|e| ScriptError::ArtifactParsing(e.to_string()))?;

        if let Some(optimizer) = metadata.settings.optimizer {
            if optimizer.enabled != expected.optimizer.enabled
                || (optimizer.enabled && optimizer.runs != expected.optimizer.runs)
            {
                return Err(ScriptError::CompilerMismatch(format!(
                    "{} was compiled with optimizer enabled={} runs={}, expected enabled={} runs={}",
                    self.contract_name,
                    optimizer.enabled,
                    optimizer.runs,
                    expected.optimizer.enabled,
                    expected.optimizer.runs
                )));
            }
        }

        Ok(())
    }

    /// The runtime code of the contract, which must be present
    pub fn runtime_code(&self) -> Result<&Bytes, ScriptError> {
        if self.deployed_bytecode.is_empty() {
            return Err(ScriptError::ArtifactParsing(format!(
                "{} has no runtime code",
                self.contract_name
            )));
        }
        Ok(&self.deployed_bytecode)
    }

    /// The runtime code without the trailing solc metadata section
    pub fn runtime_code_without_metadata(&self) -> &[u8] {
        strip_metadata(&self.deployed_bytecode)
    }
}

/// A directory of compiled artifacts
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    /// The directory holding the artifacts
    dir: PathBuf,
}

impl ArtifactStore {
    /// Create a store reading from the given directory
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The path of the artifact for the given contract
    pub fn path(&self, contract_name: &str) -> PathBuf {
        self.dir
            .join(contract_name)
            .with_extension(ARTIFACT_EXTENSION)
    }

    /// Load the artifact for the given contract
    pub fn load(&self, contract_name: &str) -> Result<Artifact, ScriptError> {
        let path = self.path(contract_name);
        let json = read_artifact(&path)?;
        Artifact::from_json(&json)
    }
}

/// Read an artifact file
fn read_artifact(path: &Path) -> Result<String, ScriptError> {
    fs::read_to_string(path)
        .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {}", path.display(), e)))
}

/// Strip the CBOR metadata section solc appends to runtime code.
///
/// The last two bytes hold the big-endian length of the section preceding them.
/// Code whose trailer doesn't describe a plausible section is returned whole.
pub fn strip_metadata(code: &[u8]) -> &[u8] {
    if code.len() < METADATA_LENGTH_BYTES {
        return code;
    }

    let (body, len_bytes) = code.split_at(code.len() - METADATA_LENGTH_BYTES);
    let metadata_len = u16::from_be_bytes([len_bytes[0], len_bytes[1]]) as usize;
    if metadata_len == 0 || metadata_len > body.len() {
        return code;
    }

    &body[..body.len() - metadata_len]
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::OptimizerConfig;

    fn compiler(version: &str, enabled: bool, runs: u64) -> CompilerConfig {
        CompilerConfig {
            version: version.to_string(),
            optimizer: OptimizerConfig { enabled, runs },
        }
    }

    fn artifact_json(version: &str, optimizer_enabled: bool, runs: u64) -> String {
        let metadata = json!({
            "compiler": { "version": version },
            "settings": { "optimizer": { "enabled": optimizer_enabled, "runs": runs } },
        });

        json!({
            "contractName": "auditSign",
            "abi": [],
            "bytecode": "0x6080604052",
            "deployedBytecode": "0x6080a165627a7a72305820deadbeef0029",
            "compiler": { "name": "solc", "version": version },
            "metadata": metadata.to_string(),
        })
        .to_string()
    }

    #[test]
    fn test_parse_artifact() {
        let artifact =
            Artifact::from_json(&artifact_json("0.6.12+commit.27d51765.Emscripten.clang", false, 200))
                .unwrap();

        assert_eq!(artifact.contract_name, "auditSign");
        assert_eq!(artifact.bytecode.to_vec(), vec![0x60, 0x80, 0x60, 0x40, 0x52]);
        assert_eq!(artifact.compiler.unwrap().name, "solc");
    }

    #[test]
    fn test_reject_empty_bytecode() {
        let json = json!({ "contractName": "IAuditSign", "bytecode": "0x" }).to_string();
        assert!(matches!(
            Artifact::from_json(&json),
            Err(ScriptError::ArtifactParsing(_))
        ));
    }

    #[test]
    fn test_reject_unlinked_bytecode() {
        let json = json!({
            "contractName": "auditSign",
            "bytecode": "0x6080__$a1b2c3$__6040",
        })
        .to_string();
        assert!(Artifact::from_json(&json).is_err());
    }

    #[test]
    fn test_compiler_check() {
        let artifact =
            Artifact::from_json(&artifact_json("0.6.12+commit.27d51765.Emscripten.clang", false, 200))
                .unwrap();
        assert!(artifact.check_compiler(&compiler("0.6.12", false, 200)).is_ok());
        // Runs are irrelevant while the optimizer is off
        assert!(artifact.check_compiler(&compiler("0.6.12", false, 999)).is_ok());

        assert!(matches!(
            artifact.check_compiler(&compiler("0.8.20", false, 200)),
            Err(ScriptError::CompilerMismatch(_))
        ));
        assert!(matches!(
            artifact.check_compiler(&compiler("0.6.12", true, 200)),
            Err(ScriptError::CompilerMismatch(_))
        ));
    }

    #[test]
    fn test_compiler_check_without_info() {
        let json = json!({ "contractName": "ProxyAdmin", "bytecode": "0x60806040" }).to_string();
        let artifact = Artifact::from_json(&json).unwrap();
        assert!(artifact.check_compiler(&compiler("0.6.12", false, 200)).is_ok());
    }

    #[test]
    fn test_store_load() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("auditSign.json"),
            artifact_json("0.6.12+commit.27d51765", false, 200),
        )
        .unwrap();

        let store = ArtifactStore::new(dir.path());
        assert_eq!(store.load("auditSign").unwrap().contract_name, "auditSign");
        assert!(matches!(
            store.load("auditSignMirror"),
            Err(ScriptError::ArtifactParsing(_))
        ));
    }

    #[test]
    fn test_strip_metadata() {
        // 0xa1 .. 0x00 0x05 : five bytes of metadata followed by its length
        let code = [0x60, 0x80, 0xa1, 0x65, 0x62, 0x7a, 0x7a, 0x00, 0x05];
        assert_eq!(strip_metadata(&code), &[0x60, 0x80]);

        // A trailer longer than the code is not metadata
        let code = [0x60, 0x80, 0xff, 0xff];
        assert_eq!(strip_metadata(&code), &code);

        assert_eq!(strip_metadata(&[0x00]), &[0x00]);
        assert_eq!(strip_metadata(&[]), &[] as &[u8]);
    }

    #[test]
    fn test_runtime_code_required() {
        let artifact =
            Artifact::from_json(&artifact_json("0.6.12+commit.27d51765", false, 200)).unwrap();
        assert_eq!(artifact.runtime_code().unwrap(), &artifact.deployed_bytecode);

        let json = json!({ "contractName": "auditSign", "bytecode": "0x6080604052" }).to_string();
        let artifact = Artifact::from_json(&json).unwrap();
        assert!(artifact.deployed_bytecode.is_empty());
        assert!(matches!(
            artifact.runtime_code(),
            Err(ScriptError::ArtifactParsing(_))
        ));
    }

    #[test]
    fn test_runtime_code_without_metadata() {
        let artifact =
            Artifact::from_json(&artifact_json("0.6.12+commit.27d51765", false, 200)).unwrap();
        // The trailing 0x0029 declares 41 bytes of metadata, more than the code holds
        assert_eq!(
            artifact.runtime_code_without_metadata(),
            &artifact.deployed_bytecode[..]
        );
    }
}
