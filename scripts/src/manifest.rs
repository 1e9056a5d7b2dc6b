//! The deployments manifest, a JSON file recording what was deployed on each chain

use std::{collections::BTreeMap, fs, path::Path};

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::{errors::ScriptError, types::ContractVariant};

/// The deployments recorded so far, keyed by chain ID
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// The recorded deployments
    pub deployments: BTreeMap<u64, DeploymentRecord>,
}

/// A single proxy deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    /// The name of the network in the configuration
    pub network: String,
    /// The chain the contracts live on
    pub chain_id: u64,
    /// The deployed variant
    pub variant: ContractVariant,
    /// The implementation contract behind the proxy
    pub implementation: Address,
    /// The proxy contract, the address users interact with
    pub proxy: Address,
    /// The proxy admin contract
    pub proxy_admin: Address,
    /// The owner the proxy admin was handed to
    pub admin_owner: Address,
}

impl Manifest {
    /// Read the manifest at the given path, an absent file is an empty manifest
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents =
            fs::read_to_string(path).map_err(|e| ScriptError::ReadManifest(e.to_string()))?;
        serde_json::from_str(&contents).map_err(|e| ScriptError::ReadManifest(e.to_string()))
    }

    /// Write the manifest to the given path
    pub fn save(&self, path: &Path) -> Result<(), ScriptError> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| ScriptError::WriteManifest(e.to_string()))?;
        fs::write(path, contents).map_err(|e| ScriptError::WriteManifest(e.to_string()))
    }

    /// The deployment recorded for the given chain, if any
    pub fn get(&self, chain_id: u64) -> Option<&DeploymentRecord> {
        self.deployments.get(&chain_id)
    }

    /// The deployment recorded for the given chain, or an error
    pub fn require(&self, chain_id: u64) -> Result<&DeploymentRecord, ScriptError> {
        self.get(chain_id).ok_or(ScriptError::NoDeployment(chain_id))
    }

    /// Record a deployment, replacing any previous one on the same chain
    pub fn insert(&mut self, record: DeploymentRecord) -> Option<DeploymentRecord> {
        self.deployments.insert(record.chain_id, record)
    }

    /// Update the recorded deployment for a chain in place
    pub fn update(
        &mut self,
        chain_id: u64,
        f: impl FnOnce(&mut DeploymentRecord),
    ) -> Result<(), ScriptError> {
        let record = self
            .deployments
            .get_mut(&chain_id)
            .ok_or(ScriptError::NoDeployment(chain_id))?;
        f(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;

    use super::*;

    fn record(chain_id: u64) -> DeploymentRecord {
        DeploymentRecord {
            network: "xdai".to_string(),
            chain_id,
            variant: ContractVariant::Mirror,
            implementation: address!("0000000000000000000000000000000000000001"),
            proxy: address!("0000000000000000000000000000000000000002"),
            proxy_admin: address!("0000000000000000000000000000000000000003"),
            admin_owner: address!("b9Edd24591De55dB94A0e7fB2939D8F2eF49bf3E"),
        }
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = Manifest::load(&dir.path().join("deployments.json")).unwrap();
        assert!(manifest.deployments.is_empty());
        assert!(matches!(
            manifest.require(100),
            Err(ScriptError::NoDeployment(100))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deployments.json");

        let mut manifest = Manifest::default();
        assert!(manifest.insert(record(100)).is_none());
        manifest.save(&path).unwrap();

        let loaded = Manifest::load(&path).unwrap();
        assert_eq!(loaded, manifest);

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["deployments"]["100"]["variant"], "mirror");
    }

    #[test]
    fn test_insert_replaces() {
        let mut manifest = Manifest::default();
        manifest.insert(record(100));

        let mut redeployed = record(100);
        redeployed.proxy = address!("0000000000000000000000000000000000000009");
        let previous = manifest.insert(redeployed).unwrap();

        assert_eq!(previous.proxy, record(100).proxy);
        assert_eq!(manifest.deployments.len(), 1);
    }

    #[test]
    fn test_update() {
        let mut manifest = Manifest::default();
        manifest.insert(record(100));

        let new_impl = address!("0000000000000000000000000000000000000042");
        manifest
            .update(100, |record| record.implementation = new_impl)
            .unwrap();
        assert_eq!(manifest.require(100).unwrap().implementation, new_impl);

        assert!(manifest.update(137, |_| {}).is_err());
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deployments.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            Manifest::load(&path),
            Err(ScriptError::ReadManifest(_))
        ));
    }
}
