//! Network, compiler and governance configuration for the deploy scripts.
//!
//! The configuration is a TOML document. A copy of the production configuration
//! is compiled into the binary and used whenever no config file is passed.

use std::{collections::BTreeMap, env, fs, path::Path, time::Duration};

use alloy::primitives::Address;
use serde::Deserialize;

use crate::{
    constants::{DEFAULT_CONFIG, DEFAULT_CONFIRMATIONS, DEFAULT_TIMEOUT_SECS, WEI_PER_GWEI},
    errors::ScriptError,
};

/// The full deployment configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// The compiler settings the contract artifacts must have been built with
    pub compiler: CompilerConfig,
    /// Where to find the compiled contracts, and how to initialize them
    pub contracts: ContractsConfig,
    /// The governance addresses handed to the deployed contract
    pub governance: GovernanceConfig,
    /// The networks that can be deployed to, keyed by name
    pub networks: BTreeMap<String, NetworkConfig>,
}

/// Solidity compiler settings
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CompilerConfig {
    /// The solc version, e.g. `0.6.12`
    pub version: String,
    /// The optimizer settings
    #[serde(default)]
    pub optimizer: OptimizerConfig,
}

/// Solidity optimizer settings
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct OptimizerConfig {
    /// Whether the optimizer is enabled
    pub enabled: bool,
    /// The number of optimizer runs
    pub runs: u64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            runs: 200,
        }
    }
}

/// Settings for locating and initializing the contracts
#[derive(Debug, Clone, Deserialize)]
pub struct ContractsConfig {
    /// The directory holding the compiled contract artifacts
    pub artifacts_dir: String,
    /// The metadata base URI passed to the contract initializer
    pub base_uri: String,
}

/// The governance addresses of the deployment
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct GovernanceConfig {
    /// The operational signer
    pub signer: Address,
    /// The cold wallet, which receives proxy admin ownership
    pub admin: Address,
    /// The address of the root contract on the canonical chain,
    /// referenced by mirror deployments
    #[serde(default)]
    pub root_contract: Address,
}

/// A single network deployments can target
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    /// The RPC endpoint, possibly containing `${VAR}` placeholders
    pub rpc_url: String,
    /// The chain ID the endpoint must report, any chain is accepted if unset
    pub chain_id: Option<u64>,
    /// A fixed legacy gas price in gwei, the node's estimate is used if unset
    pub gas_price_gwei: Option<u64>,
    /// Whether to skip gas estimation of the deployment before broadcasting
    #[serde(default)]
    pub skip_dry_run: bool,
    /// The number of confirmations to wait for on each transaction
    pub confirmations: Option<u64>,
    /// How long to wait for each transaction receipt, in seconds
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Parse a configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self, ScriptError> {
        toml::from_str(contents).map_err(|e| ScriptError::Config(e.to_string()))
    }

    /// Load the configuration from the given path, or the built-in
    /// configuration if no path is given
    pub fn load(path: Option<&Path>) -> Result<Self, ScriptError> {
        match path {
            Some(path) => {
                let contents = fs::read_to_string(path)
                    .map_err(|e| ScriptError::Config(format!("{}: {}", path.display(), e)))?;
                Self::from_toml(&contents)
            }
            None => Self::from_toml(DEFAULT_CONFIG),
        }
    }

    /// Look up a network by name
    pub fn network(&self, name: &str) -> Result<&NetworkConfig, ScriptError> {
        self.networks
            .get(name)
            .ok_or_else(|| ScriptError::UnknownNetwork(name.to_string()))
    }

    /// Find the name of the network configured with the given chain ID
    pub fn network_name_for_chain(&self, chain_id: u64) -> Option<&str> {
        self.networks
            .iter()
            .find(|(_, network)| network.chain_id == Some(chain_id))
            .map(|(name, _)| name.as_str())
    }
}

impl NetworkConfig {
    /// The RPC URL with all `${VAR}` placeholders substituted from the environment
    pub fn resolved_rpc_url(&self) -> Result<String, ScriptError> {
        interpolate_env(&self.rpc_url, |name| env::var(name).ok())
    }

    /// The resolved RPC URL, or the raw template if a variable is unset
    pub fn display_rpc_url(&self) -> String {
        self.resolved_rpc_url()
            .unwrap_or_else(|_| self.rpc_url.clone())
    }

    /// The configured gas price in wei
    pub fn gas_price_wei(&self) -> Option<u128> {
        self.gas_price_gwei.map(|gwei| gwei as u128 * WEI_PER_GWEI)
    }

    /// The number of confirmations to wait for
    pub fn confirmations(&self) -> u64 {
        self.confirmations.unwrap_or(DEFAULT_CONFIRMATIONS)
    }

    /// The receipt timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Check the chain ID reported by the node against the configured one
    pub fn check_chain_id(&self, actual: u64) -> Result<(), ScriptError> {
        match self.chain_id {
            Some(expected) if expected != actual => {
                Err(ScriptError::ChainIdMismatch { expected, actual })
            }
            _ => Ok(()),
        }
    }
}

/// Replace every `${VAR}` in `template` with the value `lookup` returns for `VAR`
pub fn interpolate_env(
    template: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String, ScriptError> {
    let mut resolved = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        resolved.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find('}').ok_or_else(|| {
            ScriptError::Config(format!("unterminated placeholder in `{}`", template))
        })?;

        let name = &after[..end];
        let value = lookup(name).ok_or_else(|| ScriptError::MissingEnvVar(name.to_string()))?;
        resolved.push_str(&value);
        rest = &after[end + 1..];
    }
    resolved.push_str(rest);

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_config() {
        let config = Config::load(None).unwrap();

        assert_eq!(config.compiler.version, "0.6.12");
        assert!(!config.compiler.optimizer.enabled);
        assert_eq!(config.compiler.optimizer.runs, 200);

        let expected = [
            ("rinkeby", 4),
            ("sokol", 77),
            ("xdai", 100),
            ("matic", 137),
            ("mainnet", 1),
        ];
        for (name, chain_id) in expected {
            let network = config.network(name).unwrap();
            assert_eq!(network.chain_id, Some(chain_id), "{name}");
            assert_eq!(network.gas_price_wei(), Some(1_000_000_000), "{name}");
        }

        let development = config.network("development").unwrap();
        assert_eq!(development.chain_id, None);
        assert_eq!(development.gas_price_wei(), None);
        assert!(config.network("ropsten").is_err());
    }

    #[test]
    fn test_dry_run_flags() {
        let config = Config::load(None).unwrap();
        assert!(config.network("rinkeby").unwrap().skip_dry_run);
        assert!(config.network("sokol").unwrap().skip_dry_run);
        assert!(!config.network("xdai").unwrap().skip_dry_run);
        assert!(!config.network("matic").unwrap().skip_dry_run);
        assert!(!config.network("mainnet").unwrap().skip_dry_run);
    }

    #[test]
    fn test_governance_roles_distinct() {
        let config = Config::load(None).unwrap();
        assert_ne!(config.governance.signer, config.governance.admin);
        assert_eq!(config.governance.root_contract, Address::ZERO);
    }

    #[test]
    fn test_network_for_chain() {
        let config = Config::load(None).unwrap();
        assert_eq!(config.network_name_for_chain(1), Some("mainnet"));
        assert_eq!(config.network_name_for_chain(100), Some("xdai"));
        assert_eq!(config.network_name_for_chain(31337), None);
    }

    #[test]
    fn test_interpolate_env() {
        let lookup = |name: &str| (name == "INFURA_KEY").then(|| "abc123".to_string());

        assert_eq!(
            interpolate_env("https://mainnet.infura.io/v3/${INFURA_KEY}", lookup).unwrap(),
            "https://mainnet.infura.io/v3/abc123"
        );
        assert_eq!(
            interpolate_env("https://rpc.xdaichain.com/", lookup).unwrap(),
            "https://rpc.xdaichain.com/"
        );
        assert!(matches!(
            interpolate_env("https://x/${ALCHEMY_KEY}", lookup),
            Err(ScriptError::MissingEnvVar(name)) if name == "ALCHEMY_KEY"
        ));
        assert!(matches!(
            interpolate_env("https://x/${INFURA_KEY", lookup),
            Err(ScriptError::Config(_))
        ));
    }

    #[test]
    fn test_display_rpc_url() {
        let network = NetworkConfig {
            rpc_url: "https://x.invalid/${AUDIT_SIGN_TEST_UNSET_VAR}".to_string(),
            chain_id: None,
            gas_price_gwei: None,
            skip_dry_run: false,
            confirmations: None,
            timeout_secs: None,
        };
        assert_eq!(network.display_rpc_url(), network.rpc_url);

        let network = NetworkConfig {
            rpc_url: "http://127.0.0.1:8545".to_string(),
            ..network
        };
        assert_eq!(network.display_rpc_url(), "http://127.0.0.1:8545");
    }

    #[test]
    fn test_check_chain_id() {
        let config = Config::load(None).unwrap();
        let mainnet = config.network("mainnet").unwrap();
        assert!(mainnet.check_chain_id(1).is_ok());
        assert!(matches!(
            mainnet.check_chain_id(4),
            Err(ScriptError::ChainIdMismatch { expected: 1, actual: 4 })
        ));

        let development = config.network("development").unwrap();
        assert!(development.check_chain_id(1337).is_ok());
    }

    #[test]
    fn test_network_defaults() {
        let config = Config::from_toml(
            r#"
            [compiler]
            version = "0.8.20"

            [contracts]
            artifacts_dir = "out"
            base_uri = "ipfs://"

            [governance]
            signer = "0x0000000000000000000000000000000000000001"
            admin = "0x0000000000000000000000000000000000000002"

            [networks.local]
            rpc_url = "http://localhost:8545"
            "#,
        )
        .unwrap();

        assert_eq!(config.compiler.optimizer, OptimizerConfig::default());
        assert_eq!(config.governance.root_contract, Address::ZERO);

        let local = config.network("local").unwrap();
        assert!(!local.skip_dry_run);
        assert_eq!(local.confirmations(), DEFAULT_CONFIRMATIONS);
        assert_eq!(local.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }
}
