//! Constants used in the deploy scripts

use alloy_primitives::{b256, B256};

/// The chain ID of the canonical chain, on which the root contract is deployed
pub const ROOT_CHAIN_ID: u64 = 1;

/// The built-in network configuration, used when no config file is given
pub const DEFAULT_CONFIG: &str = include_str!("../networks.toml");

/// The name of the root contract's compiled artifact
pub const ROOT_CONTRACT_NAME: &str = "auditSign";

/// The name of the mirror contract's compiled artifact
pub const MIRROR_CONTRACT_NAME: &str = "auditSignMirror";

/// The name of the proxy admin contract's compiled artifact
///
/// Expected to be OpenZeppelin's `ProxyAdmin`, which makes the deployer its owner
pub const PROXY_ADMIN_CONTRACT_NAME: &str = "ProxyAdmin";

/// The name of the transparent proxy contract's compiled artifact
pub const PROXY_CONTRACT_NAME: &str = "TransparentUpgradeableProxy";

/// The extension of compiled artifact files
pub const ARTIFACT_EXTENSION: &str = "json";

/// The storage slot containing the proxy admin contract address in the upgradeable proxy.
///
/// This is specified in EIP1967: https://eips.ethereum.org/EIPS/eip-1967#admin-address
pub const PROXY_ADMIN_STORAGE_SLOT: B256 =
    b256!("b53127684a568b3173ae13b9f8a6016e243e63b6e8ee1178d6a717850b5d6103");

/// The storage slot containing the implementation contract address in the upgradeable proxy.
///
/// This is specified in EIP1967: https://eips.ethereum.org/EIPS/eip-1967#logic-contract-address
pub const PROXY_IMPLEMENTATION_STORAGE_SLOT: B256 =
    b256!("360894a13ba1a3210667c828492db98dca3e2076cc3735a920a3ca505d382bbc");

/// The number of bytes stored in a single storage slot
pub const NUM_BYTES_STORAGE_SLOT: usize = 32;

/// The number of bytes in an Ethereum address
pub const NUM_BYTES_ADDRESS: usize = 20;

/// The number of wei in a gwei
pub const WEI_PER_GWEI: u128 = 1_000_000_000;

/// The number of confirmations to wait for when a network doesn't configure one
pub const DEFAULT_CONFIRMATIONS: u64 = 1;

/// The receipt timeout used when a network doesn't configure one, in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 750;

/// The default path of the deployments manifest
pub const DEFAULT_MANIFEST_PATH: &str = "deployments.json";

/// The default log filter, used when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info";

/// The number of trailing bytes in runtime code which encode the length
/// of the CBOR metadata section appended by solc
pub const METADATA_LENGTH_BYTES: usize = 2;
