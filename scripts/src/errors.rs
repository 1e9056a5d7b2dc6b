//! Definitions of errors that can occur during the execution of the deployment scripts

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

use alloy::primitives::Address;

/// Errors that can occur during the execution of the deployment scripts
#[derive(Debug)]
pub enum ScriptError {
    /// Error reading or parsing the network configuration
    Config(String),
    /// The requested network is not present in the configuration
    UnknownNetwork(String),
    /// An environment variable referenced by the configuration is unset
    MissingEnvVar(String),
    /// The node reports a different chain ID than the network is configured with
    ChainIdMismatch {
        /// The chain ID in the network configuration
        expected: u64,
        /// The chain ID reported by the node
        actual: u64,
    },
    /// Error reading the deployments manifest
    ReadManifest(String),
    /// Error writing the deployments manifest
    WriteManifest(String),
    /// The manifest has no deployment recorded for the given chain
    NoDeployment(u64),
    /// Error reading or parsing a compiled contract artifact
    ArtifactParsing(String),
    /// A compiled artifact was built with settings other than the configured ones
    CompilerMismatch(String),
    /// Error initializing the RPC client
    ClientInitialization(String),
    /// Error deploying a contract
    ContractDeployment(String),
    /// Error calling a contract method
    ContractInteraction(String),
    /// A proxy is already recorded and live on this chain
    AlreadyDeployed {
        /// The chain the proxy lives on
        chain_id: u64,
        /// The address of the live proxy
        proxy: Address,
    },
    /// The proxy admin ownership target is the deployer itself
    OwnerIsDeployer(Address),
    /// The deployer doesn't own the proxy admin it is asked to hand over
    NotAdminOwner {
        /// The proxy admin contract
        proxy_admin: Address,
        /// The current owner of the proxy admin
        owner: Address,
    },
    /// The on-chain runtime code doesn't match the compiled artifact
    BytecodeMismatch(Address),
}

impl Display for ScriptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::Config(s) => write!(f, "error reading config: {}", s),
            ScriptError::UnknownNetwork(s) => write!(f, "unknown network: {}", s),
            ScriptError::MissingEnvVar(s) => {
                write!(f, "environment variable `{}` is not set", s)
            }
            ScriptError::ChainIdMismatch { expected, actual } => write!(
                f,
                "network is configured for chain {} but the node reports chain {}",
                expected, actual
            ),
            ScriptError::ReadManifest(s) => write!(f, "error reading deployments: {}", s),
            ScriptError::WriteManifest(s) => write!(f, "error writing deployments: {}", s),
            ScriptError::NoDeployment(chain_id) => {
                write!(f, "no deployment recorded for chain {}", chain_id)
            }
            ScriptError::ArtifactParsing(s) => write!(f, "error parsing artifact: {}", s),
            ScriptError::CompilerMismatch(s) => write!(f, "compiler mismatch: {}", s),
            ScriptError::ClientInitialization(s) => write!(f, "error initializing client: {}", s),
            ScriptError::ContractDeployment(s) => write!(f, "error deploying contract: {}", s),
            ScriptError::ContractInteraction(s) => {
                write!(f, "error interacting with contract: {}", s)
            }
            ScriptError::AlreadyDeployed { chain_id, proxy } => write!(
                f,
                "proxy already deployed on chain {} at {:#x}, pass --force to redeploy",
                chain_id, proxy
            ),
            ScriptError::OwnerIsDeployer(addr) => write!(
                f,
                "refusing to hand proxy admin ownership to the deployer {:#x}",
                addr
            ),
            ScriptError::NotAdminOwner { proxy_admin, owner } => write!(
                f,
                "proxy admin {:#x} is owned by {:#x}, not the deployer",
                proxy_admin, owner
            ),
            ScriptError::BytecodeMismatch(addr) => {
                write!(f, "runtime code at {:#x} does not match the artifact", addr)
            }
        }
    }
}

impl Error for ScriptError {}
