//! Type definitions used throughout the scripts

use std::fmt::{self, Display};

use alloy::primitives::{Address, Bytes};
use alloy_sol_types::SolCall;
use serde::{Deserialize, Serialize};

use crate::{
    constants::{MIRROR_CONTRACT_NAME, ROOT_CONTRACT_NAME},
    solidity::{IAuditSign, IAuditSignMirror},
};

/// The contract variants that can be deployed
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractVariant {
    /// The root contract, deployed on the canonical chain
    Root,
    /// The mirror contract, deployed on every other chain
    Mirror,
}

impl ContractVariant {
    /// The name of the variant's compiled artifact
    pub fn contract_name(&self) -> &'static str {
        match self {
            ContractVariant::Root => ROOT_CONTRACT_NAME,
            ContractVariant::Mirror => MIRROR_CONTRACT_NAME,
        }
    }
}

impl Display for ContractVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractVariant::Root => write!(f, "root"),
            ContractVariant::Mirror => write!(f, "mirror"),
        }
    }
}

/// The arguments the deployed contract is initialized with through the proxy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitializerArgs {
    /// `auditSign.initialize(baseUri, admin, signer)`
    Root {
        /// The metadata base URI
        base_uri: String,
        /// The cold wallet
        admin: Address,
        /// The operational signer
        signer: Address,
    },
    /// `auditSignMirror.initialize(baseUri, admin, signer, rootContract)`
    Mirror {
        /// The metadata base URI
        base_uri: String,
        /// The cold wallet
        admin: Address,
        /// The operational signer
        signer: Address,
        /// The address of the root contract on the canonical chain
        root_contract: Address,
    },
}

impl InitializerArgs {
    /// The variant these arguments initialize
    pub fn variant(&self) -> ContractVariant {
        match self {
            InitializerArgs::Root { .. } => ContractVariant::Root,
            InitializerArgs::Mirror { .. } => ContractVariant::Mirror,
        }
    }

    /// The number of arguments passed to the initializer
    pub fn arity(&self) -> usize {
        self.display_values().len()
    }

    /// The arguments in call order, formatted for display
    pub fn display_values(&self) -> Vec<String> {
        match self {
            InitializerArgs::Root {
                base_uri,
                admin,
                signer,
            } => vec![
                base_uri.clone(),
                format!("{admin:#x}"),
                format!("{signer:#x}"),
            ],
            InitializerArgs::Mirror {
                base_uri,
                admin,
                signer,
                root_contract,
            } => vec![
                base_uri.clone(),
                format!("{admin:#x}"),
                format!("{signer:#x}"),
                format!("{root_contract:#x}"),
            ],
        }
    }

    /// ABI-encoded calldata for the `initialize` call
    pub fn calldata(&self) -> Bytes {
        match self {
            InitializerArgs::Root {
                base_uri,
                admin,
                signer,
            } => IAuditSign::initializeCall {
                baseUri: base_uri.clone(),
                admin: *admin,
                signer: *signer,
            }
            .abi_encode()
            .into(),
            InitializerArgs::Mirror {
                base_uri,
                admin,
                signer,
                root_contract,
            } => IAuditSignMirror::initializeCall {
                baseUri: base_uri.clone(),
                admin: *admin,
                signer: *signer,
                rootContract: *root_contract,
            }
            .abi_encode()
            .into(),
        }
    }
}

/// Everything needed to deploy to a chain, computed without touching the network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentPlan {
    /// The chain being deployed to
    pub chain_id: u64,
    /// The arguments to initialize the contract with, which determine the variant
    pub args: InitializerArgs,
    /// The address proxy admin ownership is transferred to
    pub admin_owner: Address,
}

impl DeploymentPlan {
    /// The variant being deployed
    pub fn variant(&self) -> ContractVariant {
        self.args.variant()
    }
}

impl Display for DeploymentPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "chain id:        {}", self.chain_id)?;
        writeln!(
            f,
            "contract:        {} ({})",
            self.variant().contract_name(),
            self.variant()
        )?;
        writeln!(f, "initializer:     ({})", self.args.display_values().join(", "))?;
        write!(f, "proxy admin to:  {:#x}", self.admin_owner)
    }
}
