//! Selection of the contract variant to deploy on a given chain

use alloy::primitives::Address;
use tracing::warn;

use crate::{
    config::Config,
    constants::ROOT_CHAIN_ID,
    manifest::Manifest,
    types::{DeploymentPlan, InitializerArgs},
};

/// The chain-independent inputs to a deployment
#[derive(Debug, Clone)]
pub struct DeployParams {
    /// The metadata base URI
    pub base_uri: String,
    /// The cold wallet, which also receives proxy admin ownership
    pub admin: Address,
    /// The operational signer
    pub signer: Address,
    /// The root contract address, only used by mirror deployments
    pub root_contract: Address,
}

impl DeployParams {
    /// Collect the deployment parameters from the configuration.
    ///
    /// The root contract is resolved from, in order, the explicit override,
    /// the canonical chain's proxy in the manifest, and the configuration.
    pub fn resolve(config: &Config, manifest: &Manifest, root_override: Option<Address>) -> Self {
        let root_contract = root_override
            .or_else(|| manifest.get(ROOT_CHAIN_ID).map(|record| record.proxy))
            .unwrap_or(config.governance.root_contract);

        Self {
            base_uri: config.contracts.base_uri.clone(),
            admin: config.governance.admin,
            signer: config.governance.signer,
            root_contract,
        }
    }
}

/// Choose the contract variant and its initializer arguments for the given chain.
///
/// The canonical chain gets the root contract, every other chain gets a mirror
/// pointing back at the root contract.
pub fn select_variant(chain_id: u64, params: &DeployParams) -> DeploymentPlan {
    let args = if chain_id == ROOT_CHAIN_ID {
        InitializerArgs::Root {
            base_uri: params.base_uri.clone(),
            admin: params.admin,
            signer: params.signer,
        }
    } else {
        if params.root_contract.is_zero() {
            warn!(
                "mirror on chain {} will reference the zero address as its root contract",
                chain_id
            );
        }

        InitializerArgs::Mirror {
            base_uri: params.base_uri.clone(),
            admin: params.admin,
            signer: params.signer,
            root_contract: params.root_contract,
        }
    };

    DeploymentPlan {
        chain_id,
        args,
        admin_owner: params.admin,
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;
    use alloy_sol_types::SolCall;

    use super::*;
    use crate::{
        manifest::DeploymentRecord,
        solidity::{IAuditSign, IAuditSignMirror},
        types::ContractVariant,
    };

    fn params() -> DeployParams {
        DeployParams {
            base_uri: "https://gateway.pinata.cloud/ipfs/".to_string(),
            admin: address!("b9Edd24591De55dB94A0e7fB2939D8F2eF49bf3E"),
            signer: address!("ee680e5c2C5251261061F12BA3a5c470D2B6AE83"),
            root_contract: address!("00000000000000000000000000000000000000aa"),
        }
    }

    #[test]
    fn test_canonical_chain_selects_root() {
        let plan = select_variant(1, &params());
        assert_eq!(plan.variant(), ContractVariant::Root);
        assert_eq!(plan.variant().contract_name(), "auditSign");
    }

    #[test]
    fn test_other_chains_select_mirror() {
        for chain_id in [0, 4, 77, 100, 137, 1337, u64::MAX] {
            let plan = select_variant(chain_id, &params());
            assert_eq!(plan.variant(), ContractVariant::Mirror, "chain {chain_id}");
            assert_eq!(plan.variant().contract_name(), "auditSignMirror");
        }
    }

    #[test]
    fn test_mirror_has_one_more_argument() {
        let root = select_variant(1, &params());
        let mirror = select_variant(100, &params());

        assert_eq!(root.args.arity(), 3);
        assert_eq!(mirror.args.arity(), root.args.arity() + 1);
        assert_eq!(
            mirror.args.display_values().last().unwrap(),
            "0x00000000000000000000000000000000000000aa"
        );
    }

    #[test]
    fn test_ownership_goes_to_admin() {
        let params = params();
        for chain_id in [1, 100] {
            let plan = select_variant(chain_id, &params);
            assert_eq!(plan.admin_owner, params.admin);
            assert_ne!(plan.admin_owner, params.signer);
        }
    }

    #[test]
    fn test_initializer_calldata() {
        let params = params();

        let root = select_variant(1, &params).args.calldata();
        assert_eq!(root[..4], IAuditSign::initializeCall::SELECTOR);
        let decoded = IAuditSign::initializeCall::abi_decode(&root).unwrap();
        assert_eq!(decoded.baseUri, params.base_uri);
        assert_eq!(decoded.admin, params.admin);
        assert_eq!(decoded.signer, params.signer);

        let mirror = select_variant(137, &params).args.calldata();
        assert_eq!(mirror[..4], IAuditSignMirror::initializeCall::SELECTOR);
        let decoded = IAuditSignMirror::initializeCall::abi_decode(&mirror).unwrap();
        assert_eq!(decoded.rootContract, params.root_contract);
        assert_ne!(
            IAuditSign::initializeCall::SELECTOR,
            IAuditSignMirror::initializeCall::SELECTOR
        );
    }

    #[test]
    fn test_root_contract_resolution() {
        let config = Config::load(None).unwrap();
        let mut manifest = Manifest::default();

        let resolved = DeployParams::resolve(&config, &manifest, None);
        assert_eq!(resolved.root_contract, Address::ZERO);

        let mainnet_proxy = address!("00000000000000000000000000000000000000bb");
        manifest.insert(DeploymentRecord {
            network: "mainnet".to_string(),
            chain_id: 1,
            variant: ContractVariant::Root,
            implementation: address!("00000000000000000000000000000000000000cc"),
            proxy: mainnet_proxy,
            proxy_admin: address!("00000000000000000000000000000000000000dd"),
            admin_owner: config.governance.admin,
        });
        let resolved = DeployParams::resolve(&config, &manifest, None);
        assert_eq!(resolved.root_contract, mainnet_proxy);

        let explicit = address!("00000000000000000000000000000000000000ee");
        let resolved = DeployParams::resolve(&config, &manifest, Some(explicit));
        assert_eq!(resolved.root_contract, explicit);
    }
}
