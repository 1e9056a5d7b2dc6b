//! Utilities for the deploy scripts.

use std::{
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use alloy::{
    contract::{CallBuilder, CallDecoder},
    network::{Ethereum, TransactionBuilder},
    primitives::{Address, Bytes, B256, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::{TransactionReceipt, TransactionRequest},
    signers::local::PrivateKeySigner,
    transports::http::reqwest::Url,
};
use tracing::info;

use crate::{
    config::{Config, NetworkConfig},
    constants::{
        NUM_BYTES_ADDRESS, NUM_BYTES_STORAGE_SLOT, PROXY_ADMIN_STORAGE_SLOT,
        PROXY_IMPLEMENTATION_STORAGE_SLOT,
    },
    errors::ScriptError,
    manifest::Manifest,
};

/// The provider type used to send transactions
pub type Wallet = DynProvider<Ethereum>;

/// The call builder type for contract calls made by the scripts
pub type ScriptCallBuilder<'a, D> = CallBuilder<&'a Wallet, D, Ethereum>;

/// Everything the commands share: the configuration, the selected network,
/// where the manifest lives and the deployer key
pub struct ScriptContext {
    /// The loaded configuration
    pub config: Config,
    /// The name of the selected network
    pub network_name: String,
    /// The path of the deployments manifest
    pub manifest_path: PathBuf,
    /// The deployer's private key, only needed by commands that send transactions
    pub priv_key: Option<String>,
}

/// A connection to the selected network, with the deployer's key attached
pub struct Connection {
    /// The client, signing with the deployer's key
    pub client: Wallet,
    /// The deployer's address
    pub deployer: Address,
    /// The chain ID reported by the node
    pub chain_id: u64,
    /// How transactions are sent on this network
    pub tx_opts: TxOptions,
}

/// Per-network transaction settings
#[derive(Debug, Clone, Copy)]
pub struct TxOptions {
    /// A fixed legacy gas price in wei
    pub gas_price: Option<u128>,
    /// The number of confirmations to wait for
    pub confirmations: u64,
    /// How long to wait for a receipt
    pub timeout: Duration,
}

impl From<&NetworkConfig> for TxOptions {
    fn from(network: &NetworkConfig) -> Self {
        Self {
            gas_price: network.gas_price_wei(),
            confirmations: network.confirmations(),
            timeout: network.timeout(),
        }
    }
}

impl ScriptContext {
    /// Create a new context
    pub fn new(
        config: Config,
        network_name: String,
        manifest_path: PathBuf,
        priv_key: Option<String>,
    ) -> Self {
        Self {
            config,
            network_name,
            manifest_path,
            priv_key,
        }
    }

    /// The configuration of the selected network
    pub fn network(&self) -> Result<&NetworkConfig, ScriptError> {
        self.config.network(&self.network_name)
    }

    /// Load the deployments manifest
    pub fn manifest(&self) -> Result<Manifest, ScriptError> {
        Manifest::load(&self.manifest_path)
    }

    /// Write the deployments manifest
    pub fn save_manifest(&self, manifest: &Manifest) -> Result<(), ScriptError> {
        manifest.save(&self.manifest_path)
    }

    /// The path of the deployments manifest
    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    /// Connect to the selected network with the deployer's key
    pub async fn connect(&self) -> Result<Connection, ScriptError> {
        let network = self.network()?;
        let priv_key = self.priv_key.as_deref().ok_or_else(|| {
            ScriptError::ClientInitialization("no deployer private key given".to_string())
        })?;

        let (client, deployer) = setup_client(priv_key, &network.resolved_rpc_url()?)?;
        let chain_id = fetch_chain_id(&client, network).await?;
        info!(
            "connected to {} (chain {}) as {:#x}",
            self.network_name, chain_id, deployer
        );

        Ok(Connection {
            client,
            deployer,
            chain_id,
            tx_opts: TxOptions::from(network),
        })
    }

    /// Connect to the selected network without a key, for reads only
    pub fn connect_read_only(&self) -> Result<DynProvider<Ethereum>, ScriptError> {
        let url = parse_url(&self.network()?.resolved_rpc_url()?)?;
        Ok(DynProvider::new(ProviderBuilder::new().connect_http(url)))
    }
}

/// Sets up the client with which to send transactions, returning it
/// alongside the address of the key it signs with
pub fn setup_client(priv_key: &str, rpc_url: &str) -> Result<(Wallet, Address), ScriptError> {
    let signer = PrivateKeySigner::from_str(priv_key)
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    let deployer = signer.address();

    let url = parse_url(rpc_url)?;
    let provider = ProviderBuilder::new().wallet(signer).connect_http(url);

    Ok((DynProvider::new(provider), deployer))
}

/// Parse an RPC URL
fn parse_url(rpc_url: &str) -> Result<Url, ScriptError> {
    Url::parse(rpc_url).map_err(|e| ScriptError::ClientInitialization(e.to_string()))
}

/// Fetch the chain ID from the node, checking it against the network configuration
pub async fn fetch_chain_id(
    client: &impl Provider,
    network: &NetworkConfig,
) -> Result<u64, ScriptError> {
    let chain_id = client
        .get_chain_id()
        .await
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    network.check_chain_id(chain_id)?;
    Ok(chain_id)
}

/// Whether any code is deployed at the given address
pub async fn has_code(client: &impl Provider, address: Address) -> Result<bool, ScriptError> {
    let code = client
        .get_code_at(address)
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;
    Ok(!code.is_empty())
}

/// Read an address stored in the low-order bytes of a storage slot
pub async fn read_address_slot(
    client: &impl Provider,
    address: Address,
    slot: B256,
) -> Result<Address, ScriptError> {
    let word = client
        .get_storage_at(address, U256::from_be_bytes(slot.0))
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?
        .to_be_bytes::<NUM_BYTES_STORAGE_SLOT>();

    Ok(Address::from_slice(
        &word[NUM_BYTES_STORAGE_SLOT - NUM_BYTES_ADDRESS..NUM_BYTES_STORAGE_SLOT],
    ))
}

/// Read the proxy admin of an EIP-1967 proxy
///
/// This is the recommended way to get the proxy admin address:
/// https://github.com/OpenZeppelin/openzeppelin-contracts/blob/v5.0.0/contracts/proxy/ERC1967/ERC1967Utils.sol#L104-L106
pub async fn read_proxy_admin(
    client: &impl Provider,
    proxy: Address,
) -> Result<Address, ScriptError> {
    read_address_slot(client, proxy, PROXY_ADMIN_STORAGE_SLOT).await
}

/// Read the implementation behind an EIP-1967 proxy
pub async fn read_proxy_implementation(
    client: &impl Provider,
    proxy: Address,
) -> Result<Address, ScriptError> {
    read_address_slot(client, proxy, PROXY_IMPLEMENTATION_STORAGE_SLOT).await
}

/// Build the transaction deploying the given creation code
pub fn deploy_tx(code: Bytes, from: Address, tx_opts: &TxOptions) -> TransactionRequest {
    let tx = TransactionRequest::default()
        .with_from(from)
        .with_deploy_code(code);

    match tx_opts.gas_price {
        Some(gas_price) => tx.with_gas_price(gas_price),
        None => tx,
    }
}

/// Estimate the gas needed to deploy the given creation code, sending nothing
pub async fn estimate_deploy_gas(
    conn: &Connection,
    code: Bytes,
) -> Result<u64, ScriptError> {
    conn.client
        .estimate_gas(deploy_tx(code, conn.deployer, &conn.tx_opts))
        .await
        .map_err(|e| ScriptError::ContractDeployment(format!("dry run failed: {}", e)))
}

/// Deploy the given creation code, returning the address of the new contract
pub async fn deploy_contract(
    conn: &Connection,
    code: Bytes,
    contract_name: &str,
) -> Result<Address, ScriptError> {
    info!("deploying {}", contract_name);

    let receipt = conn
        .client
        .send_transaction(deploy_tx(code, conn.deployer, &conn.tx_opts))
        .await
        .map_err(|e| ScriptError::ContractDeployment(e.to_string()))?
        .with_required_confirmations(conn.tx_opts.confirmations)
        .with_timeout(Some(conn.tx_opts.timeout))
        .get_receipt()
        .await
        .map_err(|e| ScriptError::ContractDeployment(e.to_string()))?;

    if !receipt.status() {
        return Err(ScriptError::ContractDeployment(format!(
            "{} deployment reverted in {:#x}",
            contract_name, receipt.transaction_hash
        )));
    }

    let address = receipt.contract_address.ok_or_else(|| {
        ScriptError::ContractDeployment(format!("no contract address for {}", contract_name))
    })?;
    info!("{} deployed at {:#x}", contract_name, address);

    Ok(address)
}

/// Send a contract call and wait for it to succeed
pub async fn send_call<D: CallDecoder>(
    call: ScriptCallBuilder<'_, D>,
    tx_opts: &TxOptions,
) -> Result<TransactionReceipt, ScriptError> {
    let call = match tx_opts.gas_price {
        Some(gas_price) => call.gas_price(gas_price),
        None => call,
    };

    let receipt = call
        .send()
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?
        .with_required_confirmations(tx_opts.confirmations)
        .with_timeout(Some(tx_opts.timeout))
        .get_receipt()
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

    if !receipt.status() {
        return Err(ScriptError::ContractInteraction(format!(
            "transaction {:#x} reverted",
            receipt.transaction_hash
        )));
    }

    Ok(receipt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_client_rejects_bad_key() {
        assert!(matches!(
            setup_client("not a key", "http://127.0.0.1:8545"),
            Err(ScriptError::ClientInitialization(_))
        ));
    }

    #[test]
    fn test_setup_client_deployer_address() {
        // First default account of a local Anvil / Hardhat node
        let (_, deployer) = setup_client(
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
            "http://127.0.0.1:8545",
        )
        .unwrap();

        assert_eq!(
            deployer,
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
                .parse::<Address>()
                .unwrap()
        );
    }

    #[test]
    fn test_deploy_tx_gas_price() {
        let from = Address::repeat_byte(0x11);
        let opts = TxOptions {
            gas_price: Some(1_000_000_000),
            confirmations: 1,
            timeout: Duration::from_secs(10),
        };

        let tx = deploy_tx(Bytes::from_static(&[0x60, 0x80]), from, &opts);
        assert_eq!(tx.gas_price, Some(1_000_000_000));
        assert_eq!(tx.from, Some(from));
        assert!(tx.to.unwrap().is_create());

        let tx = deploy_tx(
            Bytes::from_static(&[0x60, 0x80]),
            from,
            &TxOptions {
                gas_price: None,
                ..opts
            },
        );
        assert_eq!(tx.gas_price, None);
    }
}
