//! Definitions of CLI arguments and commands for deploy scripts

use std::path::PathBuf;

use alloy::primitives::{Address, Bytes};
use clap::{Args, Parser, Subcommand};

use crate::{
    commands::{deploy, list_networks, plan, status, transfer_admin, upgrade, verify_bytecode},
    constants::DEFAULT_MANIFEST_PATH,
    errors::ScriptError,
    utils::ScriptContext,
};

/// Deploy the auditSign contracts behind upgradeable proxies
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Name of the network to target, as named in the config
    #[arg(short, long, env = "NETWORK", default_value = "development")]
    pub network: String,

    /// Path to a network config file, the built-in config is used if unset
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Path to the deployments manifest
    #[arg(short, long, default_value = DEFAULT_MANIFEST_PATH)]
    pub manifest: PathBuf,

    /// Private key of the deployer
    #[arg(short, long, env = "PRIVATE_KEY", hide_env_values = true)]
    pub priv_key: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the configured networks
    Networks,
    /// Print which variant would be deployed, and how, without sending anything
    Plan(PlanArgs),
    /// Deploy the contract behind a proxy and hand over the proxy admin
    Deploy(DeployArgs),
    /// Hand ownership of the recorded proxy admin to the configured admin
    TransferAdmin(TransferAdminArgs),
    /// Upgrade the recorded proxy to a new implementation
    Upgrade(UpgradeArgs),
    /// Compare the recorded deployment against the chain
    Status,
    /// Compare the recorded implementation's code against its artifact
    VerifyBytecode,
}

impl Command {
    pub async fn run(self, ctx: &ScriptContext) -> Result<(), ScriptError> {
        match self {
            Command::Networks => list_networks(ctx),
            Command::Plan(args) => plan(args, ctx).await,
            Command::Deploy(args) => deploy(args, ctx).await,
            Command::TransferAdmin(args) => transfer_admin(args, ctx).await,
            Command::Upgrade(args) => upgrade(args, ctx).await,
            Command::Status => status(ctx).await,
            Command::VerifyBytecode => verify_bytecode(ctx).await,
        }
    }
}

/// Print the deployment plan for a chain
#[derive(Args)]
pub struct PlanArgs {
    /// Chain ID to plan for, defaults to the network's configured chain ID,
    /// or the one its node reports
    #[arg(long)]
    pub chain_id: Option<u64>,

    /// Root contract address referenced by mirror deployments
    #[arg(long)]
    pub root_address: Option<Address>,
}

/// Deploy the auditSign upgradeable proxy contract.
///
/// Concretely, this is a [`TransparentUpgradeableProxy`](https://docs.openzeppelin.com/contracts/4.x/api/proxy#TransparentUpgradeableProxy),
/// administered by a `ProxyAdmin` contract whose ownership is handed to the cold wallet.
///
/// Calls made directly to the `TransparentUpgradeableProxy` contract will be forwarded to the implementation contract.
/// Upgrade calls can only be made to the `TransparentUpgradeableProxy` through the `ProxyAdmin`.
#[derive(Args)]
pub struct DeployArgs {
    /// Root contract address referenced by mirror deployments, defaults to
    /// the mainnet proxy in the manifest, then the configured address
    #[arg(long)]
    pub root_address: Option<Address>,

    /// Deploy even if a live proxy is already recorded for the chain
    #[arg(long)]
    pub force: bool,

    /// Estimate the deployment and stop before sending anything
    #[arg(long)]
    pub dry_run: bool,
}

/// Hand ownership of the proxy admin to a new owner
#[derive(Args)]
pub struct TransferAdminArgs {
    /// The new owner, defaults to the configured admin
    #[arg(long)]
    pub new_owner: Option<Address>,
}

/// Upgrade the proxy implementation
#[derive(Args)]
pub struct UpgradeArgs {
    /// Address of the new implementation contract, the variant's artifact
    /// is deployed if unset
    #[arg(short, long)]
    pub implementation: Option<Address>,

    /// Optional calldata, in hex form, with which to
    /// call the implementation contract when upgrading
    #[arg(short, long)]
    pub calldata: Option<Bytes>,
}
