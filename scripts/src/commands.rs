//! Implementations of the various deploy scripts

use alloy::{
    primitives::{Address, Bytes},
    providers::Provider,
};
use alloy_sol_types::SolValue;
use itertools::Itertools;
use tracing::{info, warn};

use crate::{
    artifacts::{strip_metadata, Artifact, ArtifactStore},
    cli::{DeployArgs, PlanArgs, TransferAdminArgs, UpgradeArgs},
    constants::{PROXY_ADMIN_CONTRACT_NAME, PROXY_CONTRACT_NAME},
    errors::ScriptError,
    manifest::DeploymentRecord,
    selector::{select_variant, DeployParams},
    solidity::IProxyAdmin,
    types::{ContractVariant, DeploymentPlan},
    utils::{
        deploy_contract, estimate_deploy_gas, fetch_chain_id, has_code, read_proxy_admin,
        read_proxy_implementation, send_call, Connection, ScriptContext,
    },
};

/// List the configured networks
pub fn list_networks(ctx: &ScriptContext) -> Result<(), ScriptError> {
    for (name, network) in &ctx.config.networks {
        let chain_id = network
            .chain_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "*".to_string());
        let gas_price = network
            .gas_price_gwei
            .map(|gwei| format!("{gwei} gwei"))
            .unwrap_or_else(|| "auto".to_string());
        let marker = if *name == ctx.network_name { "*" } else { " " };
        let rpc_url = network.display_rpc_url();

        println!(
            "{marker} {name:<12} chain {chain_id:<6} gas {gas_price:<8} dry run {:<5} {rpc_url}",
            !network.skip_dry_run,
        );
    }

    Ok(())
}

/// Print the deployment plan for a chain without sending anything
pub async fn plan(args: PlanArgs, ctx: &ScriptContext) -> Result<(), ScriptError> {
    let chain_id = match args.chain_id {
        Some(chain_id) => chain_id,
        None => match ctx.network()?.chain_id {
            Some(chain_id) => chain_id,
            None => {
                let client = ctx.connect_read_only()?;
                fetch_chain_id(&client, ctx.network()?).await?
            }
        },
    };

    let manifest = ctx.manifest()?;
    let params = DeployParams::resolve(&ctx.config, &manifest, args.root_address);
    let plan = select_variant(chain_id, &params);

    if let Some(name) = ctx.config.network_name_for_chain(chain_id) {
        println!("network:         {name}");
    }
    println!("{plan}");
    if let Some(record) = manifest.get(chain_id) {
        println!(
            "note: a proxy is already recorded on this chain at {:#x}",
            record.proxy
        );
    }

    Ok(())
}

/// Deploy the selected contract variant behind a transparent upgradeable proxy,
/// then hand ownership of the proxy admin to the configured admin.
///
/// Concretely, this deploys the implementation, an OpenZeppelin `ProxyAdmin`
/// (unless a live one recorded for the chain is still owned by the deployer or
/// the admin), and a
/// [`TransparentUpgradeableProxy`](https://docs.openzeppelin.com/contracts/4.x/api/proxy#TransparentUpgradeableProxy)
/// initialized through its constructor calldata.
pub async fn deploy(args: DeployArgs, ctx: &ScriptContext) -> Result<(), ScriptError> {
    let conn = ctx.connect().await?;
    let mut manifest = ctx.manifest()?;

    let params = DeployParams::resolve(&ctx.config, &manifest, args.root_address);
    let plan = select_variant(conn.chain_id, &params);
    info!("deployment plan:\n{plan}");

    if plan.admin_owner == conn.deployer {
        return Err(ScriptError::OwnerIsDeployer(conn.deployer));
    }

    let existing = manifest.get(conn.chain_id).cloned();
    let proxy_live = match &existing {
        Some(record) => has_code(&conn.client, record.proxy).await?,
        None => false,
    };
    check_rerun(existing.as_ref(), proxy_live, args.force)?;

    let store = ArtifactStore::new(&ctx.config.contracts.artifacts_dir);
    let implementation_artifact = load_implementation(&store, plan.variant(), ctx)?;
    let proxy_artifact = store.load(PROXY_CONTRACT_NAME)?;

    if args.dry_run || !ctx.network()?.skip_dry_run {
        let gas = estimate_deploy_gas(&conn, implementation_artifact.bytecode.clone()).await?;
        info!(
            "dry run: deploying {} needs {} gas",
            implementation_artifact.contract_name, gas
        );
        if args.dry_run {
            println!("{plan}");
            println!("implementation deployment gas: {gas}");
            return Ok(());
        }
    }

    let implementation = deploy_contract(
        &conn,
        implementation_artifact.bytecode,
        &implementation_artifact.contract_name,
    )
    .await?;

    let reusable = reusable_proxy_admin(&conn, existing.as_ref(), plan.admin_owner).await?;
    let (proxy_admin, admin_owner) = match reusable {
        Some((proxy_admin, owner)) => {
            info!("reusing proxy admin at {:#x}", proxy_admin);
            (proxy_admin, owner)
        }
        None => {
            let artifact = store.load(PROXY_ADMIN_CONTRACT_NAME)?;
            let proxy_admin =
                deploy_contract(&conn, artifact.bytecode, &artifact.contract_name).await?;
            (proxy_admin, conn.deployer)
        }
    };

    let proxy_code = proxy_creation_code(&proxy_artifact, implementation, proxy_admin, &plan);
    let proxy = deploy_contract(&conn, proxy_code, &proxy_artifact.contract_name).await?;

    let actual_admin = read_proxy_admin(&conn.client, proxy).await?;
    if actual_admin != proxy_admin {
        return Err(ScriptError::ContractDeployment(format!(
            "proxy {:#x} reports admin {:#x}, expected {:#x}",
            proxy, actual_admin, proxy_admin
        )));
    }

    manifest.insert(DeploymentRecord {
        network: ctx.network_name.clone(),
        chain_id: conn.chain_id,
        variant: plan.variant(),
        implementation,
        proxy,
        proxy_admin,
        admin_owner,
    });
    ctx.save_manifest(&manifest)?;
    info!("recorded deployment in {}", ctx.manifest_path().display());

    transfer_proxy_admin_ownership(&conn, proxy_admin, plan.admin_owner).await?;
    manifest.update(conn.chain_id, |record| record.admin_owner = plan.admin_owner)?;
    ctx.save_manifest(&manifest)?;

    println!("Implementation contract deployed at {:#x}", implementation);
    println!("Proxy contract deployed at {:#x}", proxy);
    println!("Proxy admin contract at {:#x}", proxy_admin);
    println!("Proxy admin owned by {:#x}", plan.admin_owner);

    Ok(())
}

/// Hand ownership of the recorded proxy admin to the configured admin,
/// or to the given owner
pub async fn transfer_admin(
    args: TransferAdminArgs,
    ctx: &ScriptContext,
) -> Result<(), ScriptError> {
    let new_owner = args.new_owner.unwrap_or(ctx.config.governance.admin);

    let conn = ctx.connect().await?;
    let mut manifest = ctx.manifest()?;
    let proxy_admin = manifest.require(conn.chain_id)?.proxy_admin;

    transfer_proxy_admin_ownership(&conn, proxy_admin, new_owner).await?;

    manifest.update(conn.chain_id, |record| record.admin_owner = new_owner)?;
    ctx.save_manifest(&manifest)?;

    println!("Proxy admin {:#x} owned by {:#x}", proxy_admin, new_owner);
    Ok(())
}

/// Upgrade the recorded proxy to a new implementation.
///
/// If no implementation address is given, the variant's artifact is deployed
/// and used. The deployer must still own the proxy admin.
pub async fn upgrade(args: UpgradeArgs, ctx: &ScriptContext) -> Result<(), ScriptError> {
    let conn = ctx.connect().await?;
    let mut manifest = ctx.manifest()?;
    let record = manifest.require(conn.chain_id)?.clone();

    let proxy_admin = IProxyAdmin::new(record.proxy_admin, conn.client.clone());
    let owner = proxy_admin
        .owner()
        .call()
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;
    if owner != conn.deployer {
        return Err(ScriptError::NotAdminOwner {
            proxy_admin: record.proxy_admin,
            owner,
        });
    }

    let implementation = match args.implementation {
        Some(implementation) => implementation,
        None => {
            let store = ArtifactStore::new(&ctx.config.contracts.artifacts_dir);
            let artifact = load_implementation(&store, record.variant, ctx)?;
            deploy_contract(&conn, artifact.bytecode, &artifact.contract_name).await?
        }
    };

    info!(
        "upgrading proxy {:#x} to {:#x}",
        record.proxy, implementation
    );
    match args.calldata {
        Some(data) => {
            send_call(
                proxy_admin.upgradeAndCall(record.proxy, implementation, data),
                &conn.tx_opts,
            )
            .await?
        }
        None => {
            send_call(
                proxy_admin.upgrade(record.proxy, implementation),
                &conn.tx_opts,
            )
            .await?
        }
    };

    let actual = read_proxy_implementation(&conn.client, record.proxy).await?;
    if actual != implementation {
        return Err(ScriptError::ContractInteraction(format!(
            "proxy {:#x} points at {:#x} after upgrade, expected {:#x}",
            record.proxy, actual, implementation
        )));
    }

    manifest.update(conn.chain_id, |record| record.implementation = implementation)?;
    ctx.save_manifest(&manifest)?;

    println!("Proxy {:#x} upgraded to {:#x}", record.proxy, implementation);
    Ok(())
}

/// Print the recorded deployment next to what the chain reports
pub async fn status(ctx: &ScriptContext) -> Result<(), ScriptError> {
    let client = ctx.connect_read_only()?;
    let chain_id = fetch_chain_id(&client, ctx.network()?).await?;
    let manifest = ctx.manifest()?;
    let record = manifest.require(chain_id)?;

    let proxy_live = has_code(&client, record.proxy).await?;
    println!("network:         {} (chain {})", record.network, chain_id);
    println!("variant:         {}", record.variant);
    println!("proxy:           {:#x} (live: {})", record.proxy, proxy_live);
    if !proxy_live {
        return Ok(());
    }

    let implementation = read_proxy_implementation(&client, record.proxy).await?;
    let proxy_admin = read_proxy_admin(&client, record.proxy).await?;
    let owner = IProxyAdmin::new(proxy_admin, client.clone())
        .owner()
        .call()
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

    let rows = [
        ("implementation", record.implementation, implementation),
        ("proxy admin", record.proxy_admin, proxy_admin),
        ("admin owner", record.admin_owner, owner),
    ];
    let mismatches = rows
        .iter()
        .filter(|(_, recorded, actual)| recorded != actual)
        .map(|(name, _, _)| *name)
        .collect_vec();

    for (name, recorded, actual) in rows {
        println!("{:<16} {:#x} (recorded {:#x})", format!("{name}:"), actual, recorded);
    }
    if !mismatches.is_empty() {
        warn!("chain state differs from the manifest: {}", mismatches.join(", "));
    }

    Ok(())
}

/// Check that the recorded implementation runs the code of the compiled artifact
pub async fn verify_bytecode(ctx: &ScriptContext) -> Result<(), ScriptError> {
    let client = ctx.connect_read_only()?;
    let chain_id = fetch_chain_id(&client, ctx.network()?).await?;
    let manifest = ctx.manifest()?;
    let record = manifest.require(chain_id)?;

    let store = ArtifactStore::new(&ctx.config.contracts.artifacts_dir);
    let artifact = store.load(record.variant.contract_name())?;
    artifact.runtime_code()?;

    let onchain = client
        .get_code_at(record.implementation)
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

    if !runtime_code_matches(&artifact, &onchain) {
        return Err(ScriptError::BytecodeMismatch(record.implementation));
    }

    println!(
        "{} at {:#x} matches the compiled artifact",
        artifact.contract_name, record.implementation
    );
    Ok(())
}

// -----------
// | Helpers |
// -----------

/// Hand ownership of a proxy admin to a new owner.
///
/// Succeeds without sending anything if the new owner already owns it.
pub async fn transfer_proxy_admin_ownership(
    conn: &Connection,
    proxy_admin: Address,
    new_owner: Address,
) -> Result<(), ScriptError> {
    if new_owner == conn.deployer {
        return Err(ScriptError::OwnerIsDeployer(new_owner));
    }

    let admin = IProxyAdmin::new(proxy_admin, conn.client.clone());
    let owner = admin
        .owner()
        .call()
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

    if owner == new_owner {
        info!(
            "proxy admin {:#x} already owned by {:#x}",
            proxy_admin, new_owner
        );
        return Ok(());
    }
    if owner != conn.deployer {
        return Err(ScriptError::NotAdminOwner { proxy_admin, owner });
    }

    info!(
        "transferring proxy admin {:#x} ownership to {:#x}",
        proxy_admin, new_owner
    );
    send_call(admin.transferOwnership(new_owner), &conn.tx_opts).await?;

    Ok(())
}

/// Load the implementation artifact of a variant, checking how it was compiled
fn load_implementation(
    store: &ArtifactStore,
    variant: ContractVariant,
    ctx: &ScriptContext,
) -> Result<Artifact, ScriptError> {
    let artifact = store.load(variant.contract_name())?;
    artifact.check_compiler(&ctx.config.compiler)?;
    Ok(artifact)
}

/// Check whether a deployment may proceed given what is recorded for the chain.
///
/// A live recorded proxy blocks the deployment unless `force` is set, a recorded
/// proxy without code is treated as stale.
pub fn check_rerun(
    existing: Option<&DeploymentRecord>,
    proxy_live: bool,
    force: bool,
) -> Result<(), ScriptError> {
    let Some(record) = existing else {
        return Ok(());
    };

    if !proxy_live {
        warn!(
            "recorded proxy {:#x} has no code, treating chain {} as fresh",
            record.proxy, record.chain_id
        );
        return Ok(());
    }
    if !force {
        return Err(ScriptError::AlreadyDeployed {
            chain_id: record.chain_id,
            proxy: record.proxy,
        });
    }

    warn!(
        "redeploying over the live proxy at {:#x} on chain {}",
        record.proxy, record.chain_id
    );
    Ok(())
}

/// The proxy admin recorded for the chain and its current owner, if it is still
/// live and owned by either the deployer or the ownership target
pub async fn reusable_proxy_admin(
    conn: &Connection,
    existing: Option<&DeploymentRecord>,
    target_owner: Address,
) -> Result<Option<(Address, Address)>, ScriptError> {
    let Some(record) = existing else {
        return Ok(None);
    };
    if !has_code(&conn.client, record.proxy_admin).await? {
        return Ok(None);
    }

    let owner = IProxyAdmin::new(record.proxy_admin, conn.client.clone())
        .owner()
        .call()
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;
    if owner != conn.deployer && owner != target_owner {
        warn!(
            "recorded proxy admin {:#x} is owned by {:#x}, deploying a new one",
            record.proxy_admin, owner
        );
        return Ok(None);
    }

    Ok(Some((record.proxy_admin, owner)))
}

/// The creation code of the proxy: its bytecode followed by the ABI-encoded
/// constructor arguments `(logic, admin, data)`
pub fn proxy_creation_code(
    proxy_artifact: &Artifact,
    implementation: Address,
    proxy_admin: Address,
    plan: &DeploymentPlan,
) -> Bytes {
    let constructor_args =
        (implementation, proxy_admin, plan.args.calldata()).abi_encode_params();

    let mut code = proxy_artifact.bytecode.to_vec();
    code.extend_from_slice(&constructor_args);
    code.into()
}

/// Whether on-chain runtime code matches an artifact, ignoring the metadata section
pub fn runtime_code_matches(artifact: &Artifact, onchain: &[u8]) -> bool {
    !onchain.is_empty()
        && !artifact.deployed_bytecode.is_empty()
        && artifact.runtime_code_without_metadata() == strip_metadata(onchain)
}
