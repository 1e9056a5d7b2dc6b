use clap::Parser;
use scripts::{
    cli::Cli, config::Config, constants::DEFAULT_LOG_FILTER, errors::ScriptError,
    utils::ScriptContext,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ScriptError> {
    let Cli {
        network,
        config,
        manifest,
        priv_key,
        command,
    } = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::load(config.as_deref())?;
    let ctx = ScriptContext::new(config, network, manifest, priv_key);

    command.run(&ctx).await
}
