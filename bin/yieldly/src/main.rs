//! yieldly deploys the Yieldly NFT, wrapped token and marketplace contracts to an EVM network.

mod cli;

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use clap::Parser;
use comfy_table::{Table, presets::UTF8_FULL};

use cli::Cli;
use yieldly_deploy::{
    ArtifactRegistry, Confirmation, DeployConfig, Deployer, DeploymentReport, NetworkProfile,
    RpcBackend, Secrets,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize the logger.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .init();

    let mut config = DeployConfig::load(&cli.config)?;
    if let Some(secrets) = cli.secrets {
        config.secrets = secrets;
    }
    if let Some(artifacts) = cli.artifacts {
        config.artifacts = artifacts;
    }
    if cli.wait_wrapped_token {
        config.contracts.wrapped_token_confirmation = Confirmation::Wait;
    }

    if let Some(path) = &cli.save_config {
        config.save_to_file(path)?;
    }

    // Built-in profiles read their accounts from the secrets.
    let secrets = Secrets::load_from_file(&config.secrets)?;

    if cli.list_networks {
        println!("{}", networks_table(&config.networks(&secrets)));
        return Ok(());
    }

    let profile = config.network(cli.network.as_deref(), &secrets)?;
    let credential = profile.credential()?;
    let signer = credential
        .signer()
        .with_context(|| format!("Failed to load the signing account of {}", profile.name))?;

    tracing::info!(
        network = %profile.name,
        endpoint = %profile.endpoint(),
        chain_id = profile.chain_id,
        owner = %credential,
        owner_pub = %secrets.owner_pub,
        deployer = %signer.address(),
        "Deploying Yieldly contracts..."
    );

    let registry = ArtifactRegistry::load_from_dir(&config.artifacts)?;
    let backend = RpcBackend::new(&profile, signer, registry, config.confirmation())?;
    backend.check_chain_id().await?;

    let report = DeploymentReport::new(&profile.name, profile.chain_id, backend.sender());
    let deployer = Deployer::new(backend, secrets.owner_pub, config.contracts);
    let report = deployer.deploy(report).await?;

    println!("{}", report.to_table());

    if let Some(out) = &cli.out {
        report.save_to_file(out)?;
    }

    Ok(())
}

fn networks_table(networks: &BTreeMap<String, NetworkProfile>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Network", "Endpoint", "Chain ID", "Gas price"]);

    for (name, profile) in networks {
        table.add_row(vec![
            name.clone(),
            profile.endpoint().to_string(),
            profile.chain_id.to_string(),
            profile
                .gas_price
                .map(|price| price.to_string())
                .unwrap_or_else(|| "node".to_string()),
        ]);
    }

    table
}
