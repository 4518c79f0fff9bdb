use std::path::PathBuf;

use clap::Parser;
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "yieldly")]
#[command(
    author,
    version,
    about = "Deploy the Yieldly NFT, wrapped token and marketplace contracts"
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(short, long, env = "YIELDLY_VERBOSITY", default_value_t = LevelFilter::INFO)]
    pub verbosity: LevelFilter,

    /// The network profile to deploy to (`hardhat`, `testnet`, `mainnet` or a configured one).
    ///
    /// If not provided, the `default_network` of the configuration is used.
    #[arg(short, long, env = "YIELDLY_NETWORK")]
    pub network: Option<String>,

    /// Path to the configuration file, or to a directory containing `Yieldly.toml`.
    #[arg(long, alias = "conf", env = "YIELDLY_CONFIG", default_value = ".")]
    pub config: PathBuf,

    /// Path to the secrets file holding `owner` and `ownerPub`.
    #[arg(long, env = "YIELDLY_SECRETS")]
    pub secrets: Option<PathBuf>,

    /// Directory of the compiled contract artifacts.
    #[arg(long, env = "YIELDLY_ARTIFACTS")]
    pub artifacts: Option<PathBuf>,

    /// Wait for the wrapped token deployment to be mined before deploying the marketplace.
    #[arg(long, env = "YIELDLY_WAIT_WRAPPED_TOKEN")]
    pub wait_wrapped_token: bool,

    /// Write the deployment report as JSON to this file.
    #[arg(short, long, env = "YIELDLY_OUT")]
    pub out: Option<PathBuf>,

    /// Write the effective configuration, after command line overrides, to this file.
    #[arg(long, env = "YIELDLY_SAVE_CONFIG")]
    pub save_config: Option<PathBuf>,

    /// Print the available network profiles and exit.
    #[arg(long)]
    pub list_networks: bool,
}
