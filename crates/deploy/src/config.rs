//! Deployment configuration.
//!
//! The configuration is read from an optional TOML file (`Yieldly.toml`) layered with
//! `YIELDLY_` prefixed environment variables. Every field has a default, so running without
//! a file targets the local development chain.

use std::{collections::BTreeMap, path::Path, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::{Deserialize, Serialize};

use crate::{
    ConfirmationSettings, DeploymentPlan, NetworkProfile, Secrets, artifacts::DEFAULT_ARTIFACTS_DIR,
    network::LOCAL_NETWORK, secrets::SECRETS_FILENAME,
};

/// The default name of the configuration file.
pub const CONFIG_FILENAME: &str = "Yieldly.toml";

/// Prefix of the environment variables overriding configuration values.
pub const ENV_PREFIX: &str = "YIELDLY_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// Network used when none is selected on the command line.
    pub default_network: String,
    /// Directory holding the compiled contract artifacts.
    pub artifacts: PathBuf,
    /// Path of the secrets file.
    pub secrets: PathBuf,
    /// Interval between receipt polls.
    pub confirmation_poll_interval_ms: u64,
    /// How long a deployment may take to be mined.
    pub confirmation_timeout_secs: u64,
    /// Contracts to deploy.
    pub contracts: DeploymentPlan,
    /// Network profiles overriding or extending the built-in ones.
    pub networks: BTreeMap<String, NetworkProfile>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        let confirmation = ConfirmationSettings::default();
        Self {
            default_network: LOCAL_NETWORK.to_string(),
            artifacts: PathBuf::from(DEFAULT_ARTIFACTS_DIR),
            secrets: PathBuf::from(SECRETS_FILENAME),
            confirmation_poll_interval_ms: confirmation.poll_interval.as_millis() as u64,
            confirmation_timeout_secs: confirmation.timeout.as_secs(),
            contracts: DeploymentPlan::default(),
            networks: BTreeMap::new(),
        }
    }
}

impl DeployConfig {
    /// Load the configuration from `path` (if it exists) and the environment.
    ///
    /// A directory is searched for [`CONFIG_FILENAME`].
    pub fn load(path: &Path) -> Result<Self> {
        let config_path = if path.is_dir() {
            path.join(CONFIG_FILENAME)
        } else {
            path.to_path_buf()
        };

        if !config_path.exists() {
            tracing::debug!(path = %config_path.display(), "No configuration file, using defaults");
        }

        let config: Self = Figment::new()
            .merge(Toml::file(&config_path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| {
                format!(
                    "Failed to load configuration from {}",
                    config_path.display()
                )
            })?;

        tracing::debug!(path = %config_path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Save the configuration to a TOML file.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize deploy config to TOML")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        tracing::info!(path = %path.display(), "Configuration saved");
        Ok(())
    }

    pub fn confirmation(&self) -> ConfirmationSettings {
        ConfirmationSettings {
            poll_interval: Duration::from_millis(self.confirmation_poll_interval_ms),
            timeout: Duration::from_secs(self.confirmation_timeout_secs),
        }
    }

    /// Every available profile: built-ins first, overridden by configured profiles.
    pub fn networks(&self, secrets: &Secrets) -> BTreeMap<String, NetworkProfile> {
        let mut networks: BTreeMap<_, _> = NetworkProfile::builtin(secrets)
            .into_iter()
            .map(|profile| (profile.name.clone(), profile))
            .collect();

        for (name, profile) in &self.networks {
            networks.insert(
                name.clone(),
                NetworkProfile {
                    name: name.clone(),
                    ..profile.clone()
                },
            );
        }

        networks
    }

    /// Resolve the profile `name`, or the default network when `None`.
    pub fn network(&self, name: Option<&str>, secrets: &Secrets) -> Result<NetworkProfile> {
        let name = name.unwrap_or(&self.default_network);
        let mut networks = self.networks(secrets);

        networks.remove(name).with_context(|| {
            format!(
                "Unknown network `{}`. Available networks: [{}]",
                name,
                networks.keys().cloned().collect::<Vec<_>>().join(", ")
            )
        })
    }
}
