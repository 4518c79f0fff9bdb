//! Owner secrets loaded from a JSON file at startup.

use std::path::Path;

use alloy_core::primitives::Address;
use anyhow::{Context, Result};
use serde::Deserialize;

/// The default name of the secrets file.
pub const SECRETS_FILENAME: &str = "secrets.json";

/// Contents of the secrets file.
///
/// ```json
/// { "owner": "<private key or mnemonic>", "ownerPub": "0x..." }
/// ```
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Secrets {
    /// Private key or mnemonic phrase. Network profiles decide how it is interpreted.
    pub owner: String,
    /// Public address of the owner, handed to the marketplace constructor.
    pub owner_pub: Address,
}

impl Secrets {
    /// Load the secrets from a JSON file.
    ///
    /// A missing file, a missing field or an unparseable address is an error.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read secrets from {}", path.display()))?;
        let secrets: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse secrets file {}", path.display()))?;

        if secrets.owner.trim().is_empty() {
            anyhow::bail!("Secrets file {} has an empty `owner`", path.display());
        }

        tracing::debug!(path = %path.display(), owner_pub = %secrets.owner_pub, "Secrets loaded");
        Ok(secrets)
    }
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("owner", &"<redacted>")
            .field("owner_pub", &self.owner_pub)
            .finish()
    }
}
