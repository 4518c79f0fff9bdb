//! Network profiles.
//!
//! A profile selects the endpoint, chain id, gas price and signing account used for a
//! deployment. Three profiles are built in (`hardhat`, `testnet`, `mainnet`); the
//! configuration file can override them or add new ones.

use std::time::Duration;

use anyhow::Context;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Credential, Secrets, credential::DEV_MNEMONIC, rpc};

/// Name of the local development profile, also the default network.
pub const LOCAL_NETWORK: &str = "hardhat";
/// Name of the test network profile (Polygon Mumbai).
pub const TESTNET_NETWORK: &str = "testnet";
/// Name of the production network profile (Polygon PoS).
pub const MAINNET_NETWORK: &str = "mainnet";

/// The endpoint of a local development node.
pub const LOCAL_RPC_URL: &str = "http://127.0.0.1:8545/";

/// Chain id of the local development chain.
pub const LOCAL_CHAIN_ID: u64 = 1337;

/// Signing accounts of a profile.
///
/// Accepts either a list of private keys or a `{ mnemonic = "..." }` table.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Accounts {
    PrivateKeys(Vec<String>),
    Mnemonic { mnemonic: String },
}

impl std::fmt::Debug for Accounts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Accounts::PrivateKeys(keys) => write!(f, "PrivateKeys(<{} redacted>)", keys.len()),
            Accounts::Mnemonic { .. } => write!(f, "Mnemonic(<redacted>)"),
        }
    }
}

/// Where the JSON-RPC requests of a profile go.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum Endpoint {
    /// The local development node.
    #[display("local node")]
    Local,
    #[display("{_0}")]
    Remote(Url),
}

impl Endpoint {
    pub fn rpc_url(&self) -> anyhow::Result<Url> {
        match self {
            Endpoint::Local => Url::parse(LOCAL_RPC_URL).context("Failed to parse local RPC URL"),
            Endpoint::Remote(url) => Ok(url.clone()),
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Endpoint::Local)
    }
}

/// Configuration of one target network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkProfile {
    /// Profile name. Filled from the table key when loaded from a configuration file.
    #[serde(default)]
    pub name: String,
    /// JSON-RPC endpoint. Absent selects the local development node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<Url>,
    #[serde(alias = "chainId")]
    pub chain_id: u64,
    /// Gas price in wei. Absent asks the node.
    #[serde(default, alias = "gasPrice", skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accounts: Option<Accounts>,
    /// Request timeout in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl NetworkProfile {
    /// The in-process development chain: no url, no gas price, development accounts.
    pub fn local() -> Self {
        Self {
            name: LOCAL_NETWORK.to_string(),
            url: None,
            chain_id: LOCAL_CHAIN_ID,
            gas_price: None,
            accounts: None,
            timeout: None,
        }
    }

    /// Polygon Mumbai, signing with the owner secret as a private key.
    pub fn testnet(secrets: &Secrets) -> Self {
        Self {
            name: TESTNET_NETWORK.to_string(),
            url: Url::parse("https://matic-mumbai.chainstacklabs.com").ok(),
            chain_id: 80001,
            gas_price: Some(20_000_000_000),
            accounts: Some(Accounts::PrivateKeys(vec![secrets.owner.clone()])),
            timeout: None,
        }
    }

    /// Polygon PoS, signing with the owner secret as a mnemonic.
    pub fn mainnet(secrets: &Secrets) -> Self {
        Self {
            name: MAINNET_NETWORK.to_string(),
            url: Url::parse("https://polygon-rpc.com/").ok(),
            chain_id: 137,
            gas_price: Some(100_000_000_000),
            accounts: Some(Accounts::Mnemonic {
                mnemonic: secrets.owner.clone(),
            }),
            timeout: Some(60_000),
        }
    }

    /// The built-in profiles, in display order.
    pub fn builtin(secrets: &Secrets) -> Vec<Self> {
        vec![Self::local(), Self::testnet(secrets), Self::mainnet(secrets)]
    }

    pub fn endpoint(&self) -> Endpoint {
        match &self.url {
            None => Endpoint::Local,
            Some(url) => Endpoint::Remote(url.clone()),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        self.timeout
            .map(Duration::from_millis)
            .unwrap_or(rpc::DEFAULT_TIMEOUT)
    }

    /// The credential of the first configured account.
    ///
    /// A local profile without accounts signs with the development mnemonic.
    pub fn credential(&self) -> anyhow::Result<Credential> {
        match &self.accounts {
            Some(Accounts::PrivateKeys(keys)) => keys
                .first()
                .cloned()
                .map(Credential::PrivateKey)
                .with_context(|| format!("Network `{}` has an empty account list", self.name)),
            Some(Accounts::Mnemonic { mnemonic }) => Ok(Credential::Mnemonic(mnemonic.clone())),
            None if self.endpoint().is_local() => {
                Ok(Credential::Mnemonic(DEV_MNEMONIC.to_string()))
            }
            None => anyhow::bail!("Network `{}` has no accounts configured", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_core::primitives::Address;

    fn secrets() -> Secrets {
        Secrets {
            owner: "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80".to_string(),
            owner_pub: Address::ZERO,
        }
    }

    #[test]
    fn test_builtin_profiles() {
        let secrets = secrets();

        let local = NetworkProfile::local();
        assert_eq!(local.chain_id, 1337);
        assert!(local.gas_price.is_none());
        assert!(local.endpoint().is_local());

        let testnet = NetworkProfile::testnet(&secrets);
        assert_eq!(testnet.chain_id, 80001);
        assert_eq!(testnet.gas_price, Some(20_000_000_000));
        assert_eq!(
            testnet.credential().unwrap(),
            Credential::PrivateKey(secrets.owner.clone())
        );
        assert_eq!(testnet.request_timeout(), rpc::DEFAULT_TIMEOUT);

        let mainnet = NetworkProfile::mainnet(&secrets);
        assert_eq!(mainnet.chain_id, 137);
        assert_eq!(mainnet.gas_price, Some(100_000_000_000));
        assert_eq!(mainnet.credential().unwrap(), Credential::Mnemonic(secrets.owner));
        assert_eq!(mainnet.request_timeout(), Duration::from_secs(60));
        assert_eq!(
            mainnet.endpoint().rpc_url().unwrap().as_str(),
            "https://polygon-rpc.com/"
        );
    }

    #[test]
    fn test_missing_url_targets_local_node() {
        let profile: NetworkProfile = toml::from_str("chain_id = 31337").unwrap();
        assert_eq!(profile.endpoint(), Endpoint::Local);
        assert_eq!(profile.endpoint().rpc_url().unwrap().as_str(), LOCAL_RPC_URL);
        assert_eq!(
            profile.credential().unwrap(),
            Credential::Mnemonic(DEV_MNEMONIC.to_string())
        );
    }

    #[test]
    fn test_remote_profile_requires_accounts() {
        let profile: NetworkProfile = toml::from_str(
            r#"
            name = "amoy"
            url = "https://rpc-amoy.polygon.technology"
            chainId = 80002
            "#,
        )
        .unwrap();
        assert!(!profile.endpoint().is_local());
        assert!(profile.credential().is_err());
    }

    #[test]
    fn test_parse_accounts() {
        let profile: NetworkProfile = toml::from_str(
            r#"
            url = "https://rpc.example.org"
            chain_id = 5
            gasPrice = 1000
            accounts = ["0x01", "0x02"]
            timeout = 1500
            "#,
        )
        .unwrap();
        assert_eq!(profile.gas_price, Some(1000));
        assert_eq!(profile.request_timeout(), Duration::from_millis(1500));
        assert_eq!(profile.credential().unwrap(), Credential::PrivateKey("0x01".to_string()));

        let profile: NetworkProfile = toml::from_str(
            r#"
            url = "https://rpc.example.org"
            chain_id = 5
            accounts = { mnemonic = "test test test test test test test test test test test junk" }
            "#,
        )
        .unwrap();
        assert!(matches!(profile.accounts, Some(Accounts::Mnemonic { .. })));

        let empty: NetworkProfile = toml::from_str(
            r#"
            url = "https://rpc.example.org"
            chain_id = 5
            accounts = []
            "#,
        )
        .unwrap();
        assert!(empty.credential().is_err());
    }

    #[test]
    fn test_accounts_debug_is_redacted() {
        let accounts = Accounts::Mnemonic {
            mnemonic: DEV_MNEMONIC.to_string(),
        };
        assert!(!format!("{accounts:?}").contains("junk"));
    }
}
