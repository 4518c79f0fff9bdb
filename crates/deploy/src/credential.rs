//! Signing credentials.

use std::fmt;

use alloy_core::primitives::Address;
use alloy_signer_local::{MnemonicBuilder, PrivateKeySigner, coins_bip39::English};
use anyhow::Context;

/// Mnemonic shared by local development nodes; account 0 funds deployments on the local chain.
pub const DEV_MNEMONIC: &str = "test test test test test test test test test test test junk";

/// A secret from which the deployment signer is derived.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Hex encoded secp256k1 private key, with or without a `0x` prefix.
    PrivateKey(String),
    /// BIP-39 phrase; the signer is account 0 of the standard Ethereum derivation path.
    Mnemonic(String),
}

impl Credential {
    /// Derive the local signer for this credential.
    pub fn signer(&self) -> anyhow::Result<PrivateKeySigner> {
        match self {
            Credential::PrivateKey(key) => key
                .trim()
                .trim_start_matches("0x")
                .parse::<PrivateKeySigner>()
                .context("Invalid private key"),
            Credential::Mnemonic(phrase) => MnemonicBuilder::<English>::default()
                .phrase(phrase.trim())
                .index(0)
                .context("Invalid derivation index")?
                .build()
                .context("Invalid mnemonic phrase"),
        }
    }

    /// The public address controlled by this credential.
    pub fn address(&self) -> anyhow::Result<Address> {
        Ok(self.signer()?.address())
    }

    fn kind(&self) -> &'static str {
        match self {
            Credential::PrivateKey(_) => "private key",
            Credential::Mnemonic(_) => "mnemonic",
        }
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<redacted {}>", self.kind())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&self.kind()).finish()
    }
}
