//! yieldly-deploy - Deployment library for the Yieldly contracts.
//!
//! This crate deploys the Yieldly NFT, the wrapped token and the marketplace to an
//! Ethereum-compatible network selected through a network profile.

mod artifacts;
pub use artifacts::{ArtifactRegistry, ContractArtifact, DEFAULT_ARTIFACTS_DIR};

mod backend;
pub use backend::{
    ConfirmationSettings, DeployBackend, DeploymentReceipt, PendingContract, RpcBackend,
};

mod config;
pub use config::{CONFIG_FILENAME, DeployConfig, ENV_PREFIX};

pub mod credential;
pub use credential::Credential;

mod deployer;
pub use deployer::{
    Confirmation, Deployer, DeploymentPlan, MARKETPLACE_CONTRACT, NFT_CONTRACT,
    WRAPPED_TOKEN_CONTRACT,
};

pub mod network;
pub use network::{Accounts, Endpoint, NetworkProfile};

mod report;
pub use report::{ContractRole, DeployedContract, DeploymentReport};

pub mod rpc;

mod secrets;
pub use secrets::{SECRETS_FILENAME, Secrets};

#[cfg(feature = "test-util")]
pub mod test_util;

pub mod tx;

pub use alloy_core::{dyn_abi::DynSolValue, primitives::Address};
