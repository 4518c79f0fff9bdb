use alloy_core::{dyn_abi::DynSolValue, primitives::Address};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    DeployBackend, DeployedContract, DeploymentReport, PendingContract, report::ContractRole,
};

/// Default artifact name of the NFT contract.
pub const NFT_CONTRACT: &str = "Yieldly";
/// Default artifact name of the wrapped token contract.
pub const WRAPPED_TOKEN_CONTRACT: &str = "WMATIC";
/// Default artifact name of the marketplace contract.
pub const MARKETPLACE_CONTRACT: &str = "YieldlyMarketplace";

/// Whether a deployment is awaited before its address is used.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Confirmation {
    /// Wait for the deployment transaction to be mined.
    Wait,
    /// Use the predicted address as soon as the transaction is submitted.
    Skip,
}

/// Which artifacts to deploy, and how the wrapped token is awaited.
///
/// The wrapped token address is read before confirmation by default; setting
/// `wrapped_token_confirmation` to [`Confirmation::Wait`] makes the marketplace
/// deployment wait for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentPlan {
    pub nft_contract: String,
    pub wrapped_token_contract: String,
    pub marketplace_contract: String,
    pub wrapped_token_confirmation: Confirmation,
}

impl Default for DeploymentPlan {
    fn default() -> Self {
        Self {
            nft_contract: NFT_CONTRACT.to_string(),
            wrapped_token_contract: WRAPPED_TOKEN_CONTRACT.to_string(),
            marketplace_contract: MARKETPLACE_CONTRACT.to_string(),
            wrapped_token_confirmation: Confirmation::Skip,
        }
    }
}

/// Deploys the NFT, the wrapped token and the marketplace, in that order.
///
/// The marketplace is constructed with `[wrapped_token, owner_pub]`. Contracts are not
/// deployed transactionally: a failure leaves earlier deployments on-chain, and every run
/// deploys fresh instances.
pub struct Deployer<B> {
    backend: B,
    owner_pub: Address,
    plan: DeploymentPlan,
}

impl<B: DeployBackend> Deployer<B> {
    pub fn new(backend: B, owner_pub: Address, plan: DeploymentPlan) -> Self {
        Self {
            backend,
            owner_pub,
            plan,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn plan(&self) -> &DeploymentPlan {
        &self.plan
    }

    /// Run the three deployments and collect their handles into `report`.
    pub async fn deploy(&self, mut report: DeploymentReport) -> Result<DeploymentReport> {
        tracing::info!(owner_pub = %self.owner_pub, "Starting deployment process...");

        let nft = self
            .deploy_contract(
                ContractRole::Nft,
                &self.plan.nft_contract,
                vec![],
                Confirmation::Wait,
            )
            .await?;
        tracing::info!(address = %nft.address, "NFT deployed to: {}", nft.address);
        report.contracts.push(nft);

        let wrapped_token = self
            .deploy_contract(
                ContractRole::WrappedToken,
                &self.plan.wrapped_token_contract,
                vec![],
                self.plan.wrapped_token_confirmation,
            )
            .await?;
        tracing::info!(
            address = %wrapped_token.address,
            confirmed = wrapped_token.is_confirmed(),
            "WMatic deployed to: {}",
            wrapped_token.address
        );
        let wrapped_token_address = wrapped_token.address;
        report.contracts.push(wrapped_token);

        tracing::info!("Going to deploy marketplace...");
        let marketplace = self
            .deploy_contract(
                ContractRole::Marketplace,
                &self.plan.marketplace_contract,
                vec![
                    DynSolValue::Address(wrapped_token_address),
                    DynSolValue::Address(self.owner_pub),
                ],
                Confirmation::Wait,
            )
            .await?;
        tracing::info!(
            address = %marketplace.address,
            "Marketplace deployed to: {}",
            marketplace.address
        );
        report.contracts.push(marketplace);

        tracing::info!("✓ Deployment complete!");
        Ok(report)
    }

    async fn deploy_contract(
        &self,
        role: ContractRole,
        name: &str,
        args: Vec<DynSolValue>,
        confirmation: Confirmation,
    ) -> Result<DeployedContract> {
        tracing::info!(%role, contract = name, "Deploying contract...");

        let factory = self
            .backend
            .contract_factory(name)
            .await
            .with_context(|| format!("Failed to get contract factory for {}", name))?;

        let pending = self
            .backend
            .deploy(&factory, args)
            .await
            .with_context(|| format!("Failed to deploy {} contract {}", role, name))?;
        tracing::info!(
            %role,
            contract = name,
            tx_hash = %pending.tx_hash,
            "Contract creation transaction submitted"
        );

        match confirmation {
            Confirmation::Skip => Ok(DeployedContract::unconfirmed(role, pending)),
            Confirmation::Wait => {
                let receipt = self
                    .backend
                    .wait_deployed(&pending)
                    .await
                    .with_context(|| format!("Failed to confirm {} contract {}", role, name))?;
                let PendingContract { contract, tx_hash, .. } = pending;
                Ok(DeployedContract {
                    role,
                    contract,
                    address: receipt.address,
                    tx_hash,
                    block_number: Some(receipt.block_number),
                })
            }
        }
    }
}
