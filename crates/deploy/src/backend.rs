//! Deployment backends.
//!
//! [`DeployBackend`] is the seam between the deployment routine and the chain: it hands out
//! contract factories by name, submits deployments and waits for confirmations.
//! [`RpcBackend`] implements it over JSON-RPC with a local signer.

use std::{
    future::Future,
    sync::{Mutex, MutexGuard},
    time::Duration,
};

use alloy_core::{
    dyn_abi::DynSolValue,
    primitives::{Address, B256},
};
use alloy_signer_local::PrivateKeySigner;
use anyhow::{Context, Result};
use backon::{ConstantBuilder, Retryable};
use serde::Serialize;
use url::Url;

use crate::{
    ArtifactRegistry, ContractArtifact, NetworkProfile,
    rpc::{self, EthRpc},
    tx,
};

/// A submitted deployment whose transaction may not be mined yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingContract {
    /// Contract name the factory was looked up with.
    pub contract: String,
    /// Address the contract is created at, derived from the sender and nonce.
    pub address: Address,
    pub tx_hash: B256,
}

/// Outcome of waiting for a deployment transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeploymentReceipt {
    pub address: Address,
    pub block_number: u64,
}

/// Chain access needed to deploy contracts.
pub trait DeployBackend: Send + Sync {
    /// Handle able to deploy one compiled contract.
    type Factory: Send + Sync;

    /// Look up the factory of a contract by name.
    fn contract_factory(&self, name: &str) -> impl Future<Output = Result<Self::Factory>> + Send;

    /// Submit a deployment with the given constructor arguments.
    fn deploy(
        &self,
        factory: &Self::Factory,
        args: Vec<DynSolValue>,
    ) -> impl Future<Output = Result<PendingContract>> + Send;

    /// Wait until the deployment is included in a block and its code is on-chain.
    fn wait_deployed(
        &self,
        pending: &PendingContract,
    ) -> impl Future<Output = Result<DeploymentReceipt>> + Send;
}

/// Settings for confirmation polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationSettings {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for ConfirmationSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            timeout: Duration::from_secs(300),
        }
    }
}

impl ConfirmationSettings {
    fn max_polls(&self) -> usize {
        let interval = self.poll_interval.as_millis().max(1);
        (self.timeout.as_millis() / interval).max(1) as usize
    }
}

/// JSON-RPC backend signing legacy transactions locally.
pub struct RpcBackend {
    rpc: EthRpc,
    rpc_url: Url,
    chain_id: u64,
    gas_price: Option<u128>,
    signer: PrivateKeySigner,
    registry: ArtifactRegistry,
    confirmation: ConfirmationSettings,
    /// Next nonce to use, fetched from the node on first deployment.
    nonce: Mutex<Option<u64>>,
}

impl RpcBackend {
    /// Build a backend for `profile`. No request is made until the first call.
    pub fn new(
        profile: &NetworkProfile,
        signer: PrivateKeySigner,
        registry: ArtifactRegistry,
        confirmation: ConfirmationSettings,
    ) -> Result<Self> {
        let rpc_url = profile.endpoint().rpc_url()?;
        let client = rpc::create_client(profile.request_timeout())?;

        Ok(Self {
            rpc: EthRpc::new(client, rpc_url.as_str()),
            rpc_url,
            chain_id: profile.chain_id,
            gas_price: profile.gas_price.map(u128::from),
            signer,
            registry,
            confirmation,
            nonce: Mutex::new(None),
        })
    }

    pub fn rpc_url(&self) -> &Url {
        &self.rpc_url
    }

    pub fn sender(&self) -> Address {
        self.signer.address()
    }

    /// Fail unless the node reports the chain id of the profile.
    pub async fn check_chain_id(&self) -> Result<()> {
        let remote = self
            .rpc
            .chain_id()
            .await
            .with_context(|| format!("Failed to reach RPC endpoint {}", self.rpc_url))?;

        if remote != self.chain_id {
            anyhow::bail!(
                "Network chain id mismatch: profile expects {}, endpoint {} reports {}",
                self.chain_id,
                self.rpc_url,
                remote
            );
        }

        tracing::debug!(chain_id = remote, rpc_url = %self.rpc_url, "Chain id verified");
        Ok(())
    }

    fn nonce_slot(&self) -> Result<MutexGuard<'_, Option<u64>>> {
        self.nonce
            .lock()
            .map_err(|_| anyhow::anyhow!("Nonce lock poisoned"))
    }

    async fn next_nonce(&self) -> Result<u64> {
        let cached = *self.nonce_slot()?;
        let nonce = match cached {
            Some(nonce) => nonce,
            None => self
                .rpc
                .pending_nonce(self.sender())
                .await
                .context("Failed to fetch account nonce")?,
        };

        *self.nonce_slot()? = Some(nonce + 1);
        Ok(nonce)
    }

    async fn gas_price(&self) -> Result<u128> {
        match self.gas_price {
            Some(price) => Ok(price),
            None => self
                .rpc
                .gas_price()
                .await
                .context("Failed to fetch gas price"),
        }
    }
}

impl DeployBackend for RpcBackend {
    type Factory = ContractArtifact;

    async fn contract_factory(&self, name: &str) -> Result<ContractArtifact> {
        self.registry.get(name).cloned()
    }

    async fn deploy(
        &self,
        factory: &ContractArtifact,
        args: Vec<DynSolValue>,
    ) -> Result<PendingContract> {
        let code = factory.deploy_code(&args)?;
        let sender = self.sender();

        let gas_limit = self
            .rpc
            .estimate_create_gas(sender, &code)
            .await
            .with_context(|| format!("Failed to estimate gas for {}", factory.contract_name))?;
        let gas_price = self.gas_price().await?;
        let nonce = self.next_nonce().await?;

        let tx = tx::creation(self.chain_id, nonce, gas_price, gas_limit, code);
        let (raw, local_hash) = tx::sign(tx, &self.signer)?;

        tracing::debug!(
            contract = %factory.contract_name,
            nonce,
            gas_limit,
            gas_price,
            "Submitting deployment transaction"
        );

        let tx_hash = self
            .rpc
            .send_raw_transaction(&raw)
            .await
            .with_context(|| {
                format!("Failed to submit deployment of {}", factory.contract_name)
            })?;

        if tx_hash != local_hash {
            tracing::warn!(%tx_hash, %local_hash, "Node returned an unexpected transaction hash");
        }

        Ok(PendingContract {
            contract: factory.contract_name.clone(),
            address: sender.create(nonce),
            tx_hash,
        })
    }

    async fn wait_deployed(&self, pending: &PendingContract) -> Result<DeploymentReceipt> {
        let rpc = &self.rpc;
        let tx_hash = pending.tx_hash;

        let (receipt, block_number) = (|| async {
            let receipt = rpc
                .transaction_receipt(tx_hash)
                .await?
                .context("Transaction not mined yet")?;
            // Pending receipts carry no block number.
            let block_number = receipt
                .block_number
                .context("Transaction not mined yet")?
                .to::<u64>();
            anyhow::Ok((receipt, block_number))
        })
        .retry(
            ConstantBuilder::default()
                .with_delay(self.confirmation.poll_interval)
                .with_max_times(self.confirmation.max_polls()),
        )
        .notify(|err, _| {
            tracing::trace!(error = %err, %tx_hash, "Waiting for deployment receipt...");
        })
        .await
        .with_context(|| {
            format!(
                "Deployment of {} not confirmed within {:?}",
                pending.contract, self.confirmation.timeout
            )
        })?;

        if !receipt.succeeded() {
            anyhow::bail!(
                "Deployment of {} reverted in transaction {}",
                pending.contract,
                tx_hash
            );
        }

        let address = match receipt.contract_address {
            Some(address) if address != pending.address => {
                tracing::warn!(
                    predicted = %pending.address,
                    actual = %address,
                    "Deployed address differs from the predicted address"
                );
                address
            }
            Some(address) => address,
            None => pending.address,
        };

        let code = rpc
            .code_at(address)
            .await
            .with_context(|| format!("Failed to fetch code of {}", pending.contract))?;
        if code.is_empty() {
            anyhow::bail!("Contract {} has no code at {}", pending.contract, address);
        }

        Ok(DeploymentReceipt {
            address,
            block_number,
        })
    }
}
