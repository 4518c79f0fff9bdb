//! Deployment results.

use std::path::Path;

use alloy_core::primitives::{Address, B256};
use anyhow::{Context, Result};
use comfy_table::{Table, presets::UTF8_FULL};
use serde::Serialize;

use crate::PendingContract;

/// The part a contract plays in the Yieldly suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
pub enum ContractRole {
    #[strum(serialize = "NFT")]
    Nft,
    #[strum(serialize = "WrappedToken")]
    WrappedToken,
    #[strum(serialize = "Marketplace")]
    Marketplace,
}

/// Handle of a deployed contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployedContract {
    pub role: ContractRole,
    pub contract: String,
    pub address: Address,
    pub tx_hash: B256,
    /// Block the deployment was mined in. `None` when the deployment was not awaited.
    pub block_number: Option<u64>,
}

impl DeployedContract {
    /// Handle for a deployment used without waiting for confirmation.
    pub fn unconfirmed(role: ContractRole, pending: PendingContract) -> Self {
        Self {
            role,
            contract: pending.contract,
            address: pending.address,
            tx_hash: pending.tx_hash,
            block_number: None,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.block_number.is_some()
    }
}

/// Summary of one deployment run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentReport {
    pub network: String,
    pub chain_id: u64,
    /// Address signing the deployment transactions.
    pub deployer: Address,
    /// RFC 3339 start time of the run.
    pub started_at: String,
    pub contracts: Vec<DeployedContract>,
}

impl DeploymentReport {
    /// An empty report stamped with the current time.
    pub fn new(network: impl Into<String>, chain_id: u64, deployer: Address) -> Self {
        Self {
            network: network.into(),
            chain_id,
            deployer,
            started_at: chrono::Utc::now().to_rfc3339(),
            contracts: Vec::new(),
        }
    }

    pub fn contract(&self, role: ContractRole) -> Option<&DeployedContract> {
        self.contracts.iter().find(|contract| contract.role == role)
    }

    pub fn to_table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_header(vec!["Role", "Contract", "Address", "Status", "Transaction"]);

        for contract in &self.contracts {
            let status = match contract.block_number {
                Some(block) => format!("confirmed (block {block})"),
                None => "submitted".to_string(),
            };
            table.add_row(vec![
                contract.role.to_string(),
                contract.contract.clone(),
                contract.address.to_string(),
                status,
                contract.tx_hash.to_string(),
            ]);
        }

        table
    }

    /// Write the report as pretty JSON.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize deployment report")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        tracing::info!(path = %path.display(), "Deployment report saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_core::primitives::address;
    use tempdir::TempDir;

    fn report() -> DeploymentReport {
        let mut report = DeploymentReport::new("hardhat", 1337, Address::ZERO);
        report.contracts.push(DeployedContract {
            role: ContractRole::Nft,
            contract: "Yieldly".to_string(),
            address: address!("0x5FbDB2315678afecb367f032d93F642f64180aa3"),
            tx_hash: B256::repeat_byte(1),
            block_number: Some(1),
        });
        report.contracts.push(DeployedContract::unconfirmed(
            ContractRole::WrappedToken,
            PendingContract {
                contract: "WMATIC".to_string(),
                address: address!("0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512"),
                tx_hash: B256::repeat_byte(2),
            },
        ));
        report
    }

    #[test]
    fn test_table_lists_contracts() {
        let rendered = report().to_table().to_string();
        assert!(rendered.contains("NFT"));
        assert!(rendered.contains("0x5FbDB2315678afecb367f032d93F642f64180aa3"));
        assert!(rendered.contains("confirmed (block 1)"));
        assert!(rendered.contains("submitted"));
    }

    #[test]
    fn test_lookup_by_role() {
        let report = report();
        assert!(report.contract(ContractRole::Nft).unwrap().is_confirmed());
        assert!(!report.contract(ContractRole::WrappedToken).unwrap().is_confirmed());
        assert!(report.contract(ContractRole::Marketplace).is_none());
    }

    #[test]
    fn test_save_report() {
        let dir = TempDir::new("report").unwrap();
        let path = dir.path().join("deployment.json");
        report().save_to_file(&path).unwrap();

        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["chain_id"], 1337);
        assert_eq!(saved["contracts"][0]["role"], "nft");
        assert_eq!(saved["contracts"][1]["block_number"], serde_json::Value::Null);
    }
}
