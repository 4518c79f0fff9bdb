//! Shared RPC utilities for interacting with Ethereum JSON-RPC endpoints.

use std::time::Duration;

use alloy_core::primitives::{Address, B256, Bytes, U64, U128};
use anyhow::Context;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;

/// Default timeout for RPC requests, used when the network profile does not set one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(20_000);

/// Create an HTTP client configured for JSON-RPC requests.
pub fn create_client(timeout: Duration) -> Result<reqwest::Client, anyhow::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to create HTTP client")
}

/// Make a JSON-RPC call and deserialize the result.
///
/// # Arguments
/// * `client` - The HTTP client to use
/// * `url` - The RPC endpoint URL
/// * `method` - The RPC method name
/// * `params` - The method parameters
///
/// # Returns
/// The deserialized result, or an error if the request failed or returned an error response.
pub async fn json_rpc_call<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    method: &str,
    params: Vec<Value>,
) -> Result<T, anyhow::Error> {
    let response = client
        .post(url)
        .json(&serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        }))
        .send()
        .await
        .with_context(|| format!("Failed to send {} request", method))?;

    let result: Value = response
        .json()
        .await
        .with_context(|| format!("Failed to parse {} response", method))?;

    parse_response(method, result)
}

/// Extract the `result` member of a JSON-RPC response, turning an `error` member into an error.
fn parse_response<T: DeserializeOwned>(method: &str, response: Value) -> Result<T, anyhow::Error> {
    if let Some(error) = response.get("error") {
        anyhow::bail!(
            "RPC error in {}: {}",
            method,
            error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown")
        );
    }

    let result_value = response
        .get("result")
        .context("No result in response")?
        .clone();

    serde_json::from_value(result_value)
        .with_context(|| format!("Failed to deserialize {} result", method))
}

/// Thin typed wrapper over the handful of `eth_*` methods a deployment needs.
#[derive(Debug, Clone)]
pub struct EthRpc {
    client: reqwest::Client,
    url: String,
}

/// Subset of a transaction receipt relevant to contract creation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    pub block_number: Option<U64>,
    pub contract_address: Option<Address>,
    pub status: Option<U64>,
}

impl TransactionReceipt {
    /// Whether the transaction executed successfully.
    ///
    /// Receipts from pre-Byzantium chains have no status field and are treated as successful.
    pub fn succeeded(&self) -> bool {
        self.status.is_none_or(|status| status == U64::from(1))
    }
}

impl EthRpc {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> anyhow::Result<T> {
        json_rpc_call(&self.client, &self.url, method, params).await
    }

    pub async fn chain_id(&self) -> anyhow::Result<u64> {
        let id: U64 = self.call("eth_chainId", vec![]).await?;
        Ok(id.to())
    }

    pub async fn gas_price(&self) -> anyhow::Result<u128> {
        let price: U128 = self.call("eth_gasPrice", vec![]).await?;
        Ok(price.to())
    }

    pub async fn pending_nonce(&self, address: Address) -> anyhow::Result<u64> {
        let nonce: U64 = self
            .call(
                "eth_getTransactionCount",
                vec![serde_json::json!(address), serde_json::json!("pending")],
            )
            .await?;
        Ok(nonce.to())
    }

    pub async fn estimate_create_gas(&self, from: Address, code: &Bytes) -> anyhow::Result<u64> {
        let gas: U64 = self
            .call(
                "eth_estimateGas",
                vec![serde_json::json!({ "from": from, "data": code })],
            )
            .await?;
        Ok(gas.to())
    }

    pub async fn send_raw_transaction(&self, raw: &Bytes) -> anyhow::Result<B256> {
        self.call("eth_sendRawTransaction", vec![serde_json::json!(raw)])
            .await
    }

    pub async fn transaction_receipt(
        &self,
        tx_hash: B256,
    ) -> anyhow::Result<Option<TransactionReceipt>> {
        self.call("eth_getTransactionReceipt", vec![serde_json::json!(tx_hash)])
            .await
    }

    pub async fn code_at(&self, address: Address) -> anyhow::Result<Bytes> {
        self.call(
            "eth_getCode",
            vec![serde_json::json!(address), serde_json::json!("latest")],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_response_result() {
        let response = json!({"jsonrpc": "2.0", "id": 1, "result": "0x539"});
        let id: U64 = parse_response("eth_chainId", response).unwrap();
        assert_eq!(id.to::<u64>(), 1337);
    }

    #[test]
    fn test_parse_response_error() {
        let response = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32000, "message": "execution reverted"}
        });
        let err = parse_response::<U64>("eth_estimateGas", response).unwrap_err();
        assert!(err.to_string().contains("execution reverted"));
        assert!(err.to_string().contains("eth_estimateGas"));
    }

    #[test]
    fn test_parse_response_null_receipt() {
        let response = json!({"jsonrpc": "2.0", "id": 1, "result": null});
        let receipt: Option<TransactionReceipt> =
            parse_response("eth_getTransactionReceipt", response).unwrap();
        assert!(receipt.is_none());
    }

    #[test]
    fn test_receipt_status() {
        let receipt: TransactionReceipt = serde_json::from_value(json!({
            "transactionHash": "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b",
            "blockNumber": "0x10",
            "contractAddress": "0x5fbdb2315678afecb367f032d93f642f64180aa3",
            "status": "0x0"
        }))
        .unwrap();
        assert!(!receipt.succeeded());
        assert_eq!(receipt.block_number.map(|n| n.to::<u64>()), Some(16));

        let legacy: TransactionReceipt = serde_json::from_value(json!({
            "transactionHash": "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b",
            "blockNumber": "0x10",
            "contractAddress": null
        }))
        .unwrap();
        assert!(legacy.succeeded());
        assert!(legacy.contract_address.is_none());
    }
}
