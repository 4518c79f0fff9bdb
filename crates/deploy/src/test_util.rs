//! In-process JSON-RPC node and artifact fixtures for tests.
//!
//! The fake node mines every transaction instantly, derives contract addresses from the
//! development account nonce and can be told to revert a given nonce or to delay receipts.

use std::{
    collections::{HashMap, HashSet},
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};

use alloy_core::primitives::{Address, B256, Bytes, address, keccak256};
use anyhow::{Context, Result};
use axum::{Json, Router, extract::State, routing::post};
use serde_json::{Value, json};
use url::Url;

/// Account 0 of the development mnemonic, the only sender the fake node knows.
pub const DEV_ACCOUNT: Address = address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

#[derive(Debug, Default)]
pub struct FakeChain {
    pub chain_id: u64,
    pub nonce: u64,
    pub block: u64,
    /// Transactions with this nonce revert.
    pub revert_nonce: Option<u64>,
    /// Receipt polls answered with `null` before receipts become visible.
    pub hidden_receipt_polls: u32,
    /// Receipt polls answered with a receipt whose `blockNumber` is `null`.
    pub pending_receipt_polls: u32,
    pub receipts: HashMap<B256, Value>,
    pub code: HashSet<Address>,
    /// Init code of every `eth_estimateGas` call.
    pub estimate_data: Vec<Bytes>,
    pub raw_txs: Vec<Bytes>,
    pub gas_price_calls: u32,
}

impl FakeChain {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            ..Default::default()
        }
    }

    fn handle(&mut self, method: &str, params: &[Value]) -> Result<Value> {
        let param = |index: usize| params.get(index).cloned().unwrap_or(Value::Null);

        match method {
            "eth_chainId" => Ok(json!(format!("0x{:x}", self.chain_id))),
            "eth_gasPrice" => {
                self.gas_price_calls += 1;
                Ok(json!("0x3b9aca00"))
            }
            "eth_getTransactionCount" => Ok(json!(format!("0x{:x}", self.nonce))),
            "eth_estimateGas" => {
                let data: Bytes = serde_json::from_value(param(0)["data"].clone())?;
                self.estimate_data.push(data);
                Ok(json!("0x186a0"))
            }
            "eth_sendRawTransaction" => {
                let raw: Bytes = serde_json::from_value(param(0))?;
                Ok(json!(self.mine(raw)))
            }
            "eth_getTransactionReceipt" => {
                if self.hidden_receipt_polls > 0 {
                    self.hidden_receipt_polls -= 1;
                    return Ok(Value::Null);
                }
                let hash: B256 = serde_json::from_value(param(0))?;
                let Some(mut receipt) = self.receipts.get(&hash).cloned() else {
                    return Ok(Value::Null);
                };
                if self.pending_receipt_polls > 0 {
                    self.pending_receipt_polls -= 1;
                    receipt["blockNumber"] = Value::Null;
                }
                Ok(receipt)
            }
            "eth_getCode" => {
                let address: Address = serde_json::from_value(param(0))?;
                Ok(json!(if self.code.contains(&address) { "0x6080" } else { "0x" }))
            }
            other => anyhow::bail!("method {other} not supported"),
        }
    }

    fn mine(&mut self, raw: Bytes) -> B256 {
        let hash = keccak256(&raw);
        let address = DEV_ACCOUNT.create(self.nonce);
        let reverted = self.revert_nonce == Some(self.nonce);

        self.block += 1;
        if !reverted {
            self.code.insert(address);
        }
        self.receipts.insert(
            hash,
            json!({
                "transactionHash": hash,
                "blockNumber": format!("0x{:x}", self.block),
                "contractAddress": address,
                "status": if reverted { "0x0" } else { "0x1" },
            }),
        );
        self.raw_txs.push(raw);
        self.nonce += 1;
        hash
    }
}

type SharedChain = Arc<Mutex<FakeChain>>;

async fn handle_rpc(State(chain): State<SharedChain>, Json(request): Json<Value>) -> Json<Value> {
    let method = request["method"].as_str().unwrap_or_default();
    let params = request["params"].as_array().cloned().unwrap_or_default();
    let result = lock(&chain).handle(method, &params);

    Json(match result {
        Ok(result) => json!({"jsonrpc": "2.0", "id": request["id"], "result": result}),
        Err(err) => json!({
            "jsonrpc": "2.0",
            "id": request["id"],
            "error": {"code": -32000, "message": err.to_string()}
        }),
    })
}

fn lock(chain: &SharedChain) -> MutexGuard<'_, FakeChain> {
    chain.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A [`FakeChain`] served over HTTP on a random local port.
pub struct FakeNode {
    pub url: Url,
    chain: SharedChain,
}

impl FakeNode {
    /// Serve `chain` on the current tokio runtime.
    pub async fn spawn(chain: FakeChain) -> Result<Self> {
        let chain = Arc::new(Mutex::new(chain));
        let app = Router::new()
            .route("/", post(handle_rpc))
            .with_state(chain.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .context("Failed to bind fake node")?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app).await {
                tracing::error!(error = %err, "Fake node stopped");
            }
        });

        Ok(Self {
            url: Url::parse(&format!("http://{addr}/"))?,
            chain,
        })
    }

    pub fn chain(&self) -> MutexGuard<'_, FakeChain> {
        lock(&self.chain)
    }
}

/// Write Hardhat artifacts for `Yieldly`, `WMATIC` and `YieldlyMarketplace` under `root`.
pub fn write_artifacts(root: &Path) -> Result<()> {
    let marketplace_abi = json!([{
        "type": "constructor",
        "stateMutability": "nonpayable",
        "inputs": [
            {"name": "_wmatic", "type": "address", "internalType": "address"},
            {"name": "_owner", "type": "address", "internalType": "address"}
        ]
    }]);
    let artifacts = [
        ("Yieldly", json!([])),
        ("WMATIC", json!([])),
        ("YieldlyMarketplace", marketplace_abi),
    ];

    for (name, abi) in artifacts {
        let dir = root.join("contracts").join(format!("{name}.sol"));
        std::fs::create_dir_all(&dir)?;
        let artifact = json!({
            "_format": "hh-sol-artifact-1",
            "contractName": name,
            "sourceName": format!("contracts/{name}.sol"),
            "abi": abi,
            "bytecode": "0x6080604052",
            "deployedBytecode": "0x6080",
            "linkReferences": {},
            "deployedLinkReferences": {}
        });
        std::fs::write(dir.join(format!("{name}.json")), artifact.to_string())?;
    }

    Ok(())
}
