//! Runs the `yieldly` binary against temporary working directories.

use std::{
    path::Path,
    process::{Command, Output},
};

use tempdir::TempDir;
use yieldly_deploy::test_util::{DEV_ACCOUNT, FakeChain, FakeNode, write_artifacts};

const SECRETS: &str = r#"{
    "owner": "test test test test test test test test test test test junk",
    "ownerPub": "0x70997970C51812dc3A010C7d01b50e0d17dc79C8"
}"#;

fn yieldly(dir: &TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_yieldly"))
        .args(args)
        .current_dir(dir.path())
        .env_clear()
        .output()
        .expect("failed to run yieldly")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn test_missing_secrets_fails_before_deploying() {
    let dir = TempDir::new("yieldly-cli").unwrap();
    let output = yieldly(&dir, &[]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("secrets"), "{}", stderr(&output));
}

#[test]
fn test_list_networks() {
    let dir = TempDir::new("yieldly-cli").unwrap();
    std::fs::write(dir.path().join("secrets.json"), SECRETS).unwrap();
    std::fs::write(
        dir.path().join("Yieldly.toml"),
        r#"
        [networks.amoy]
        url = "https://rpc-amoy.polygon.technology"
        chainId = 80002
        "#,
    )
    .unwrap();

    let output = yieldly(&dir, &["--list-networks"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    for network in ["amoy", "hardhat", "mainnet", "testnet"] {
        assert!(stdout.contains(network), "missing {network}: {stdout}");
    }
    assert!(stdout.contains("80002"));
    assert!(stdout.contains("local node"));
}

#[test]
fn test_unknown_network() {
    let dir = TempDir::new("yieldly-cli").unwrap();
    std::fs::write(dir.path().join("secrets.json"), SECRETS).unwrap();

    let output = yieldly(&dir, &["--network", "goerli"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Unknown network `goerli`"));
}

#[test]
fn test_unreachable_node() {
    let dir = TempDir::new("yieldly-cli").unwrap();
    std::fs::write(dir.path().join("secrets.json"), SECRETS).unwrap();
    std::fs::create_dir(dir.path().join("artifacts")).unwrap();
    std::fs::write(
        dir.path().join("Yieldly.toml"),
        r#"
        default_network = "offline"

        [networks.offline]
        url = "http://127.0.0.1:1"
        chainId = 1337
        timeout = 1000
        accounts = { mnemonic = "test test test test test test test test test test test junk" }
        "#,
    )
    .unwrap();

    let output = yieldly(&dir, &[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Failed to reach RPC endpoint"));
}

#[test]
fn test_save_config() {
    let dir = TempDir::new("yieldly-cli").unwrap();
    std::fs::write(dir.path().join("secrets.json"), SECRETS).unwrap();
    std::fs::write(
        dir.path().join("Yieldly.toml"),
        r#"
        [networks.amoy]
        url = "https://rpc-amoy.polygon.technology"
        chainId = 80002
        gasPrice = 30000000000
        "#,
    )
    .unwrap();

    let output = yieldly(
        &dir,
        &["--save-config", "saved.toml", "--wait-wrapped-token", "--list-networks"],
    );
    assert!(output.status.success(), "{}", stderr(&output));

    let saved = std::fs::read_to_string(dir.path().join("saved.toml")).unwrap();
    assert!(saved.contains("30000000000"));
    assert!(saved.contains("wrapped_token_confirmation = \"wait\""));
}

/// Working directory deploying to `node` through the `fake` profile.
fn deployment_dir(node: &FakeNode) -> TempDir {
    let dir = TempDir::new("yieldly-cli").unwrap();
    std::fs::write(dir.path().join("secrets.json"), SECRETS).unwrap();
    write_artifacts(&dir.path().join("artifacts")).unwrap();
    std::fs::write(
        dir.path().join("Yieldly.toml"),
        format!(
            r#"
            default_network = "fake"
            confirmation_poll_interval_ms = 10
            confirmation_timeout_secs = 5

            [networks.fake]
            url = "{}"
            chainId = 1337
            gasPrice = 20000000000
            accounts = {{ mnemonic = "test test test test test test test test test test test junk" }}
            "#,
            node.url
        ),
    )
    .unwrap();
    dir
}

/// Runs the binary without blocking the runtime serving the fake node.
async fn yieldly_async(dir: &Path, args: &[&str]) -> Output {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_yieldly"))
        .args(args)
        .current_dir(dir)
        .env_clear()
        .output()
        .await
        .expect("failed to run yieldly")
}

fn line_of(stdout: &str, needle: &str) -> Option<usize> {
    stdout.lines().position(|line| line.contains(needle))
}

#[tokio::test(flavor = "multi_thread")]
async fn test_successful_deployment() {
    let node = FakeNode::spawn(FakeChain::new(1337)).await.unwrap();
    let dir = deployment_dir(&node);

    let output = yieldly_async(dir.path(), &["--out", "deployment.json"]).await;
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let nft = line_of(&stdout, "NFT deployed to:").expect("NFT line");
    let wrapped = line_of(&stdout, "WMatic deployed to:").expect("WMatic line");
    let marketplace = line_of(&stdout, "Marketplace deployed to:").expect("Marketplace line");
    assert!(nft < wrapped && wrapped < marketplace, "{stdout}");
    assert!(stdout.contains(&DEV_ACCOUNT.create(2).to_string()));

    let report = std::fs::read_to_string(dir.path().join("deployment.json")).unwrap();
    let report: serde_json::Value = serde_json::from_str(&report).unwrap();
    assert_eq!(report["contracts"].as_array().unwrap().len(), 3);
    assert_eq!(node.chain().raw_txs.len(), 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_reverted_marketplace_exits_with_error() {
    let node = FakeNode::spawn(FakeChain {
        revert_nonce: Some(2),
        ..FakeChain::new(1337)
    })
    .await
    .unwrap();
    let dir = deployment_dir(&node);

    let output = yieldly_async(dir.path(), &[]).await;
    assert_eq!(output.status.code(), Some(1));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let nft = line_of(&stdout, "NFT deployed to:").expect("NFT line");
    let wrapped = line_of(&stdout, "WMatic deployed to:").expect("WMatic line");
    assert!(nft < wrapped);
    assert!(line_of(&stdout, "Marketplace deployed to:").is_none(), "{stdout}");
    assert!(stderr(&output).contains("reverted"));
}
