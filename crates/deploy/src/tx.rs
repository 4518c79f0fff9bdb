//! Contract creation transactions.
//!
//! Deployments are EIP-155 legacy transactions with an explicit gas price, signed locally and
//! submitted raw.

use alloy_consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy_core::primitives::{B256, Bytes, TxKind, U256};
use alloy_eips::eip2718::Encodable2718;
use alloy_signer::SignerSync;
use anyhow::Context;

/// A legacy transaction creating a contract from `code`.
pub fn creation(
    chain_id: u64,
    nonce: u64,
    gas_price: u128,
    gas_limit: u64,
    code: Bytes,
) -> TxLegacy {
    TxLegacy {
        chain_id: Some(chain_id),
        nonce,
        gas_price,
        gas_limit,
        to: TxKind::Create,
        value: U256::ZERO,
        input: code,
    }
}

/// Sign `tx` and return the raw envelope for `eth_sendRawTransaction` with its hash.
pub fn sign<S>(tx: TxLegacy, signer: &S) -> anyhow::Result<(Bytes, B256)>
where
    S: SignerSync + ?Sized,
{
    let signature = signer
        .sign_hash_sync(&tx.signature_hash())
        .context("Failed to sign transaction")?;
    let signed = tx.into_signed(signature);
    let hash = *signed.hash();
    let raw = TxEnvelope::from(signed).encoded_2718();
    Ok((raw.into(), hash))
}
