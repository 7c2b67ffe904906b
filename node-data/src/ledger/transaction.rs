// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) LUMEN NETWORK. All rights reserved.

use ed25519_dalek::{Verifier, VerifyingKey};
use sha2::{Digest, Sha256};

use crate::keys::{AccountId, DecoratedSignature};
use crate::Serializable;

use super::{Asset, Hash, Price};

/// Envelope type tag mixed into every transaction hash.
pub const ENVELOPE_TYPE_TX: u32 = 2;

/// Upper bound on the number of intermediate assets in a path payment.
pub const MAX_PATH_LENGTH: usize = 5;

#[derive(Debug, Default, Eq, PartialEq, Clone)]
pub enum Memo {
    #[default]
    None,
    Text(String),
    Hash(Hash),
}

/// Sends `dest_amount` of `dest_asset` to `destination`, sourcing it by
/// converting `send_asset` through the order book along `path`.
#[derive(Debug, Eq, PartialEq, Clone)]
pub struct PathPaymentOp {
    pub send_asset: Asset,
    /// Most the sender is willing to part with.
    pub send_max: i64,
    pub destination: AccountId,
    pub dest_asset: Asset,
    pub dest_amount: i64,
    /// Intermediate assets, source side first.
    pub path: Vec<Asset>,
}

/// Creates, updates or deletes an offer on the book.
///
/// `offer_id` zero creates; non-zero addresses an existing offer, and
/// `amount` zero deletes it.
#[derive(Debug, Eq, PartialEq, Clone)]
pub struct ManageOfferOp {
    pub selling: Asset,
    pub buying: Asset,
    pub amount: i64,
    pub price: Price,
    pub offer_id: u64,
}

/// Asset code of a trustline extended to the operation source; the
/// issuer is implicitly the source account.
#[derive(Debug, Eq, PartialEq, Clone)]
pub enum AllowTrustAsset {
    Code4([u8; 4]),
    Code12([u8; 12]),
}

impl AllowTrustAsset {
    /// Expands the code into a full asset issued by `issuer`.
    pub fn with_issuer(&self, issuer: AccountId) -> Asset {
        match self {
            AllowTrustAsset::Code4(code) => Asset::AlphaNum4 {
                code: *code,
                issuer,
            },
            AllowTrustAsset::Code12(code) => Asset::AlphaNum12 {
                code: *code,
                issuer,
            },
        }
    }
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub struct AllowTrustOp {
    pub trustor: AccountId,
    pub asset: AllowTrustAsset,
    pub authorize: bool,
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub enum OperationBody {
    PathPayment(PathPaymentOp),
    ManageOffer(ManageOfferOp),
    AllowTrust(AllowTrustOp),
}

impl OperationBody {
    pub fn type_tag(&self) -> u32 {
        match self {
            OperationBody::PathPayment(_) => 0,
            OperationBody::ManageOffer(_) => 1,
            OperationBody::AllowTrust(_) => 2,
        }
    }
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub struct Operation {
    /// Acting account; defaults to the transaction source.
    pub source: Option<AccountId>,
    pub body: OperationBody,
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub struct Transaction {
    pub source: AccountId,
    pub fee: u32,
    pub seq_num: u64,
    pub memo: Memo,
    pub operations: Vec<Operation>,
}

impl Transaction {
    /// Content hash: the digest of (network id, envelope tag, body).
    ///
    /// Doubles as the payload signed by the source account.
    pub fn hash(&self, network_id: &Hash) -> Hash {
        let mut hasher = Sha256::new();
        hasher.update(network_id);
        hasher.update(ENVELOPE_TYPE_TX.to_be_bytes());
        hasher.update(self.to_bytes());
        hasher.finalize().into()
    }
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub struct TransactionEnvelope {
    pub tx: Transaction,
    pub signatures: Vec<DecoratedSignature>,
}

/// Wire form of a candidate transaction set, anchored to the ledger it
/// extends. Decoding does not re-sort; the canonical order is applied
/// when the content hash is taken.
#[derive(Debug, Eq, PartialEq, Clone)]
pub struct TransactionSet {
    pub previous_ledger_hash: Hash,
    pub txs: Vec<TransactionEnvelope>,
}

impl TransactionEnvelope {
    /// True when some attached signature with a matching hint verifies
    /// against the source account's key.
    pub fn verify_source_signature(&self, network_id: &Hash) -> bool {
        let payload = self.tx.hash(network_id);
        let Ok(key) = VerifyingKey::from_bytes(self.tx.source.as_bytes())
        else {
            return false;
        };

        let hint = self.tx.source.hint();
        self.signatures
            .iter()
            .filter(|ds| ds.hint == hint)
            .any(|ds| {
                let sig =
                    ed25519_dalek::Signature::from_bytes(ds.signature.inner());
                key.verify(&payload, &sig).is_ok()
            })
    }
}

#[cfg(any(feature = "faker", test))]
pub mod faker {
    use ed25519_dalek::SigningKey;

    use super::*;
    use crate::keys::faker::sign;

    pub fn gen_path_payment(
        destination: AccountId,
        send_asset: Asset,
        send_max: i64,
        dest_asset: Asset,
        dest_amount: i64,
    ) -> Operation {
        Operation {
            source: None,
            body: OperationBody::PathPayment(PathPaymentOp {
                send_asset,
                send_max,
                destination,
                dest_asset,
                dest_amount,
                path: vec![],
            }),
        }
    }

    pub fn gen_envelope(
        source: AccountId,
        seq_num: u64,
        fee: u32,
        operations: Vec<Operation>,
    ) -> TransactionEnvelope {
        TransactionEnvelope {
            tx: Transaction {
                source,
                fee,
                seq_num,
                memo: Memo::None,
                operations,
            },
            signatures: vec![],
        }
    }

    /// Builds an envelope signed by `sk` over the given network.
    pub fn signed_envelope(
        sk: &SigningKey,
        network_id: &Hash,
        seq_num: u64,
        fee: u32,
        operations: Vec<Operation>,
    ) -> TransactionEnvelope {
        let source = AccountId::new(sk.verifying_key().to_bytes());
        let mut env = gen_envelope(source, seq_num, fee, operations);
        let payload = env.tx.hash(network_id);
        env.signatures.push(sign(sk, &payload));
        env
    }
}
