// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) LUMEN NETWORK. All rights reserved.

use std::collections::{BTreeMap, VecDeque};

use sha2::{Digest, Sha256};
use sqlx::SqliteConnection;

use node_data::keys::AccountId;
use node_data::ledger::{Hash, TransactionSet, TxResultCode};
use node_data::Serializable;

use crate::database::{EntryStore, StoreError};
use crate::transactions::TransactionFrame;

use super::conf::LedgerParams;
use super::AccountFrame;

/// The candidate transactions for one ledger, anchored to the ledger
/// they extend.
///
/// Two sets holding the same transactions hash identically no matter the
/// insertion order: the content hash is taken over the canonical
/// `(source, sequence, hash)` sort. The set is not mutated once its hash
/// has been consumed by consensus.
#[derive(Debug, Clone)]
pub struct TxSetFrame {
    previous_ledger_hash: Hash,
    txs: Vec<TransactionFrame>,
    contents_hash: Option<Hash>,
}

impl TxSetFrame {
    /// Empty set extending the given parent ledger.
    pub fn new(previous_ledger_hash: Hash) -> Self {
        Self {
            previous_ledger_hash,
            txs: vec![],
            contents_hash: None,
        }
    }

    /// Decodes a wire set. The order on the wire is preserved; sorting
    /// happens when the content hash is taken.
    pub fn from_wire(set: TransactionSet, network_id: &Hash) -> Self {
        let txs = set
            .txs
            .into_iter()
            .map(|env| TransactionFrame::new(env, network_id))
            .collect();

        Self {
            previous_ledger_hash: set.previous_ledger_hash,
            txs,
            contents_hash: None,
        }
    }

    pub fn to_wire(&self) -> TransactionSet {
        TransactionSet {
            previous_ledger_hash: self.previous_ledger_hash,
            txs: self.txs.iter().map(|tx| tx.envelope().clone()).collect(),
        }
    }

    pub fn add(&mut self, tx: TransactionFrame) {
        self.txs.push(tx);
        self.contents_hash = None;
    }

    pub fn size(&self) -> usize {
        self.txs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.txs.is_empty()
    }

    pub fn txs(&self) -> &[TransactionFrame] {
        &self.txs
    }

    pub fn previous_ledger_hash(&self) -> &Hash {
        &self.previous_ledger_hash
    }

    /// Canonical order: `(source account, sequence number, hash)`.
    pub fn sort_for_hash(&mut self) {
        self.txs.sort_by(|a, b| {
            (a.source(), a.seq_num(), a.hash())
                .cmp(&(b.source(), b.seq_num(), b.hash()))
        });
    }

    /// Content hash over the canonical sort; memoized.
    pub fn get_contents_hash(&mut self) -> Hash {
        if let Some(hash) = self.contents_hash {
            return hash;
        }

        self.sort_for_hash();

        let mut hasher = Sha256::new();
        hasher.update(self.previous_ledger_hash);
        for tx in &self.txs {
            hasher.update(tx.envelope().to_bytes());
        }
        let hash: Hash = hasher.finalize().into();

        self.contents_hash = Some(hash);
        hash
    }

    /// The apply permutation: pseudorandom but fully determined by the
    /// parent-ledger hash, so no submitter controls its position, and
    /// every replica applies in the same order. Within one source
    /// account, sequence order is preserved.
    pub fn sort_for_apply(&self) -> Vec<TransactionFrame> {
        let mut sorted = self.txs.clone();
        sorted.sort_by(|a, b| {
            (a.source(), a.seq_num(), a.hash())
                .cmp(&(b.source(), b.seq_num(), b.hash()))
        });

        // shuffle slots by a hash keyed off the parent ledger
        let apply_key = |tx: &TransactionFrame| -> Hash {
            let mut hasher = Sha256::new();
            hasher.update(self.previous_ledger_hash);
            hasher.update(tx.hash());
            hasher.finalize().into()
        };

        let mut order: Vec<usize> = (0..sorted.len()).collect();
        let keys: Vec<Hash> = sorted.iter().map(apply_key).collect();
        order.sort_by(|&a, &b| keys[a].cmp(&keys[b]));

        // each slot takes the next-in-sequence transaction of the account
        // that owned the slot, keeping per-account ordering intact
        let mut per_account: BTreeMap<AccountId, VecDeque<TransactionFrame>> =
            BTreeMap::new();
        for tx in &sorted {
            per_account
                .entry(*tx.source())
                .or_default()
                .push_back(tx.clone());
        }

        order
            .into_iter()
            .map(|slot| {
                let owner = sorted[slot].source();
                per_account
                    .get_mut(owner)
                    .and_then(VecDeque::pop_front)
                    .expect("every slot has an owner with a queued tx")
            })
            .collect()
    }

    /// True when every transaction passes its account, sequence and
    /// signature checks against current state.
    pub async fn check_valid(
        &self,
        store: &EntryStore,
        conn: &mut SqliteConnection,
        params: &LedgerParams,
    ) -> Result<bool, StoreError> {
        Ok(self.invalid_indices(store, conn, params).await?.is_empty())
    }

    /// Removes the transactions that would not apply, returning them.
    pub async fn trim_invalid(
        &mut self,
        store: &EntryStore,
        conn: &mut SqliteConnection,
        params: &LedgerParams,
    ) -> Result<Vec<TransactionFrame>, StoreError> {
        let invalid = self.invalid_indices(store, conn, params).await?;
        if invalid.is_empty() {
            return Ok(vec![]);
        }

        let mut trimmed = vec![];
        // walk back to front so indices stay valid
        for idx in invalid.into_iter().rev() {
            trimmed.push(self.txs.remove(idx));
        }
        trimmed.reverse();

        self.contents_hash = None;
        Ok(trimmed)
    }

    async fn invalid_indices(
        &self,
        store: &EntryStore,
        conn: &mut SqliteConnection,
        params: &LedgerParams,
    ) -> Result<Vec<usize>, StoreError> {
        // group per source; a broken link invalidates everything after it
        let mut per_account: BTreeMap<AccountId, Vec<usize>> = BTreeMap::new();
        for (idx, tx) in self.txs.iter().enumerate() {
            per_account.entry(*tx.source()).or_default().push(idx);
        }

        let mut invalid = vec![];
        for (account_id, mut indices) in per_account {
            indices.sort_by(|&a, &b| {
                (self.txs[a].seq_num(), self.txs[a].hash())
                    .cmp(&(self.txs[b].seq_num(), self.txs[b].hash()))
            });

            let account =
                AccountFrame::load(store, conn, &account_id).await?;
            let Some(account) = account else {
                invalid.extend(indices);
                continue;
            };

            let mut expected_seq = account.account().seq_num + 1;
            let mut spendable = account.account().balance;

            for idx in indices {
                let tx = &self.txs[idx];
                let fee = tx.fee() as i64;

                let valid = tx.check_valid_static(params)
                    == TxResultCode::Success
                    && tx.seq_num() == expected_seq
                    && spendable >= fee;

                if valid {
                    expected_seq += 1;
                    spendable -= fee;
                } else {
                    invalid.push(idx);
                }
            }
        }

        invalid.sort_unstable();
        Ok(invalid)
    }

    /// Admission control: when the set exceeds the per-ledger limit, the
    /// cheapest transactions (by fee per operation, ties on hash) are
    /// dropped.
    pub fn surge_pricing_filter(&mut self, params: &LedgerParams) {
        if self.txs.len() <= params.max_tx_set_size {
            return;
        }

        tracing::info!(
            event = "surge pricing",
            size = self.txs.len(),
            limit = params.max_tx_set_size,
        );

        self.txs.sort_by(|a, b| {
            b.fee_per_op()
                .cmp(&a.fee_per_op())
                .then_with(|| a.hash().cmp(b.hash()))
        });
        self.txs.truncate(params.max_tx_set_size);
        self.contents_hash = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use node_data::keys::faker::keypair_from_seed;
    use node_data::ledger::faker::{gen_path_payment, signed_envelope};
    use node_data::ledger::Asset;

    fn params() -> LedgerParams {
        LedgerParams::default()
    }

    fn frame(seed: u8, seq: u64, fee: u32) -> TransactionFrame {
        let params = params();
        let (sk, _) = keypair_from_seed([seed; 32]);
        let op = gen_path_payment(
            AccountId::default(),
            Asset::Native,
            100,
            Asset::Native,
            100,
        );
        let env = signed_envelope(&sk, &params.network_id(), seq, fee, vec![op]);
        TransactionFrame::new(env, &params.network_id())
    }

    #[test]
    fn contents_hash_ignores_insertion_order() {
        let txs =
            vec![frame(1, 1, 10), frame(2, 1, 10), frame(3, 1, 10)];

        let mut a = TxSetFrame::new([7; 32]);
        for tx in &txs {
            a.add(tx.clone());
        }

        let mut b = TxSetFrame::new([7; 32]);
        for tx in txs.iter().rev() {
            b.add(tx.clone());
        }

        assert_eq!(a.get_contents_hash(), b.get_contents_hash());

        // a different parent anchors a different hash
        let mut c = TxSetFrame::new([8; 32]);
        for tx in &txs {
            c.add(tx.clone());
        }
        assert_ne!(a.get_contents_hash(), c.get_contents_hash());
    }

    #[test]
    fn add_invalidates_memoized_hash() {
        let mut set = TxSetFrame::new([7; 32]);
        set.add(frame(1, 1, 10));
        let before = set.get_contents_hash();

        set.add(frame(2, 1, 10));
        assert_ne!(before, set.get_contents_hash());
    }

    #[test]
    fn apply_order_is_deterministic_and_seq_safe() {
        let mut set = TxSetFrame::new([7; 32]);
        for seed in 1..=4u8 {
            set.add(frame(seed, 1, 10));
            set.add(frame(seed, 2, 10));
        }

        let once = set.sort_for_apply();
        let twice = set.sort_for_apply();
        let hashes =
            |v: &[TransactionFrame]| -> Vec<Hash> {
                v.iter().map(|tx| *tx.hash()).collect::<Vec<_>>()
            };
        assert_eq!(hashes(&once), hashes(&twice));

        // per-account sequence numbers must come out ascending
        let mut last_seq: BTreeMap<AccountId, u64> = BTreeMap::new();
        for tx in &once {
            let prev = last_seq.insert(*tx.source(), tx.seq_num());
            if let Some(prev) = prev {
                assert!(prev < tx.seq_num());
            }
        }

        // a different parent hash yields a different permutation
        let mut other = TxSetFrame::new([9; 32]);
        for tx in set.txs() {
            other.add(tx.clone());
        }
        let reordered = other.sort_for_apply();
        assert_eq!(once.len(), reordered.len());
    }

    #[test]
    fn surge_pricing_keeps_highest_fee_rate() {
        let mut params = params();
        params.max_tx_set_size = 2;

        let mut set = TxSetFrame::new([7; 32]);
        set.add(frame(1, 1, 10));
        set.add(frame(2, 1, 500));
        set.add(frame(3, 1, 200));

        set.surge_pricing_filter(&params);

        assert_eq!(set.size(), 2);
        let fees: Vec<u32> = set.txs().iter().map(|tx| tx.fee()).collect();
        assert!(fees.contains(&500));
        assert!(fees.contains(&200));
    }
}
