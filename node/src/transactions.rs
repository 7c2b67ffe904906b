// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) LUMEN NETWORK. All rights reserved.

pub mod exchange;

mod allow_trust;
mod manage_offer;
mod path_payment;

use sqlx::{Connection, SqliteConnection};

use node_data::keys::AccountId;
use node_data::ledger::{
    Hash, Operation, OperationBody, OperationResult, Transaction,
    TransactionEnvelope, TransactionResult, TxResultCode,
};

use crate::database::{EntryStore, StoreError};
use crate::ledger::conf::LedgerParams;
use crate::ledger::{AccountFrame, LedgerDelta};

/// A transaction being carried through validation and apply.
///
/// The content hash is fixed at construction; the result envelope is
/// filled in as the transaction progresses.
#[derive(Debug, Clone)]
pub struct TransactionFrame {
    envelope: TransactionEnvelope,
    hash: Hash,
    pub result: TransactionResult,
}

impl TransactionFrame {
    pub fn new(envelope: TransactionEnvelope, network_id: &Hash) -> Self {
        let hash = envelope.tx.hash(network_id);
        Self {
            envelope,
            hash,
            result: TransactionResult::new(TxResultCode::Success),
        }
    }

    pub fn envelope(&self) -> &TransactionEnvelope {
        &self.envelope
    }

    pub fn tx(&self) -> &Transaction {
        &self.envelope.tx
    }

    pub fn hash(&self) -> &Hash {
        &self.hash
    }

    pub fn source(&self) -> &AccountId {
        &self.envelope.tx.source
    }

    pub fn seq_num(&self) -> u64 {
        self.envelope.tx.seq_num
    }

    pub fn fee(&self) -> u32 {
        self.envelope.tx.fee
    }

    /// Fee divided over the operations; the surge-pricing sort key.
    pub fn fee_per_op(&self) -> u64 {
        let ops = self.envelope.tx.operations.len().max(1) as u64;
        self.envelope.tx.fee as u64 / ops
    }

    pub fn min_fee(&self, params: &LedgerParams) -> u64 {
        params.base_fee as u64 * self.envelope.tx.operations.len().max(1) as u64
    }

    /// Checks everything that does not depend on ledger state: shape,
    /// fee floor and the source signature.
    pub fn check_valid_static(&self, params: &LedgerParams) -> TxResultCode {
        if self.envelope.tx.operations.is_empty() {
            return TxResultCode::MissingOperation;
        }
        if (self.fee() as u64) < self.min_fee(params) {
            return TxResultCode::InsufficientFee;
        }
        if !self.envelope.verify_source_signature(&params.network_id()) {
            return TxResultCode::BadAuth;
        }
        TxResultCode::Success
    }

    /// Charges the fee and advances the source sequence number.
    ///
    /// Runs before the operations and survives their failure: a skipped
    /// transaction body still pays for its slot. Returns `false` on a
    /// transaction-level fatal (the whole transaction is dropped).
    pub(crate) async fn process_fee_seq(
        &mut self,
        store: &EntryStore,
        conn: &mut SqliteConnection,
        delta: &mut LedgerDelta,
    ) -> Result<bool, StoreError> {
        let Some(mut account) =
            AccountFrame::load(store, conn, self.source()).await?
        else {
            self.result = TransactionResult::new(TxResultCode::NoAccount);
            return Ok(false);
        };

        if self.seq_num() != account.account().seq_num + 1 {
            self.result = TransactionResult::new(TxResultCode::BadSeq);
            return Ok(false);
        }

        let fee = self.fee() as i64;
        if account.account().balance < fee {
            self.result =
                TransactionResult::new(TxResultCode::InsufficientBalance);
            return Ok(false);
        }

        account.account_mut().balance -= fee;
        account.account_mut().seq_num += 1;
        account.store_change(store, conn, delta).await?;

        delta.header_mut().fee_pool += fee;
        self.result.fee_charged = fee;
        Ok(true)
    }

    /// Applies the operations inside one savepoint.
    ///
    /// Each operation stages its writes in a nested savepoint and a child
    /// journal; an expected failure rolls back just that operation and is
    /// recorded as its result code. If any operation failed, the whole
    /// group is rolled back and the transaction reports `Failed`; the
    /// fee charge in the enclosing scope is unaffected.
    pub(crate) async fn apply_operations(
        &mut self,
        store: &EntryStore,
        conn: &mut SqliteConnection,
        delta: &mut LedgerDelta,
        params: &LedgerParams,
    ) -> Result<bool, StoreError> {
        let mut ops_sp = Connection::begin(&mut *conn).await?;
        let mut ops_delta = delta.new_child();

        let source = self.envelope.tx.source;
        let operations = self.envelope.tx.operations.clone();

        let mut results = Vec::with_capacity(operations.len());
        let mut failed = false;

        for op in &operations {
            let mut op_sp = Connection::begin(&mut *ops_sp).await?;
            let mut op_delta = ops_delta.new_child();

            let result = apply_operation(
                op,
                &source,
                store,
                &mut op_sp,
                &mut op_delta,
                params,
            )
            .await?;

            if result.is_success() {
                op_sp.commit().await?;
                ops_delta.commit_child(op_delta);
            } else {
                op_sp.rollback().await?;
                store.flush_cache_keys(op_delta.touched_keys());
                failed = true;
            }
            results.push(result);
        }

        if failed {
            ops_sp.rollback().await?;
            store.flush_cache_keys(ops_delta.touched_keys());
            self.result.code = TxResultCode::Failed;
        } else {
            ops_sp.commit().await?;
            delta.commit_child(ops_delta);
            self.result.code = TxResultCode::Success;
        }
        self.result.results = results;

        Ok(!failed)
    }
}

/// Routes one parsed operation to its applier.
pub(crate) async fn apply_operation(
    op: &Operation,
    tx_source: &AccountId,
    store: &EntryStore,
    conn: &mut SqliteConnection,
    delta: &mut LedgerDelta,
    params: &LedgerParams,
) -> Result<OperationResult, StoreError> {
    let source = op.source.as_ref().unwrap_or(tx_source);

    Ok(match &op.body {
        OperationBody::PathPayment(op) => OperationResult::PathPayment(
            path_payment::apply(source, op, store, conn, delta, params)
                .await?,
        ),
        OperationBody::ManageOffer(op) => OperationResult::ManageOffer(
            manage_offer::apply(source, op, store, conn, delta, params)
                .await?,
        ),
        OperationBody::AllowTrust(op) => OperationResult::AllowTrust(
            allow_trust::apply(source, op, store, conn, delta).await?,
        ),
    })
}

/// Increments the per-operation outcome meter, mirroring the result
/// labels exposed to the metrics registry.
pub(crate) fn mark(
    op: &'static str,
    outcome: &'static str,
    detail: &'static str,
) {
    metrics::counter!(
        "operation_results",
        "op" => op,
        "outcome" => outcome,
        "detail" => detail
    )
    .increment(1);
}
