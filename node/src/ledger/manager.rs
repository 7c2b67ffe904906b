// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) LUMEN NETWORK. All rights reserved.

use std::sync::Arc;

use ed25519_dalek::SigningKey;
use sqlx::Connection;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{info, warn};

use node_data::keys::AccountId;
use node_data::ledger::{AccountEntry, Hash, LedgerHeader, TransactionResult};

use crate::database::{EntryStore, StoreError};
use crate::floodgate::Floodgate;

use super::conf::LedgerParams;
use super::{
    AccountFrame, LedgerCloseData, LedgerDelta, LedgerUpgrade,
};

pub const GENESIS_LEDGER_SEQ: u32 = 1;

/// Phase of the close protocol the manager is in.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum CloseState {
    Idle,
    Validating,
    Applying,
    Committing,
}

/// Emitted once per committed close; drives the floodgate purge and any
/// downstream archiver.
#[derive(Debug, Clone)]
pub struct LedgerCloseEvent {
    pub ledger_seq: u32,
    pub header_hash: Hash,
    pub base_fee: u32,
    pub close_time: u64,
}

/// The committed header plus the per-transaction result envelopes, in
/// apply order. The result codes are consensus output and part of the
/// external envelope.
#[derive(Debug)]
pub struct LedgerCloseOutcome {
    pub header: LedgerHeader,
    pub tx_results: Vec<(Hash, TransactionResult)>,
}

#[derive(Debug, Error)]
pub enum CloseError {
    #[error("ledger sequence {got} does not follow last closed {last}")]
    WrongSequence { got: u32, last: u32 },
    #[error("transaction set is anchored to a different previous ledger")]
    PreviousLedgerMismatch,
    #[error("transaction set hash does not match the consensus value")]
    TxSetHashMismatch,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Drives one ledger close at a time: validate the set, apply every
/// transaction inside a rollback scope, commit the root delta and the
/// new header as a single unit.
pub struct LedgerManager {
    store: EntryStore,
    params: LedgerParams,
    floodgate: Arc<Floodgate>,
    last_closed: LedgerHeader,
    state: CloseState,
    close_events: broadcast::Sender<LedgerCloseEvent>,
}

impl LedgerManager {
    /// Resumes from the stored chain tip, or creates the genesis ledger
    /// when the database is empty.
    pub async fn create_or_open(
        store: EntryStore,
        params: LedgerParams,
        floodgate: Arc<Floodgate>,
    ) -> Result<Self, CloseError> {
        let last_closed = {
            let mut conn = store.acquire().await?;
            store.load_latest_header(&mut conn).await?
        };

        let last_closed = match last_closed {
            Some(header) => {
                info!(
                    event = "resuming from stored ledger",
                    seq = header.ledger_seq,
                    hash = hex::encode(header.hash),
                );
                header
            }
            None => Self::start_new_ledger(&store, &params).await?,
        };

        let (close_events, _) = broadcast::channel(16);

        Ok(Self {
            store,
            params,
            floodgate,
            last_closed,
            state: CloseState::Idle,
            close_events,
        })
    }

    /// The account holding the native supply at genesis. Derived from
    /// the network id, so every node computes the same genesis.
    pub fn root_account_id(params: &LedgerParams) -> AccountId {
        let sk = SigningKey::from_bytes(&params.network_id());
        AccountId::new(sk.verifying_key().to_bytes())
    }

    async fn start_new_ledger(
        store: &EntryStore,
        params: &LedgerParams,
    ) -> Result<LedgerHeader, StoreError> {
        let root = Self::root_account_id(params);

        let mut genesis = LedgerHeader {
            ledger_version: 1,
            previous_ledger_hash: [0; 32],
            tx_set_hash: [0; 32],
            close_time: 0,
            total_coins: params.total_coins,
            fee_pool: 0,
            ledger_seq: GENESIS_LEDGER_SEQ,
            id_pool: 0,
            base_fee: params.base_fee,
            base_reserve: params.base_reserve,
            hash: [0; 32],
        };
        genesis.finalize_hash();

        let mut dbtx = store.begin().await?;
        let mut delta = LedgerDelta::new(genesis.clone());

        let mut root_entry = AccountEntry::new(root);
        root_entry.balance = params.total_coins;
        root_entry.seq_num = 1;

        let mut account = AccountFrame::new(root_entry);
        account.store_add(store, &mut dbtx, &mut delta).await?;
        store.store_header(&mut dbtx, &genesis).await?;
        dbtx.commit().await.map_err(StoreError::from)?;
        store.cache().clear();

        info!(
            event = "genesis ledger created",
            root = %root,
            hash = hex::encode(genesis.hash),
        );
        Ok(genesis)
    }

    pub fn last_closed(&self) -> &LedgerHeader {
        &self.last_closed
    }

    pub fn state(&self) -> CloseState {
        self.state
    }

    pub fn store(&self) -> &EntryStore {
        &self.store
    }

    pub fn params(&self) -> &LedgerParams {
        &self.params
    }

    pub fn subscribe_closes(&self) -> broadcast::Receiver<LedgerCloseEvent> {
        self.close_events.subscribe()
    }

    /// Applies one consensus value, advancing the chain by one ledger.
    pub async fn close_ledger(
        &mut self,
        data: LedgerCloseData,
    ) -> Result<LedgerCloseOutcome, CloseError> {
        let res = self.try_close(data).await;
        if res.is_err() {
            // reads taken inside the aborted transaction may have been
            // cached; nothing of that scope may survive
            self.store.cache().clear();
        }
        self.state = CloseState::Idle;
        res
    }

    async fn try_close(
        &mut self,
        data: LedgerCloseData,
    ) -> Result<LedgerCloseOutcome, CloseError> {
        self.state = CloseState::Validating;
        let LedgerCloseData {
            ledger_seq,
            mut tx_set,
            value,
        } = data;

        if ledger_seq != self.last_closed.ledger_seq + 1 {
            return Err(CloseError::WrongSequence {
                got: ledger_seq,
                last: self.last_closed.ledger_seq,
            });
        }
        if *tx_set.previous_ledger_hash() != self.last_closed.hash {
            return Err(CloseError::PreviousLedgerMismatch);
        }
        let tx_set_hash = tx_set.get_contents_hash();
        if tx_set_hash != value.tx_set_hash {
            return Err(CloseError::TxSetHashMismatch);
        }

        let mut dbtx = self.store.begin().await?;

        let trimmed = tx_set
            .trim_invalid(&self.store, &mut dbtx, &self.params)
            .await?;
        if !trimmed.is_empty() {
            warn!(
                event = "trimmed invalid transactions",
                count = trimmed.len(),
            );
        }
        tx_set.surge_pricing_filter(&self.params);

        // working header of the ledger being built
        let mut next = self.last_closed.clone();
        next.ledger_seq = ledger_seq;
        next.previous_ledger_hash = self.last_closed.hash;
        next.tx_set_hash = tx_set_hash;
        next.close_time = value.close_time;
        next.hash = [0; 32];
        let mut delta = LedgerDelta::new(next);

        self.state = CloseState::Applying;
        let mut tx_results = Vec::with_capacity(tx_set.size());
        let mut applied = 0usize;
        for mut tx_frame in tx_set.sort_for_apply() {
            let mut sp = Connection::begin(&mut *dbtx)
                .await
                .map_err(StoreError::from)?;
            let mut tx_delta = delta.new_child();

            let charged = tx_frame
                .process_fee_seq(&self.store, &mut sp, &mut tx_delta)
                .await?;
            if !charged {
                // transaction-level fatal: the whole frame is skipped
                sp.rollback().await.map_err(StoreError::from)?;
                self.store.flush_cache_keys(tx_delta.touched_keys());
                warn!(
                    event = "transaction dropped at apply",
                    hash = hex::encode(tx_frame.hash()),
                    code = ?tx_frame.result.code,
                );
                tx_results.push((*tx_frame.hash(), tx_frame.result));
                continue;
            }

            let ok = tx_frame
                .apply_operations(&self.store, &mut sp, &mut tx_delta, &self.params)
                .await?;
            sp.commit().await.map_err(StoreError::from)?;
            delta.commit_child(tx_delta);
            if ok {
                applied += 1;
            }
            tx_results.push((*tx_frame.hash(), tx_frame.result));
        }

        for upgrade in &value.upgrades {
            match upgrade {
                LedgerUpgrade::BaseFee(base_fee) => {
                    info!(event = "applying base fee upgrade", base_fee);
                    delta.header_mut().base_fee = *base_fee;
                }
            }
        }

        self.state = CloseState::Committing;
        let mut header = delta.header().clone();
        header.finalize_hash();

        self.store.store_header(&mut dbtx, &header).await?;
        dbtx.commit().await.map_err(StoreError::from)?;

        // snapshots never survive a close
        self.store.cache().clear();

        metrics::counter!("ledger_close").increment(1);
        info!(
            event = "ledger closed",
            seq = ledger_seq,
            hash = hex::encode(header.hash),
            txs_count = tx_results.len(),
            txs_applied = applied,
        );

        self.last_closed = header.clone();
        let _ = self.close_events.send(LedgerCloseEvent {
            ledger_seq,
            header_hash: header.hash,
            base_fee: header.base_fee,
            close_time: header.close_time,
        });
        self.floodgate.clear_below(ledger_seq);

        Ok(LedgerCloseOutcome { header, tx_results })
    }
}
