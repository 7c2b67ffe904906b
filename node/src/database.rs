// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) LUMEN NETWORK. All rights reserved.

pub(crate) mod accounts;
pub mod cache;
pub(crate) mod headers;
pub(crate) mod offers;
pub(crate) mod trustlines;

use std::path::Path;

use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use thiserror::Error;
use tracing::info;

use node_data::ledger::{Asset, LedgerEntry, LedgerHeader, LedgerKey};

use cache::EntryCache;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    /// A write touched an unexpected number of rows, or storage
    /// contradicts the live state. Unrecoverable: the close must abort
    /// without committing.
    #[error("storage invariant violation: {0}")]
    InvariantViolation(String),
    #[error("bad database state: {0}")]
    BadState(String),
    #[error("encoding error: {0}")]
    Encoding(#[from] std::io::Error),
}

/// Typed CRUD over persistent ledger entries with a read-through cache.
///
/// The pool is restricted to a single connection: the ledger is the unit
/// of write atomicity and the core is the sole writer.
pub struct EntryStore {
    pool: SqlitePool,
    cache: EntryCache,
}

impl EntryStore {
    /// Opens the database at `path`, creating it and the schema when
    /// missing.
    pub async fn create_or_open(
        path: impl AsRef<Path>,
        cache_entries: usize,
    ) -> Result<Self, StoreError> {
        let path = path.as_ref();
        info!(event = "opening entry store", db = %path.display());

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        for stmt in schema() {
            sqlx::query(stmt).execute(&pool).await?;
        }

        Ok(Self {
            pool,
            cache: EntryCache::new(cache_entries),
        })
    }

    pub async fn acquire(&self) -> Result<PoolConnection<Sqlite>, StoreError> {
        Ok(self.pool.acquire().await?)
    }

    /// Starts the root transaction of a ledger close.
    pub async fn begin(
        &self,
    ) -> Result<Transaction<'static, Sqlite>, StoreError> {
        Ok(self.pool.begin().await?)
    }

    pub fn cache(&self) -> &EntryCache {
        &self.cache
    }

    /// Drops the cached snapshots for every given key; used when a
    /// rolled-back scope may have re-populated the cache with state that
    /// no longer exists.
    pub fn flush_cache_keys<'a>(
        &self,
        keys: impl IntoIterator<Item = &'a LedgerKey>,
    ) {
        for key in keys {
            self.cache.flush(key);
        }
    }

    /// Existence check straight against storage. The cache is
    /// deliberately not consulted: the store is the source of truth for
    /// existence.
    pub async fn exists(
        &self,
        conn: &mut SqliteConnection,
        key: &LedgerKey,
    ) -> Result<bool, StoreError> {
        match key {
            LedgerKey::Account { account_id } => {
                accounts::exists(conn, account_id).await
            }
            LedgerKey::Trustline { account_id, asset } => {
                trustlines::exists(conn, account_id, asset).await
            }
            LedgerKey::Offer {
                seller_id,
                offer_id,
            } => offers::exists(conn, seller_id, *offer_id).await,
        }
    }

    /// One SQL select for the entry under `key`, bypassing the cache.
    pub(crate) async fn select_entry(
        &self,
        conn: &mut SqliteConnection,
        key: &LedgerKey,
    ) -> Result<Option<LedgerEntry>, StoreError> {
        Ok(match key {
            LedgerKey::Account { account_id } => {
                accounts::select(conn, account_id)
                    .await?
                    .map(LedgerEntry::Account)
            }
            LedgerKey::Trustline { account_id, asset } => {
                trustlines::select(conn, account_id, asset)
                    .await?
                    .map(LedgerEntry::Trustline)
            }
            LedgerKey::Offer {
                seller_id,
                offer_id,
            } => offers::select(conn, seller_id, *offer_id)
                .await?
                .map(LedgerEntry::Offer),
        })
    }

    /// Best offers selling `selling` for `buying`, in `(price, offerid)`
    /// order. The ordering is consensus-critical: every replica must
    /// cross against identical offers.
    pub async fn best_offers(
        &self,
        conn: &mut SqliteConnection,
        selling: &Asset,
        buying: &Asset,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<node_data::ledger::OfferEntry>, StoreError> {
        offers::select_best(conn, selling, buying, limit, offset).await
    }

    /// Asserts that the live entry matches what storage holds for its
    /// key. Flushes the cache first so the comparison reads the durable
    /// row.
    pub async fn check_against_database(
        &self,
        conn: &mut SqliteConnection,
        live: &LedgerEntry,
    ) -> Result<(), StoreError> {
        let key = live.key();
        self.cache.flush(&key);
        let stored = self.select_entry(conn, &key).await?;
        match stored {
            Some(ref entry) if entry == live => Ok(()),
            _ => Err(StoreError::InvariantViolation(format!(
                "inconsistent state between objects: db {stored:?}, live {live:?}"
            ))),
        }
    }

    pub async fn store_header(
        &self,
        conn: &mut SqliteConnection,
        header: &LedgerHeader,
    ) -> Result<(), StoreError> {
        headers::insert(conn, header).await
    }

    pub async fn load_latest_header(
        &self,
        conn: &mut SqliteConnection,
    ) -> Result<Option<LedgerHeader>, StoreError> {
        headers::select_latest(conn).await
    }

    pub async fn load_header_by_seq(
        &self,
        conn: &mut SqliteConnection,
        ledger_seq: u32,
    ) -> Result<Option<LedgerHeader>, StoreError> {
        headers::select_by_seq(conn, ledger_seq).await
    }
}

fn schema() -> impl Iterator<Item = &'static str> {
    accounts::SCHEMA
        .iter()
        .chain(trustlines::SCHEMA)
        .chain(offers::SCHEMA)
        .chain(headers::SCHEMA)
        .copied()
}
