// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) LUMEN NETWORK. All rights reserved.

use sqlx::SqliteConnection;

use node_data::keys::AccountId;
use node_data::ledger::{
    AccountEntry, Asset, LedgerEntry, LedgerKey, OfferEntry, TrustlineEntry,
    ACCOUNT_AUTH_REQUIRED_FLAG, ACCOUNT_AUTH_REVOCABLE_FLAG,
    TRUSTLINE_AUTHORIZED_FLAG,
};

use crate::database::{accounts, offers, trustlines, EntryStore, StoreError};

use super::conf::LedgerParams;
use super::LedgerDelta;

/// Generates one frame struct plus the load/store plumbing every frame
/// variant shares: cache-first hydration, write-through with cache
/// invalidation, journaling through the delta, and the consistency check
/// in debug builds.
macro_rules! entry_frame {
    ($frame:ident, $entry:ty, $wrap:path, $table:ident) => {
        #[derive(Debug, Clone)]
        pub struct $frame {
            entry: $entry,
            /// Body as last persisted; the `prev` side of the journal.
            last_stored: Option<$entry>,
        }

        impl $frame {
            /// Fresh frame for an entry that is not in storage yet.
            pub fn new(entry: $entry) -> Self {
                Self {
                    entry,
                    last_stored: None,
                }
            }

            fn hydrated(entry: $entry) -> Self {
                Self {
                    entry: entry.clone(),
                    last_stored: Some(entry),
                }
            }

            pub fn key(&self) -> LedgerKey {
                self.ledger_entry().key()
            }

            fn ledger_entry(&self) -> LedgerEntry {
                $wrap(self.entry.clone())
            }

            /// Inserts the entry and journals the addition.
            pub async fn store_add(
                &mut self,
                store: &EntryStore,
                conn: &mut SqliteConnection,
                delta: &mut LedgerDelta,
            ) -> Result<(), StoreError> {
                store.cache().flush(&self.key());
                $table::insert(conn, &self.entry).await?;
                #[cfg(debug_assertions)]
                store
                    .check_against_database(conn, &self.ledger_entry())
                    .await?;

                delta.record_add(&self.ledger_entry());
                self.last_stored = Some(self.entry.clone());
                Ok(())
            }

            /// Updates the stored row and journals `(prev, next)`.
            pub async fn store_change(
                &mut self,
                store: &EntryStore,
                conn: &mut SqliteConnection,
                delta: &mut LedgerDelta,
            ) -> Result<(), StoreError> {
                store.cache().flush(&self.key());
                $table::update(conn, &self.entry).await?;
                #[cfg(debug_assertions)]
                store
                    .check_against_database(conn, &self.ledger_entry())
                    .await?;

                let prev = self
                    .last_stored
                    .clone()
                    .unwrap_or_else(|| self.entry.clone());
                delta.record_mod(&$wrap(prev), &self.ledger_entry());
                self.last_stored = Some(self.entry.clone());
                Ok(())
            }

            /// Branches on durable existence; the cache is not trusted
            /// for that answer.
            pub async fn store_add_or_change(
                &mut self,
                store: &EntryStore,
                conn: &mut SqliteConnection,
                delta: &mut LedgerDelta,
            ) -> Result<(), StoreError> {
                if store.exists(conn, &self.key()).await? {
                    self.store_change(store, conn, delta).await
                } else {
                    self.store_add(store, conn, delta).await
                }
            }
        }
    };
}

entry_frame!(AccountFrame, AccountEntry, LedgerEntry::Account, accounts);
entry_frame!(TrustFrame, TrustlineEntry, LedgerEntry::Trustline, trustlines);
entry_frame!(OfferFrame, OfferEntry, LedgerEntry::Offer, offers);

impl AccountFrame {
    pub async fn load(
        store: &EntryStore,
        conn: &mut SqliteConnection,
        account_id: &AccountId,
    ) -> Result<Option<Self>, StoreError> {
        let key = LedgerKey::Account {
            account_id: *account_id,
        };
        if let Some(snapshot) = store.cache().get(&key) {
            return match snapshot.as_ref() {
                LedgerEntry::Account(entry) => {
                    Ok(Some(Self::hydrated(entry.clone())))
                }
                other => Err(StoreError::InvariantViolation(format!(
                    "cache holds {other:?} under an account key"
                ))),
            };
        }

        match accounts::select(conn, account_id).await? {
            Some(entry) => {
                store.cache().put(&key, LedgerEntry::Account(entry.clone()));
                Ok(Some(Self::hydrated(entry)))
            }
            None => Ok(None),
        }
    }

    pub fn account(&self) -> &AccountEntry {
        &self.entry
    }

    pub fn account_mut(&mut self) -> &mut AccountEntry {
        &mut self.entry
    }

    pub fn id(&self) -> &AccountId {
        &self.entry.account_id
    }

    pub fn is_auth_required(&self) -> bool {
        self.entry.flags & ACCOUNT_AUTH_REQUIRED_FLAG != 0
    }

    pub fn is_auth_revocable(&self) -> bool {
        self.entry.flags & ACCOUNT_AUTH_REVOCABLE_FLAG != 0
    }

    /// Native balance the account may not spend below.
    pub fn min_balance(&self, params: &LedgerParams) -> i64 {
        params.min_balance(self.entry.num_sub_entries)
    }

    /// Adjusts the balance, refusing underflow and `i64` overflow.
    #[must_use]
    pub fn add_balance(&mut self, delta: i64) -> bool {
        match self.entry.balance.checked_add(delta) {
            Some(balance) if balance >= 0 => {
                self.entry.balance = balance;
                true
            }
            _ => false,
        }
    }
}

impl TrustFrame {
    pub async fn load(
        store: &EntryStore,
        conn: &mut SqliteConnection,
        account_id: &AccountId,
        asset: &Asset,
    ) -> Result<Option<Self>, StoreError> {
        let key = LedgerKey::Trustline {
            account_id: *account_id,
            asset: asset.clone(),
        };
        if let Some(snapshot) = store.cache().get(&key) {
            return match snapshot.as_ref() {
                LedgerEntry::Trustline(entry) => {
                    Ok(Some(Self::hydrated(entry.clone())))
                }
                other => Err(StoreError::InvariantViolation(format!(
                    "cache holds {other:?} under a trustline key"
                ))),
            };
        }

        match trustlines::select(conn, account_id, asset).await? {
            Some(entry) => {
                store
                    .cache()
                    .put(&key, LedgerEntry::Trustline(entry.clone()));
                Ok(Some(Self::hydrated(entry)))
            }
            None => Ok(None),
        }
    }

    pub fn trustline(&self) -> &TrustlineEntry {
        &self.entry
    }

    pub fn trustline_mut(&mut self) -> &mut TrustlineEntry {
        &mut self.entry
    }

    pub fn is_authorized(&self) -> bool {
        self.entry.flags & TRUSTLINE_AUTHORIZED_FLAG != 0
    }

    pub fn set_authorized(&mut self, authorized: bool) {
        if authorized {
            self.entry.flags |= TRUSTLINE_AUTHORIZED_FLAG;
        } else {
            self.entry.flags &= !TRUSTLINE_AUTHORIZED_FLAG;
        }
    }

    /// Adjusts the balance within `[0, limit]`.
    #[must_use]
    pub fn add_balance(&mut self, delta: i64) -> bool {
        match self.entry.balance.checked_add(delta) {
            Some(balance) if balance >= 0 && balance <= self.entry.limit => {
                self.entry.balance = balance;
                true
            }
            _ => false,
        }
    }

    /// Room left under the trustline limit.
    pub fn available_limit(&self) -> i64 {
        self.entry.limit - self.entry.balance
    }
}

impl OfferFrame {
    pub async fn load(
        store: &EntryStore,
        conn: &mut SqliteConnection,
        seller_id: &AccountId,
        offer_id: u64,
    ) -> Result<Option<Self>, StoreError> {
        let key = LedgerKey::Offer {
            seller_id: *seller_id,
            offer_id,
        };
        if let Some(snapshot) = store.cache().get(&key) {
            return match snapshot.as_ref() {
                LedgerEntry::Offer(entry) => {
                    Ok(Some(Self::hydrated(entry.clone())))
                }
                other => Err(StoreError::InvariantViolation(format!(
                    "cache holds {other:?} under an offer key"
                ))),
            };
        }

        match offers::select(conn, seller_id, offer_id).await? {
            Some(entry) => {
                store.cache().put(&key, LedgerEntry::Offer(entry.clone()));
                Ok(Some(Self::hydrated(entry)))
            }
            None => Ok(None),
        }
    }

    /// Wraps a freshly fetched book row.
    pub fn from_book(entry: OfferEntry) -> Self {
        Self::hydrated(entry)
    }

    pub fn offer(&self) -> &OfferEntry {
        &self.entry
    }

    pub fn offer_mut(&mut self) -> &mut OfferEntry {
        &mut self.entry
    }

    /// Removes the offer from the book and journals the deletion.
    pub async fn store_delete(
        self,
        store: &EntryStore,
        conn: &mut SqliteConnection,
        delta: &mut LedgerDelta,
    ) -> Result<(), StoreError> {
        let key = self.key();
        store.cache().flush(&key);
        offers::delete(conn, self.entry.offer_id).await?;
        delta.record_delete(key);
        Ok(())
    }
}

/// The closed family of entry frames, used where storage is driven by a
/// key rather than a known variant.
#[derive(Debug, Clone)]
pub enum EntryFrame {
    Account(AccountFrame),
    Trust(TrustFrame),
    Offer(OfferFrame),
}

impl EntryFrame {
    pub fn from_entry(entry: LedgerEntry) -> Self {
        match entry {
            LedgerEntry::Account(e) => {
                EntryFrame::Account(AccountFrame::new(e))
            }
            LedgerEntry::Trustline(e) => EntryFrame::Trust(TrustFrame::new(e)),
            LedgerEntry::Offer(e) => EntryFrame::Offer(OfferFrame::new(e)),
        }
    }

    /// Cache-first load of whatever entry lives under `key`.
    pub async fn store_load(
        store: &EntryStore,
        conn: &mut SqliteConnection,
        key: &LedgerKey,
    ) -> Result<Option<Self>, StoreError> {
        Ok(match key {
            LedgerKey::Account { account_id } => {
                AccountFrame::load(store, conn, account_id)
                    .await?
                    .map(EntryFrame::Account)
            }
            LedgerKey::Trustline { account_id, asset } => {
                TrustFrame::load(store, conn, account_id, asset)
                    .await?
                    .map(EntryFrame::Trust)
            }
            LedgerKey::Offer {
                seller_id,
                offer_id,
            } => OfferFrame::load(store, conn, seller_id, *offer_id)
                .await?
                .map(EntryFrame::Offer),
        })
    }

    pub fn entry(&self) -> LedgerEntry {
        match self {
            EntryFrame::Account(f) => LedgerEntry::Account(f.entry.clone()),
            EntryFrame::Trust(f) => LedgerEntry::Trustline(f.entry.clone()),
            EntryFrame::Offer(f) => LedgerEntry::Offer(f.entry.clone()),
        }
    }

    pub fn key(&self) -> LedgerKey {
        self.entry().key()
    }

    pub async fn store_add(
        &mut self,
        store: &EntryStore,
        conn: &mut SqliteConnection,
        delta: &mut LedgerDelta,
    ) -> Result<(), StoreError> {
        match self {
            EntryFrame::Account(f) => f.store_add(store, conn, delta).await,
            EntryFrame::Trust(f) => f.store_add(store, conn, delta).await,
            EntryFrame::Offer(f) => f.store_add(store, conn, delta).await,
        }
    }

    pub async fn store_change(
        &mut self,
        store: &EntryStore,
        conn: &mut SqliteConnection,
        delta: &mut LedgerDelta,
    ) -> Result<(), StoreError> {
        match self {
            EntryFrame::Account(f) => f.store_change(store, conn, delta).await,
            EntryFrame::Trust(f) => f.store_change(store, conn, delta).await,
            EntryFrame::Offer(f) => f.store_change(store, conn, delta).await,
        }
    }

    /// Deletes the row under `key` and journals the deletion.
    pub async fn store_delete(
        store: &EntryStore,
        conn: &mut SqliteConnection,
        delta: &mut LedgerDelta,
        key: &LedgerKey,
    ) -> Result<(), StoreError> {
        store.cache().flush(key);
        match key {
            LedgerKey::Account { account_id } => {
                accounts::delete(conn, account_id).await?
            }
            LedgerKey::Trustline { account_id, asset } => {
                trustlines::delete(conn, account_id, asset).await?
            }
            LedgerKey::Offer { offer_id, .. } => {
                offers::delete(conn, *offer_id).await?
            }
        }
        delta.record_delete(key.clone());
        Ok(())
    }
}
