// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) LUMEN NETWORK. All rights reserved.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;

use node_data::ledger::{LedgerEntry, LedgerKey};

/// Read-through cache of immutable entry snapshots.
///
/// Keyed by the hex of the canonical key encoding. Snapshots are shared
/// read-only; writers invalidate and the next load re-populates. Any
/// `store*` call flushes the affected key before touching the database.
pub struct EntryCache {
    inner: Mutex<LruCache<String, Arc<LedgerEntry>>>,
}

impl EntryCache {
    pub fn new(entries: usize) -> Self {
        let cap = NonZeroUsize::new(entries.max(1))
            .expect("cache capacity is non-zero");
        Self {
            inner: Mutex::new(LruCache::new(cap)),
        }
    }

    pub fn get(&self, key: &LedgerKey) -> Option<Arc<LedgerEntry>> {
        self.inner.lock().get(&key.cache_key()).cloned()
    }

    pub fn exists(&self, key: &LedgerKey) -> bool {
        self.inner.lock().contains(&key.cache_key())
    }

    pub fn put(&self, key: &LedgerKey, entry: LedgerEntry) {
        self.inner.lock().put(key.cache_key(), Arc::new(entry));
    }

    pub fn flush(&self, key: &LedgerKey) {
        self.inner.lock().pop(&key.cache_key());
    }

    /// Drops every snapshot; invoked on ledger close.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}
