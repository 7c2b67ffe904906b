// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) LUMEN NETWORK. All rights reserved.

use std::collections::{BTreeMap, BTreeSet};

use node_data::ledger::{LedgerEntry, LedgerHeader, LedgerKey};

/// Journal of the entry changes produced while applying a ledger.
///
/// A delta carries the working copy of the next header (the id pool lives
/// there) plus ordered sets of added, modified and deleted entries. A
/// child delta stages the work of one transaction or operation: on
/// success it merges into its parent, on failure it is simply dropped.
/// The database rollback belongs to the enclosing savepoint; the journal
/// only has to forget.
///
/// Maps are ordered so anything iterating the journal in the apply path
/// stays deterministic.
#[derive(Debug, Clone)]
pub struct LedgerDelta {
    header: LedgerHeader,
    added: BTreeMap<LedgerKey, LedgerEntry>,
    modified: BTreeMap<LedgerKey, (LedgerEntry, LedgerEntry)>,
    deleted: BTreeSet<LedgerKey>,
}

impl LedgerDelta {
    pub fn new(header: LedgerHeader) -> Self {
        Self {
            header,
            added: BTreeMap::new(),
            modified: BTreeMap::new(),
            deleted: BTreeSet::new(),
        }
    }

    /// Working copy of the header being built by this close.
    pub fn header(&self) -> &LedgerHeader {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut LedgerHeader {
        &mut self.header
    }

    /// Mints the next entry identifier from the header id pool.
    pub fn generate_id(&mut self) -> u64 {
        self.header.id_pool += 1;
        self.header.id_pool
    }

    /// Spawns a staging delta that inherits the current header state.
    pub fn new_child(&self) -> LedgerDelta {
        LedgerDelta::new(self.header.clone())
    }

    pub fn record_add(&mut self, entry: &LedgerEntry) {
        let key = entry.key();
        self.deleted.remove(&key);
        self.added.insert(key, entry.clone());
    }

    pub fn record_mod(&mut self, prev: &LedgerEntry, next: &LedgerEntry) {
        let key = next.key();
        if let Some(added) = self.added.get_mut(&key) {
            // created in this scope: still an add, with the newest body
            *added = next.clone();
        } else if let Some((_, stored_next)) = self.modified.get_mut(&key) {
            *stored_next = next.clone();
        } else {
            self.modified.insert(key, (prev.clone(), next.clone()));
        }
    }

    pub fn record_delete(&mut self, key: LedgerKey) {
        if self.added.remove(&key).is_some() {
            // add then delete in the same scope cancels out
            return;
        }
        self.modified.remove(&key);
        self.deleted.insert(key);
    }

    /// Merges a committed child into this delta. Deletes dominate prior
    /// adds and modifications of the same key.
    pub fn commit_child(&mut self, child: LedgerDelta) {
        self.header = child.header;

        for (key, entry) in child.added {
            self.deleted.remove(&key);
            self.added.insert(key, entry);
        }
        for (key, (prev, next)) in child.modified {
            if let Some(added) = self.added.get_mut(&key) {
                *added = next;
            } else if let Some((_, stored_next)) = self.modified.get_mut(&key)
            {
                *stored_next = next;
            } else {
                self.modified.insert(key, (prev, next));
            }
        }
        for key in child.deleted {
            if self.added.remove(&key).is_some() {
                continue;
            }
            self.modified.remove(&key);
            self.deleted.insert(key);
        }
    }

    /// Keys this delta has touched in any way; the set to flush from the
    /// entry cache when the enclosing savepoint rolls back.
    pub fn touched_keys(&self) -> impl Iterator<Item = &LedgerKey> {
        self.added
            .keys()
            .chain(self.modified.keys())
            .chain(self.deleted.iter())
    }

    pub fn added(&self) -> &BTreeMap<LedgerKey, LedgerEntry> {
        &self.added
    }

    pub fn modified(&self) -> &BTreeMap<LedgerKey, (LedgerEntry, LedgerEntry)> {
        &self.modified
    }

    pub fn deleted(&self) -> &BTreeSet<LedgerKey> {
        &self.deleted
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.modified.is_empty()
            && self.deleted.is_empty()
    }
}
