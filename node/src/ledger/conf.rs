// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) LUMEN NETWORK. All rights reserved.

use std::fmt::Formatter;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use node_data::ledger::Hash;

pub const DEFAULT_BASE_FEE: u32 = 10;
pub const DEFAULT_BASE_RESERVE: u32 = 10_000_000;
pub const DEFAULT_MAX_TX_SET_SIZE: usize = 100;
pub const DEFAULT_ENTRY_CACHE_SIZE: usize = 4096;

/// Protocol parameters of the ledger core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerParams {
    /// Phrase hashed into the network id; isolates disjoint networks.
    pub network_passphrase: String,
    /// Genesis per-operation fee, in the smallest native unit.
    pub base_fee: u32,
    /// Reserve charged per account plus per sub-entry.
    pub base_reserve: u32,
    /// Per-ledger admission limit driving surge pricing.
    pub max_tx_set_size: usize,
    /// Native supply minted to the root account at genesis.
    pub total_coins: i64,
    /// Capacity of the read-through entry cache.
    pub entry_cache_size: usize,
}

impl Default for LedgerParams {
    fn default() -> Self {
        Self {
            network_passphrase: "lumen standalone network ; 2026".into(),
            base_fee: DEFAULT_BASE_FEE,
            base_reserve: DEFAULT_BASE_RESERVE,
            max_tx_set_size: DEFAULT_MAX_TX_SET_SIZE,
            total_coins: 1_000_000_000 * 10_000_000,
            entry_cache_size: DEFAULT_ENTRY_CACHE_SIZE,
        }
    }
}

impl std::fmt::Display for LedgerParams {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "network: {}, base_fee: {}, base_reserve: {}, max_tx_set_size: {}",
            self.network_passphrase,
            self.base_fee,
            self.base_reserve,
            self.max_tx_set_size,
        )
    }
}

impl LedgerParams {
    /// Hash of the passphrase; mixed into every transaction hash.
    pub fn network_id(&self) -> Hash {
        Sha256::digest(self.network_passphrase.as_bytes()).into()
    }

    /// Native balance an account must keep above its obligations.
    pub fn min_balance(&self, num_sub_entries: u32) -> i64 {
        (2 + num_sub_entries as i64) * self.base_reserve as i64
    }
}
