// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) LUMEN NETWORK. All rights reserved.

use std::io::{self, Write};

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::Serializable;

use super::{to_str, Hash};

/// Header of one closed ledger.
///
/// The hash commits to every hashable field, which in turn commit to the
/// previous header and the transaction set applied; replaying the same
/// close inputs reproduces the hash byte-for-byte.
#[derive(Default, Eq, PartialEq, Clone, Serialize)]
pub struct LedgerHeader {
    // Hashable fields
    pub ledger_version: u32,
    #[serde(serialize_with = "crate::serialize_hex")]
    pub previous_ledger_hash: Hash,
    #[serde(serialize_with = "crate::serialize_hex")]
    pub tx_set_hash: Hash,
    pub close_time: u64,
    pub total_coins: i64,
    pub fee_pool: i64,
    pub ledger_seq: u32,
    /// Last identifier handed out to a new offer.
    pub id_pool: u64,
    pub base_fee: u32,
    pub base_reserve: u32,

    // Header hash
    #[serde(serialize_with = "crate::serialize_hex")]
    pub hash: Hash,
}

impl std::fmt::Debug for LedgerHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let close_time =
            chrono::DateTime::from_timestamp(self.close_time as i64, 0)
                .map_or_else(|| "unknown".to_owned(), |v| v.to_rfc2822());

        f.debug_struct("LedgerHeader")
            .field("ledger_seq", &self.ledger_seq)
            .field("close_time", &close_time)
            .field("previous_ledger_hash", &to_str(&self.previous_ledger_hash))
            .field("tx_set_hash", &to_str(&self.tx_set_hash))
            .field("total_coins", &self.total_coins)
            .field("fee_pool", &self.fee_pool)
            .field("id_pool", &self.id_pool)
            .field("base_fee", &self.base_fee)
            .field("base_reserve", &self.base_reserve)
            .field("hash", &to_str(&self.hash))
            .finish()
    }
}

impl LedgerHeader {
    /// Marshal hashable fields.
    pub(crate) fn marshal_hashable<W: Write>(
        &self,
        w: &mut W,
    ) -> io::Result<()> {
        w.write_all(&self.ledger_version.to_be_bytes())?;
        w.write_all(&self.previous_ledger_hash)?;
        w.write_all(&self.tx_set_hash)?;
        w.write_all(&self.close_time.to_be_bytes())?;
        w.write_all(&self.total_coins.to_be_bytes())?;
        w.write_all(&self.fee_pool.to_be_bytes())?;
        w.write_all(&self.ledger_seq.to_be_bytes())?;
        w.write_all(&self.id_pool.to_be_bytes())?;
        w.write_all(&self.base_fee.to_be_bytes())?;
        w.write_all(&self.base_reserve.to_be_bytes())?;

        Ok(())
    }

    pub(crate) fn unmarshal_hashable<R: io::Read>(
        r: &mut R,
    ) -> io::Result<Self> {
        let ledger_version = Self::read_u32_be(r)?;
        let previous_ledger_hash = Self::read_bytes(r)?;
        let tx_set_hash = Self::read_bytes(r)?;
        let close_time = Self::read_u64_be(r)?;
        let total_coins = Self::read_i64_be(r)?;
        let fee_pool = Self::read_i64_be(r)?;
        let ledger_seq = Self::read_u32_be(r)?;
        let id_pool = Self::read_u64_be(r)?;
        let base_fee = Self::read_u32_be(r)?;
        let base_reserve = Self::read_u32_be(r)?;

        Ok(LedgerHeader {
            ledger_version,
            previous_ledger_hash,
            tx_set_hash,
            close_time,
            total_coins,
            fee_pool,
            ledger_seq,
            id_pool,
            base_fee,
            base_reserve,
            hash: [0; 32],
        })
    }

    /// Recomputes the header hash from the hashable fields.
    pub fn finalize_hash(&mut self) {
        let mut hasher = Sha256::new();
        self.marshal_hashable(&mut hasher)
            .expect("write to hasher should not fail");
        self.hash = hasher.finalize().into();
    }
}
