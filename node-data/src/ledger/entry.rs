// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) LUMEN NETWORK. All rights reserved.

use std::cmp::Ordering;

use crate::keys::AccountId;
use crate::Serializable;

use super::Asset;

/// Account flag: trustlines for assets issued by this account start out
/// unauthorized and must be allowed explicitly.
pub const ACCOUNT_AUTH_REQUIRED_FLAG: u32 = 0x1;
/// Account flag: the issuer may revoke a previously granted authorization.
pub const ACCOUNT_AUTH_REVOCABLE_FLAG: u32 = 0x2;

/// Trustline flag bit 0: the holder is authorized to transact the asset.
pub const TRUSTLINE_AUTHORIZED_FLAG: u32 = 0x1;

/// Scale applied when collapsing a rational price into the indexed
/// `price` database column: `price = n * 2^32 / d`.
pub const OFFER_PRICE_DIVISOR: i64 = 1 << 32;

/// Rational price `n/d`, both strictly positive for a valid offer.
#[derive(Debug, Eq, PartialEq, Clone, Copy, Hash)]
pub struct Price {
    pub n: i32,
    pub d: i32,
}

impl Price {
    pub fn new(n: i32, d: i32) -> Self {
        Self { n, d }
    }

    pub fn is_valid(&self) -> bool {
        self.n > 0 && self.d > 0
    }
}

impl PartialOrd for Price {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Price {
    // Rational ordering; 128-bit products cannot overflow.
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = self.n as i128 * other.d as i128;
        let rhs = other.n as i128 * self.d as i128;
        lhs.cmp(&rhs)
    }
}

#[derive(Debug, Default, Eq, PartialEq, Clone)]
pub struct Signer {
    pub key: AccountId,
    pub weight: u32,
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub struct AccountEntry {
    pub account_id: AccountId,
    pub balance: i64,
    pub seq_num: u64,
    pub num_sub_entries: u32,
    pub flags: u32,
    /// Weights: [master, low, medium, high].
    pub thresholds: [u8; 4],
    pub signers: Vec<Signer>,
}

impl AccountEntry {
    pub fn new(account_id: AccountId) -> Self {
        Self {
            account_id,
            balance: 0,
            seq_num: 0,
            num_sub_entries: 0,
            flags: 0,
            thresholds: [1, 0, 0, 0],
            signers: vec![],
        }
    }
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub struct TrustlineEntry {
    pub account_id: AccountId,
    pub asset: Asset,
    pub balance: i64,
    pub limit: i64,
    pub flags: u32,
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub struct OfferEntry {
    pub seller_id: AccountId,
    pub offer_id: u64,
    /// What the seller is giving up.
    pub selling: Asset,
    /// What the seller wants in return.
    pub buying: Asset,
    /// Remaining amount of `selling` on the book.
    pub amount: i64,
    /// Price of `selling` in terms of `buying`.
    pub price: Price,
    pub flags: u32,
}

/// A persistent ledger entry.
#[derive(Debug, Eq, PartialEq, Clone)]
pub enum LedgerEntry {
    Account(AccountEntry),
    Trustline(TrustlineEntry),
    Offer(OfferEntry),
}

impl LedgerEntry {
    /// Union tag shared with [`LedgerKey`].
    pub fn type_tag(&self) -> u32 {
        match self {
            LedgerEntry::Account(_) => 0,
            LedgerEntry::Trustline(_) => 1,
            LedgerEntry::Offer(_) => 2,
        }
    }

    /// Derives the canonical identifier from the entry body.
    pub fn key(&self) -> LedgerKey {
        match self {
            LedgerEntry::Account(a) => LedgerKey::Account {
                account_id: a.account_id,
            },
            LedgerEntry::Trustline(t) => LedgerKey::Trustline {
                account_id: t.account_id,
                asset: t.asset.clone(),
            },
            LedgerEntry::Offer(o) => LedgerKey::Offer {
                seller_id: o.seller_id,
                offer_id: o.offer_id,
            },
        }
    }
}

/// Canonical identifier of a [`LedgerEntry`].
///
/// The hex of its encoding keys the entry cache; storage and cache must
/// agree on the derivation in [`LedgerEntry::key`].
#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Clone, Hash)]
pub enum LedgerKey {
    Account {
        account_id: AccountId,
    },
    Trustline {
        account_id: AccountId,
        asset: Asset,
    },
    Offer {
        seller_id: AccountId,
        offer_id: u64,
    },
}

impl LedgerKey {
    pub fn type_tag(&self) -> u32 {
        match self {
            LedgerKey::Account { .. } => 0,
            LedgerKey::Trustline { .. } => 1,
            LedgerKey::Offer { .. } => 2,
        }
    }

    /// Hex of the canonical encoding; the entry-cache key.
    pub fn cache_key(&self) -> String {
        hex::encode(self.to_bytes())
    }
}
