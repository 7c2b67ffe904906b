// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) LUMEN NETWORK. All rights reserved.

mod asset;
pub use asset::{is_asset_valid, Asset, AssetError};

mod entry;
pub use entry::{
    AccountEntry, LedgerEntry, LedgerKey, OfferEntry, Price, Signer,
    TrustlineEntry, ACCOUNT_AUTH_REQUIRED_FLAG, ACCOUNT_AUTH_REVOCABLE_FLAG,
    OFFER_PRICE_DIVISOR, TRUSTLINE_AUTHORIZED_FLAG,
};

mod header;
pub use header::LedgerHeader;

mod transaction;
pub use transaction::{
    AllowTrustAsset, AllowTrustOp, ManageOfferOp, Memo, Operation,
    OperationBody, PathPaymentOp, Transaction, TransactionEnvelope,
    TransactionSet, ENVELOPE_TYPE_TX, MAX_PATH_LENGTH,
};

mod result;
pub use result::{
    AllowTrustResult, ClaimOfferAtom, ManageOfferEffect, ManageOfferResult,
    OperationResult, PathPaymentResult, SimplePaymentResult,
    TransactionResult, TxResultCode,
};

pub type Hash = [u8; 32];

/// Encode a byte array into a shortened HEX representation.
pub fn to_str(bytes: &[u8]) -> String {
    const OFFSET: usize = 16;
    let hex = hex::encode(bytes);
    if bytes.len() <= OFFSET {
        return hex;
    }

    let len = hex.len();

    let first = &hex[0..OFFSET];
    let last = &hex[len - OFFSET..];

    format!("{first}...{last}")
}

#[cfg(any(feature = "faker", test))]
pub mod faker {
    pub use super::transaction::faker::{
        gen_envelope, gen_path_payment, signed_envelope,
    };
}
