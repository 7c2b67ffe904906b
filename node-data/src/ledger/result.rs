// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) LUMEN NETWORK. All rights reserved.

use crate::keys::AccountId;

use super::{Asset, OfferEntry};

/// Transaction-level result code.
///
/// Negative discriminants are failures; the values are wire format and
/// must never be renumbered.
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
#[repr(i32)]
pub enum TxResultCode {
    Success = 0,
    /// One of the operations failed (none were applied).
    Failed = -1,
    MissingOperation = -2,
    BadSeq = -3,
    BadAuth = -4,
    InsufficientBalance = -5,
    NoAccount = -6,
    InsufficientFee = -7,
}

impl TxResultCode {
    pub fn from_i32(v: i32) -> Option<Self> {
        Some(match v {
            0 => Self::Success,
            -1 => Self::Failed,
            -2 => Self::MissingOperation,
            -3 => Self::BadSeq,
            -4 => Self::BadAuth,
            -5 => Self::InsufficientBalance,
            -6 => Self::NoAccount,
            -7 => Self::InsufficientFee,
            _ => return None,
        })
    }
}

/// One crossed offer in a trade trail.
#[derive(Debug, Eq, PartialEq, Clone)]
pub struct ClaimOfferAtom {
    pub seller_id: AccountId,
    pub offer_id: u64,
    /// What the taker claimed out of the offer.
    pub asset_claimed: Asset,
    pub amount_claimed: i64,
    /// What the seller received in exchange.
    pub asset_sent: Asset,
    pub amount_sent: i64,
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub struct SimplePaymentResult {
    pub destination: AccountId,
    pub asset: Asset,
    pub amount: i64,
}

/// Result of a path payment.
///
/// Wire discriminants: success is 0, failures run -1..-11 in declaration
/// order.
#[derive(Debug, Eq, PartialEq, Clone)]
pub enum PathPaymentResult {
    Success {
        /// Offers taken along the way, in path order.
        offers: Vec<ClaimOfferAtom>,
        last: SimplePaymentResult,
    },
    Malformed,
    Underfunded,
    SrcNoTrust,
    SrcNotAuthorized,
    NoDestination,
    NoTrust,
    NotAuthorized,
    LineFull,
    NoIssuer,
    TooFewOffers,
    OverSendmax,
}

impl PathPaymentResult {
    pub fn code(&self) -> i32 {
        match self {
            Self::Success { .. } => 0,
            Self::Malformed => -1,
            Self::Underfunded => -2,
            Self::SrcNoTrust => -3,
            Self::SrcNotAuthorized => -4,
            Self::NoDestination => -5,
            Self::NoTrust => -6,
            Self::NotAuthorized => -7,
            Self::LineFull => -8,
            Self::NoIssuer => -9,
            Self::TooFewOffers => -10,
            Self::OverSendmax => -11,
        }
    }
}

/// What happened to the subject offer of a manage-offer operation.
#[derive(Debug, Eq, PartialEq, Clone)]
pub enum ManageOfferEffect {
    Created(OfferEntry),
    Updated(OfferEntry),
    Deleted,
}

/// Result of a manage-offer operation.
///
/// Wire discriminants: success is 0, failures run -1..-12 in declaration
/// order.
#[derive(Debug, Eq, PartialEq, Clone)]
pub enum ManageOfferResult {
    Success {
        /// Offers consumed while crossing the book.
        offers_claimed: Vec<ClaimOfferAtom>,
        effect: ManageOfferEffect,
    },
    Malformed,
    SellNoTrust,
    BuyNoTrust,
    SellNotAuthorized,
    BuyNotAuthorized,
    LineFull,
    Underfunded,
    CrossSelf,
    SellNoIssuer,
    BuyNoIssuer,
    NotFound,
    LowReserve,
}

impl ManageOfferResult {
    pub fn code(&self) -> i32 {
        match self {
            Self::Success { .. } => 0,
            Self::Malformed => -1,
            Self::SellNoTrust => -2,
            Self::BuyNoTrust => -3,
            Self::SellNotAuthorized => -4,
            Self::BuyNotAuthorized => -5,
            Self::LineFull => -6,
            Self::Underfunded => -7,
            Self::CrossSelf => -8,
            Self::SellNoIssuer => -9,
            Self::BuyNoIssuer => -10,
            Self::NotFound => -11,
            Self::LowReserve => -12,
        }
    }
}

/// Result of an allow-trust operation.
///
/// Wire discriminants: success is 0, failures run -1..-4 in declaration
/// order.
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum AllowTrustResult {
    Success,
    Malformed,
    NoTrustLine,
    TrustNotRequired,
    CantRevoke,
}

impl AllowTrustResult {
    pub fn code(&self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Malformed => -1,
            Self::NoTrustLine => -2,
            Self::TrustNotRequired => -3,
            Self::CantRevoke => -4,
        }
    }
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub enum OperationResult {
    PathPayment(PathPaymentResult),
    ManageOffer(ManageOfferResult),
    AllowTrust(AllowTrustResult),
}

impl OperationResult {
    pub fn type_tag(&self) -> u32 {
        match self {
            OperationResult::PathPayment(_) => 0,
            OperationResult::ManageOffer(_) => 1,
            OperationResult::AllowTrust(_) => 2,
        }
    }

    pub fn is_success(&self) -> bool {
        match self {
            OperationResult::PathPayment(r) => r.code() == 0,
            OperationResult::ManageOffer(r) => r.code() == 0,
            OperationResult::AllowTrust(r) => r.code() == 0,
        }
    }
}

/// The per-transaction entry of the consensus result envelope.
#[derive(Debug, Eq, PartialEq, Clone)]
pub struct TransactionResult {
    pub fee_charged: i64,
    pub code: TxResultCode,
    pub results: Vec<OperationResult>,
}

impl TransactionResult {
    pub fn new(code: TxResultCode) -> Self {
        Self {
            fee_charged: 0,
            code,
            results: vec![],
        }
    }
}
