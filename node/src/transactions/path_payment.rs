// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) LUMEN NETWORK. All rights reserved.

use sqlx::SqliteConnection;

use node_data::keys::AccountId;
use node_data::ledger::{
    is_asset_valid, PathPaymentOp, PathPaymentResult, SimplePaymentResult,
    MAX_PATH_LENGTH,
};

use crate::database::{EntryStore, StoreError};
use crate::ledger::conf::LedgerParams;
use crate::ledger::{AccountFrame, LedgerDelta, TrustFrame};

use super::exchange::{ConvertResult, OfferExchange};
use super::mark;

fn check_valid(op: &PathPaymentOp) -> Option<PathPaymentResult> {
    if op.dest_amount <= 0 || op.send_max <= 0 {
        mark("path-payment", "invalid", "malformed-amounts");
        return Some(PathPaymentResult::Malformed);
    }
    if !is_asset_valid(&op.send_asset)
        || !is_asset_valid(&op.dest_asset)
        || !op.path.iter().all(is_asset_valid)
        || op.path.len() > MAX_PATH_LENGTH
    {
        mark("path-payment", "invalid", "malformed-assets");
        return Some(PathPaymentResult::Malformed);
    }
    None
}

/// Sends `dest_amount` of the destination asset, sourcing it through the
/// order book hop by hop.
///
/// The walk runs backwards: the destination is credited first, then each
/// hop converts the next asset towards the source, and finally the
/// source is debited, provided the total stays within `send_max`.
pub(crate) async fn apply(
    source: &AccountId,
    op: &PathPaymentOp,
    store: &EntryStore,
    conn: &mut SqliteConnection,
    delta: &mut LedgerDelta,
    params: &LedgerParams,
) -> Result<PathPaymentResult, StoreError> {
    if let Some(failure) = check_valid(op) {
        return Ok(failure);
    }

    let Some(mut destination) =
        AccountFrame::load(store, conn, &op.destination).await?
    else {
        mark("path-payment", "failure", "no-destination");
        return Ok(PathPaymentResult::NoDestination);
    };

    // tracks the amount needed at the hop under consideration
    let mut cur_b_received = op.dest_amount;
    let mut cur_b = op.dest_asset.clone();

    // the full conversion chain, starting with what the source sends
    let mut full_path = vec![op.send_asset.clone()];
    full_path.extend(op.path.iter().cloned());

    // credit the destination leg
    if cur_b.is_native() {
        if !destination.add_balance(cur_b_received) {
            mark("path-payment", "failure", "line-full");
            return Ok(PathPaymentResult::LineFull);
        }
        destination.store_change(store, conn, delta).await?;
    } else {
        let Some(mut dest_line) =
            TrustFrame::load(store, conn, &op.destination, &cur_b).await?
        else {
            mark("path-payment", "failure", "no-trust");
            return Ok(PathPaymentResult::NoTrust);
        };

        if !dest_line.is_authorized() {
            mark("path-payment", "failure", "not-authorized");
            return Ok(PathPaymentResult::NotAuthorized);
        }

        if !dest_line.add_balance(cur_b_received) {
            mark("path-payment", "failure", "line-full");
            return Ok(PathPaymentResult::LineFull);
        }

        dest_line.store_change(store, conn, delta).await?;
    }

    let last = SimplePaymentResult {
        destination: op.destination,
        asset: cur_b.clone(),
        amount: cur_b_received,
    };

    // now walk the path backwards, converting through the book
    let mut offers = vec![];
    for cur_a in full_path.iter().rev() {
        if *cur_a == cur_b {
            continue;
        }

        let mut exchange = OfferExchange::new(store);
        let mut cur_a_sent = 0;
        let mut actual_b_received = 0;

        let r = exchange
            .convert_with_offers(
                conn,
                delta,
                cur_a,
                i64::MAX,
                &mut cur_a_sent,
                &cur_b,
                cur_b_received,
                &mut actual_b_received,
                None,
            )
            .await?;
        match r {
            ConvertResult::FilterStop => {
                // no filter was installed
                return Err(StoreError::InvariantViolation(
                    "offer filter stopped an unfiltered conversion".into(),
                ));
            }
            ConvertResult::Ok if actual_b_received == cur_b_received => {}
            _ => {
                mark("path-payment", "failure", "too-few-offers");
                return Ok(PathPaymentResult::TooFewOffers);
            }
        }

        // next round has to source what this hop consumed
        cur_b_received = cur_a_sent;
        cur_b = cur_a.clone();

        // prepend the hop's trail to keep the path order
        let mut trail = exchange.into_trail();
        trail.extend(offers);
        offers = trail;
    }

    // we've reached the source's side of the chain: debit it
    let cur_b_sent = cur_b_received;
    if cur_b_sent > op.send_max {
        mark("path-payment", "failure", "over-send-max");
        return Ok(PathPaymentResult::OverSendmax);
    }

    if cur_b.is_native() {
        let mut source_account = AccountFrame::load(store, conn, source)
            .await?
            .ok_or_else(|| {
                StoreError::BadState("operation source account missing".into())
            })?;

        let min_balance = source_account.min_balance(params);
        if source_account.account().balance - cur_b_sent < min_balance {
            mark("path-payment", "failure", "underfunded");
            return Ok(PathPaymentResult::Underfunded);
        }

        let debited = source_account.add_balance(-cur_b_sent);
        debug_assert!(debited);
        source_account.store_change(store, conn, delta).await?;
    } else {
        let issuer = cur_b.issuer().expect("credit asset has an issuer");
        if AccountFrame::load(store, conn, issuer).await?.is_none() {
            mark("path-payment", "failure", "no-issuer");
            return Ok(PathPaymentResult::NoIssuer);
        }

        let Some(mut source_line) =
            TrustFrame::load(store, conn, source, &cur_b).await?
        else {
            mark("path-payment", "failure", "src-no-trust");
            return Ok(PathPaymentResult::SrcNoTrust);
        };

        if !source_line.is_authorized() {
            mark("path-payment", "failure", "src-not-authorized");
            return Ok(PathPaymentResult::SrcNotAuthorized);
        }

        if !source_line.add_balance(-cur_b_sent) {
            mark("path-payment", "failure", "underfunded");
            return Ok(PathPaymentResult::Underfunded);
        }

        source_line.store_change(store, conn, delta).await?;
    }

    mark("path-payment", "success", "apply");
    Ok(PathPaymentResult::Success { offers, last })
}
