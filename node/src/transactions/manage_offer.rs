// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) LUMEN NETWORK. All rights reserved.

use sqlx::SqliteConnection;

use node_data::keys::AccountId;
use node_data::ledger::{
    is_asset_valid, ManageOfferEffect, ManageOfferOp, ManageOfferResult,
    OfferEntry,
};

use crate::database::{EntryStore, StoreError};
use crate::ledger::conf::LedgerParams;
use crate::ledger::{
    AccountFrame, LedgerDelta, OfferFrame, TrustFrame,
};

use super::exchange::{is_own_offer, FilterResult, OfferExchange};
use super::mark;

fn check_valid(op: &ManageOfferOp) -> Option<ManageOfferResult> {
    if !is_asset_valid(&op.selling)
        || !is_asset_valid(&op.buying)
        || op.selling == op.buying
    {
        mark("manage-offer", "invalid", "malformed-assets");
        return Some(ManageOfferResult::Malformed);
    }
    if op.amount < 0 || !op.price.is_valid() {
        mark("manage-offer", "invalid", "malformed-amounts");
        return Some(ManageOfferResult::Malformed);
    }
    if op.offer_id == 0 && op.amount == 0 {
        mark("manage-offer", "invalid", "malformed-no-subject");
        return Some(ManageOfferResult::Malformed);
    }
    None
}

/// Places, updates or cancels an offer, crossing it against the counter
/// book first. Whatever is not immediately matched rests on the book.
pub(crate) async fn apply(
    source: &AccountId,
    op: &ManageOfferOp,
    store: &EntryStore,
    conn: &mut SqliteConnection,
    delta: &mut LedgerDelta,
    params: &LedgerParams,
) -> Result<ManageOfferResult, StoreError> {
    if let Some(failure) = check_valid(op) {
        return Ok(failure);
    }

    let sheep = op.selling.clone();
    let wheat = op.buying.clone();

    // both legs must be held and authorized, unless native or self-issued
    let mut sheep_line = None;
    if !sheep.is_native() && sheep.issuer() != Some(source) {
        let issuer = sheep.issuer().expect("credit asset has an issuer");
        if AccountFrame::load(store, conn, issuer).await?.is_none() {
            mark("manage-offer", "failure", "sell-no-issuer");
            return Ok(ManageOfferResult::SellNoIssuer);
        }
        match TrustFrame::load(store, conn, source, &sheep).await? {
            None => {
                mark("manage-offer", "failure", "sell-no-trust");
                return Ok(ManageOfferResult::SellNoTrust);
            }
            Some(line) if !line.is_authorized() => {
                mark("manage-offer", "failure", "sell-not-authorized");
                return Ok(ManageOfferResult::SellNotAuthorized);
            }
            Some(line) => sheep_line = Some(line),
        }
    }

    let mut wheat_line = None;
    if !wheat.is_native() && wheat.issuer() != Some(source) {
        let issuer = wheat.issuer().expect("credit asset has an issuer");
        if AccountFrame::load(store, conn, issuer).await?.is_none() {
            mark("manage-offer", "failure", "buy-no-issuer");
            return Ok(ManageOfferResult::BuyNoIssuer);
        }
        match TrustFrame::load(store, conn, source, &wheat).await? {
            None => {
                mark("manage-offer", "failure", "buy-no-trust");
                return Ok(ManageOfferResult::BuyNoTrust);
            }
            Some(line) if !line.is_authorized() => {
                mark("manage-offer", "failure", "buy-not-authorized");
                return Ok(ManageOfferResult::BuyNotAuthorized);
            }
            Some(line) => wheat_line = Some(line),
        }
    }

    let mut source_account = AccountFrame::load(store, conn, source)
        .await?
        .ok_or_else(|| {
            StoreError::BadState("operation source account missing".into())
        })?;

    // resolve the subject offer
    let existing = if op.offer_id != 0 {
        match OfferFrame::load(store, conn, source, op.offer_id).await? {
            None => {
                mark("manage-offer", "failure", "not-found");
                return Ok(ManageOfferResult::NotFound);
            }
            Some(frame) => {
                // the stored asset pair is immutable for a given id
                if frame.offer().selling != sheep
                    || frame.offer().buying != wheat
                {
                    mark("manage-offer", "invalid", "malformed-pair-change");
                    return Ok(ManageOfferResult::Malformed);
                }
                Some(frame)
            }
        }
    } else {
        None
    };
    let creating = existing.is_none();

    // amount zero cancels the subject offer
    if op.amount == 0 {
        let frame = existing.expect("checked by validity");
        frame.store_delete(store, conn, delta).await?;
        let entries = &mut source_account.account_mut().num_sub_entries;
        *entries = entries.saturating_sub(1);
        source_account.store_change(store, conn, delta).await?;

        mark("manage-offer", "success", "delete");
        return Ok(ManageOfferResult::Success {
            offers_claimed: vec![],
            effect: ManageOfferEffect::Deleted,
        });
    }

    // a brand new offer needs reserve headroom for its sub-entry
    if creating {
        let needed = params
            .min_balance(source_account.account().num_sub_entries + 1);
        if source_account.account().balance < needed {
            mark("manage-offer", "failure", "low-reserve");
            return Ok(ManageOfferResult::LowReserve);
        }
    }

    // funds actually available to sell
    let available = if sheep.is_native() {
        let reserve = source_account.min_balance(params);
        (source_account.account().balance - reserve).max(0)
    } else if sheep.issuer() == Some(source) {
        i64::MAX
    } else {
        sheep_line
            .as_ref()
            .map(|line| line.trustline().balance)
            .expect("checked above")
    };
    if op.amount > available {
        mark("manage-offer", "failure", "underfunded");
        return Ok(ManageOfferResult::Underfunded);
    }

    // room to receive the counterasset
    let max_wheat = if wheat.is_native() {
        i64::MAX - source_account.account().balance
    } else if wheat.issuer() == Some(source) {
        i64::MAX
    } else {
        wheat_line
            .as_ref()
            .map(|line| line.available_limit())
            .expect("checked above")
    };
    if max_wheat == 0 {
        mark("manage-offer", "failure", "line-full");
        return Ok(ManageOfferResult::LineFull);
    }

    // cross the counter book while it beats our price
    let mut crossed_self = false;
    let price = op.price;
    let mut filter = |offer: &OfferEntry| {
        if is_own_offer(offer, source) {
            crossed_self = true;
            return FilterResult::Stop;
        }
        // stop once the counterprice exceeds the reciprocal of ours
        let lhs = offer.price.n as i128 * price.n as i128;
        let rhs = offer.price.d as i128 * price.d as i128;
        if lhs > rhs {
            return FilterResult::Stop;
        }
        FilterResult::Keep
    };

    let mut exchange = OfferExchange::new(store);
    let mut sheep_sent = 0;
    let mut wheat_received = 0;
    exchange
        .convert_with_offers(
            conn,
            delta,
            &sheep,
            op.amount,
            &mut sheep_sent,
            &wheat,
            max_wheat,
            &mut wheat_received,
            Some(&mut filter),
        )
        .await?;

    if crossed_self {
        mark("manage-offer", "failure", "cross-self");
        return Ok(ManageOfferResult::CrossSelf);
    }

    // settle what the crossing moved
    if sheep_sent > 0 {
        if sheep.is_native() {
            let debited = source_account.add_balance(-sheep_sent);
            debug_assert!(debited);
        } else if let Some(line) = sheep_line.as_mut() {
            if !line.add_balance(-sheep_sent) {
                return Err(StoreError::InvariantViolation(
                    "offer source trustline underflow".into(),
                ));
            }
            line.store_change(store, conn, delta).await?;
        }

        if wheat.is_native() {
            let credited = source_account.add_balance(wheat_received);
            debug_assert!(credited);
        } else if let Some(line) = wheat_line.as_mut() {
            if !line.add_balance(wheat_received) {
                mark("manage-offer", "failure", "line-full");
                return Ok(ManageOfferResult::LineFull);
            }
            line.store_change(store, conn, delta).await?;
        }
    }

    let offers_claimed = exchange.into_trail();
    let residual = op.amount - sheep_sent;

    let effect = if residual > 0 {
        match existing {
            Some(mut frame) => {
                frame.offer_mut().amount = residual;
                frame.offer_mut().price = price;
                frame.store_change(store, conn, delta).await?;
                ManageOfferEffect::Updated(frame.offer().clone())
            }
            None => {
                let entry = OfferEntry {
                    seller_id: *source,
                    offer_id: delta.generate_id(),
                    selling: sheep,
                    buying: wheat,
                    amount: residual,
                    price,
                    flags: 0,
                };
                let mut frame = OfferFrame::new(entry.clone());
                frame.store_add(store, conn, delta).await?;
                source_account.account_mut().num_sub_entries += 1;
                ManageOfferEffect::Created(entry)
            }
        }
    } else {
        // fully matched: nothing rests on the book
        if let Some(frame) = existing {
            frame.store_delete(store, conn, delta).await?;
            let entries = &mut source_account.account_mut().num_sub_entries;
            *entries = entries.saturating_sub(1);
        }
        ManageOfferEffect::Deleted
    };

    source_account.store_change(store, conn, delta).await?;

    mark("manage-offer", "success", "apply");
    Ok(ManageOfferResult::Success {
        offers_claimed,
        effect,
    })
}
