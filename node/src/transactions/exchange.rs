// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) LUMEN NETWORK. All rights reserved.

use sqlx::SqliteConnection;

use node_data::keys::AccountId;
use node_data::ledger::{Asset, ClaimOfferAtom, OfferEntry};

use crate::database::{EntryStore, StoreError};
use crate::ledger::{AccountFrame, LedgerDelta, OfferFrame, TrustFrame};
use crate::utils::{big_divide, Rounding};

/// Outcome of a conversion walk.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ConvertResult {
    /// The wanted amount was fully sourced.
    Ok,
    /// The book or the send budget ran out first.
    Partial,
    /// The caller's filter stopped the walk.
    FilterStop,
}

/// Verdict of the optional per-offer filter.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FilterResult {
    Keep,
    Stop,
}

enum CrossOutcome {
    /// The offer could not be honored and was removed from the book.
    Skipped,
    /// The send budget clamps the cross to nothing.
    Exhausted,
    /// The filter stopped the walk before the cross.
    Stopped,
    Crossed { took: i64, paid: i64 },
}

/// Order-book walker: crosses stored offers in `(price, offerid)` order,
/// accumulating a trade trail.
///
/// All arithmetic runs through 128-bit intermediates, rounding what the
/// taker pays up and what the taker receives down. Both roundings favor
/// the maker; the direction is consensus-critical.
pub struct OfferExchange<'a> {
    store: &'a EntryStore,
    trail: Vec<ClaimOfferAtom>,
}

impl<'a> OfferExchange<'a> {
    pub fn new(store: &'a EntryStore) -> Self {
        Self {
            store,
            trail: vec![],
        }
    }

    /// Offers taken so far, in crossing order.
    pub fn trail(&self) -> &[ClaimOfferAtom] {
        &self.trail
    }

    pub fn into_trail(self) -> Vec<ClaimOfferAtom> {
        self.trail
    }

    /// Converts up to `max_send` of `send_asset` into `want_recv` of
    /// `recv_asset` by walking the offers selling `recv_asset`.
    ///
    /// `sent` and `received` accumulate what actually moved, which on a
    /// `Partial` return is less than asked.
    #[allow(clippy::too_many_arguments)]
    pub async fn convert_with_offers(
        &mut self,
        conn: &mut SqliteConnection,
        delta: &mut LedgerDelta,
        send_asset: &Asset,
        max_send: i64,
        sent: &mut i64,
        recv_asset: &Asset,
        want_recv: i64,
        received: &mut i64,
        mut filter: Option<&mut dyn FnMut(&OfferEntry) -> FilterResult>,
    ) -> Result<ConvertResult, StoreError> {
        *sent = 0;
        *received = 0;

        loop {
            // The book only shrinks while we walk it: a crossed offer is
            // either deleted or the walk ends, so the best offer is always
            // at offset zero.
            let mut batch = self
                .store
                .best_offers(conn, recv_asset, send_asset, 1, 0)
                .await?;
            let Some(offer) = batch.pop() else {
                return Ok(ConvertResult::Partial);
            };

            let outcome = self
                .cross_offer(
                    conn,
                    delta,
                    offer,
                    want_recv - *received,
                    max_send - *sent,
                    &mut filter,
                )
                .await?;

            match outcome {
                CrossOutcome::Skipped => continue,
                CrossOutcome::Exhausted => return Ok(ConvertResult::Partial),
                CrossOutcome::Stopped => return Ok(ConvertResult::FilterStop),
                CrossOutcome::Crossed { took, paid } => {
                    *received += took;
                    *sent += paid;
                    if *received == want_recv {
                        return Ok(ConvertResult::Ok);
                    }
                }
            }
        }
    }

    /// Crosses one offer selling `recv_asset` for `send_asset`.
    ///
    /// `max_take` / `max_pay` are the remaining receive and send budgets.
    async fn cross_offer(
        &mut self,
        conn: &mut SqliteConnection,
        delta: &mut LedgerDelta,
        offer: OfferEntry,
        max_take: i64,
        max_pay: i64,
        filter: &mut Option<&mut dyn FnMut(&OfferEntry) -> FilterResult>,
    ) -> Result<CrossOutcome, StoreError> {
        let seller_id = offer.seller_id;
        let wheat = offer.selling.clone();
        let sheep = offer.buying.clone();

        let mut seller_account =
            AccountFrame::load(self.store, conn, &seller_id)
                .await?
                .ok_or_else(|| {
                    StoreError::BadState(format!(
                        "offer {} has no seller account",
                        offer.offer_id
                    ))
                })?;

        // How much of its selling asset the seller can actually cover.
        let seller_is_wheat_issuer = wheat.issuer() == Some(&seller_id);
        let mut wheat_line = None;
        let available = if seller_is_wheat_issuer {
            i64::MAX
        } else if wheat.is_native() {
            seller_account.account().balance
        } else {
            match TrustFrame::load(self.store, conn, &seller_id, &wheat)
                .await?
            {
                Some(line) if line.is_authorized() => {
                    let balance = line.trustline().balance;
                    wheat_line = Some(line);
                    balance
                }
                // an unbacked or unauthorized leg: the offer is a husk
                _ => 0,
            }
        };

        if available <= 0 {
            self.drop_offer(conn, delta, offer).await?;
            return Ok(CrossOutcome::Skipped);
        }

        // Maximum cross, clamped by the send budget. The taker pays
        // rounded up; a clamped taker receives rounded down.
        let mut take = offer.amount.min(available).min(max_take);
        let n = offer.price.n as i64;
        let d = offer.price.d as i64;
        let pay = match big_divide(take, n, d, Rounding::Up) {
            Some(pay) if pay <= max_pay => pay,
            // the send budget binds (an unrepresentable payment always
            // does); recompute what that much actually buys
            _ => {
                take = big_divide(max_pay, d, n, Rounding::Down)
                    .ok_or_else(|| {
                        StoreError::InvariantViolation(
                            "clamped offer cross out of range".into(),
                        )
                    })?;
                max_pay
            }
        };

        if take == 0 {
            return Ok(CrossOutcome::Exhausted);
        }

        if let Some(filter) = filter.as_deref_mut() {
            if filter(&offer) == FilterResult::Stop {
                return Ok(CrossOutcome::Stopped);
            }
        }

        // The seller must be able to accept what the taker pays; if not,
        // the offer can no longer be honored and leaves the book.
        let seller_is_sheep_issuer = sheep.issuer() == Some(&seller_id);
        let mut sheep_line = None;
        if !seller_is_sheep_issuer {
            if sheep.is_native() {
                if seller_account.account().balance.checked_add(pay).is_none()
                {
                    self.drop_offer(conn, delta, offer).await?;
                    return Ok(CrossOutcome::Skipped);
                }
            } else {
                match TrustFrame::load(self.store, conn, &seller_id, &sheep)
                    .await?
                {
                    Some(mut line) if line.is_authorized() => {
                        if line.add_balance(pay) {
                            sheep_line = Some(line);
                        } else {
                            self.drop_offer(conn, delta, offer).await?;
                            return Ok(CrossOutcome::Skipped);
                        }
                    }
                    _ => {
                        self.drop_offer(conn, delta, offer).await?;
                        return Ok(CrossOutcome::Skipped);
                    }
                }
            }
        }

        // Commit the cross: shrink or delete the offer, debit the
        // seller's wheat, credit the seller's sheep.
        let crossed_offer_id = offer.offer_id;
        let mut offer_frame = OfferFrame::from_book(offer);
        offer_frame.offer_mut().amount -= take;
        if offer_frame.offer().amount == 0 {
            offer_frame
                .store_delete(self.store, conn, delta)
                .await?;
        } else {
            offer_frame.store_change(self.store, conn, delta).await?;
        }

        if !seller_is_wheat_issuer {
            if wheat.is_native() {
                if !seller_account.add_balance(-take) {
                    return Err(StoreError::InvariantViolation(
                        "seller balance underflow while crossing".into(),
                    ));
                }
            } else {
                let line = wheat_line.as_mut().expect("loaded above");
                if !line.add_balance(-take) {
                    return Err(StoreError::InvariantViolation(
                        "seller trustline underflow while crossing".into(),
                    ));
                }
            }
        }

        if !seller_is_sheep_issuer && sheep.is_native() {
            // capacity verified before any mutation
            let credited = seller_account.add_balance(pay);
            debug_assert!(credited);
        }

        if let Some(mut line) = wheat_line {
            line.store_change(self.store, conn, delta).await?;
        }
        if let Some(mut line) = sheep_line {
            line.store_change(self.store, conn, delta).await?;
        }
        if wheat.is_native() || sheep.is_native() {
            seller_account.store_change(self.store, conn, delta).await?;
        }

        self.trail.push(ClaimOfferAtom {
            seller_id,
            offer_id: crossed_offer_id,
            asset_claimed: wheat,
            amount_claimed: take,
            asset_sent: sheep,
            amount_sent: pay,
        });

        Ok(CrossOutcome::Crossed { took: take, paid: pay })
    }

    /// Removes an offer its owner can no longer honor.
    async fn drop_offer(
        &self,
        conn: &mut SqliteConnection,
        delta: &mut LedgerDelta,
        offer: OfferEntry,
    ) -> Result<(), StoreError> {
        tracing::debug!(
            event = "dropping unfundable offer",
            offer_id = offer.offer_id,
            seller = %offer.seller_id,
        );
        OfferFrame::from_book(offer)
            .store_delete(self.store, conn, delta)
            .await
    }

}

/// Self-trade guard helper shared by the offer applier: true when the
/// resting offer belongs to the crossing account.
pub fn is_own_offer(offer: &OfferEntry, account: &AccountId) -> bool {
    offer.seller_id == *account
}
