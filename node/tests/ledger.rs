// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) LUMEN NETWORK. All rights reserved.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use ed25519_dalek::SigningKey;
use tempfile::TempDir;

use lumen_node::database::EntryStore;
use lumen_node::floodgate::Floodgate;
use lumen_node::ledger::conf::LedgerParams;
use lumen_node::ledger::{
    AccountFrame, ConsensusValue, EntryFrame, LedgerCloseData,
    LedgerCloseOutcome, LedgerDelta, LedgerManager, LedgerUpgrade,
    OfferFrame, TrustFrame, TxSetFrame, GENESIS_LEDGER_SEQ,
};
use lumen_node::transactions::TransactionFrame;

use node_data::keys::faker::keypair_from_seed;
use node_data::keys::AccountId;
use node_data::ledger::faker::{gen_path_payment, signed_envelope};
use node_data::ledger::{
    AccountEntry, AllowTrustAsset, AllowTrustOp, AllowTrustResult, Asset,
    LedgerEntry, ManageOfferEffect, ManageOfferOp, ManageOfferResult,
    OfferEntry, Operation, OperationBody, OperationResult, PathPaymentResult,
    Price, TrustlineEntry, TxResultCode, ACCOUNT_AUTH_REQUIRED_FLAG,
    ACCOUNT_AUTH_REVOCABLE_FLAG, TRUSTLINE_AUTHORIZED_FLAG,
};
use node_data::message::Message;

struct Harness {
    _dir: TempDir,
    db_path: PathBuf,
    params: LedgerParams,
    floodgate: Arc<Floodgate>,
    manager: LedgerManager,
}

impl Harness {
    async fn new() -> Result<Self> {
        let dir = TempDir::new()?;
        let db_path = dir.path().join("ledger.sqlite3");

        // a zeroed reserve keeps scenario arithmetic in small units
        let params = LedgerParams {
            base_reserve: 0,
            ..Default::default()
        };

        let store =
            EntryStore::create_or_open(&db_path, params.entry_cache_size)
                .await?;
        let floodgate = Arc::new(Floodgate::new());
        let manager = LedgerManager::create_or_open(
            store,
            params.clone(),
            floodgate.clone(),
        )
        .await?;

        Ok(Self {
            _dir: dir,
            db_path,
            params,
            floodgate,
            manager,
        })
    }

    /// Writes entries straight into storage, outside any close.
    async fn seed(&self, entries: Vec<LedgerEntry>) -> Result<()> {
        let store = self.manager.store();
        let mut dbtx = store.begin().await?;
        let mut delta =
            LedgerDelta::new(self.manager.last_closed().clone());

        for entry in entries {
            let mut frame = EntryFrame::from_entry(entry);
            frame.store_add(store, &mut dbtx, &mut delta).await?;
        }
        dbtx.commit().await?;
        Ok(())
    }

    async fn close(
        &mut self,
        txs: Vec<TransactionFrame>,
        upgrades: Vec<LedgerUpgrade>,
        close_time: u64,
    ) -> Result<LedgerCloseOutcome> {
        let lcl = self.manager.last_closed().clone();

        let mut tx_set = TxSetFrame::new(lcl.hash);
        for tx in txs {
            tx_set.add(tx);
        }

        let value = ConsensusValue {
            tx_set_hash: tx_set.get_contents_hash(),
            close_time,
            upgrades,
        };

        Ok(self
            .manager
            .close_ledger(LedgerCloseData {
                ledger_seq: lcl.ledger_seq + 1,
                tx_set,
                value,
            })
            .await?)
    }

    fn frame(&self, env: node_data::ledger::TransactionEnvelope) -> TransactionFrame {
        TransactionFrame::new(env, &self.params.network_id())
    }

    async fn account_balance(&self, id: &AccountId) -> Result<i64> {
        let store = self.manager.store();
        let mut conn = store.acquire().await?;
        let account = AccountFrame::load(store, &mut conn, id)
            .await?
            .expect("account exists");
        Ok(account.account().balance)
    }

    async fn trustline_balance(
        &self,
        id: &AccountId,
        asset: &Asset,
    ) -> Result<i64> {
        let store = self.manager.store();
        let mut conn = store.acquire().await?;
        let line = TrustFrame::load(store, &mut conn, id, asset)
            .await?
            .expect("trustline exists");
        Ok(line.trustline().balance)
    }
}

fn test_account(seed: u8, balance: i64) -> (SigningKey, AccountEntry) {
    let (sk, id) = keypair_from_seed([seed; 32]);
    let mut entry = AccountEntry::new(id);
    entry.balance = balance;
    (sk, entry)
}

fn trustline(
    account_id: AccountId,
    asset: Asset,
    balance: i64,
    limit: i64,
) -> LedgerEntry {
    LedgerEntry::Trustline(TrustlineEntry {
        account_id,
        asset,
        balance,
        limit,
        flags: TRUSTLINE_AUTHORIZED_FLAG,
    })
}

fn op_result(outcome: &LedgerCloseOutcome, tx: usize) -> &OperationResult {
    &outcome.tx_results[tx].1.results[0]
}

#[tokio::test]
async fn close_empty_ledger_deterministically() -> Result<()> {
    let mut h = Harness::new().await?;

    assert_eq!(h.manager.last_closed().ledger_seq, GENESIS_LEDGER_SEQ);
    let genesis_hash = h.manager.last_closed().hash;

    let outcome = h.close(vec![], vec![], 10).await?;
    assert_eq!(outcome.header.ledger_seq, 2);
    assert_eq!(outcome.header.previous_ledger_hash, genesis_hash);
    assert!(outcome.tx_results.is_empty());

    let saved = outcome.header.hash;

    // reopen the same database: the tip must come back byte-identical
    drop(h.manager);
    let store =
        EntryStore::create_or_open(&h.db_path, h.params.entry_cache_size)
            .await?;
    let manager = LedgerManager::create_or_open(
        store,
        h.params.clone(),
        Arc::new(Floodgate::new()),
    )
    .await?;

    assert_eq!(manager.last_closed().hash, saved);
    assert_eq!(manager.last_closed().ledger_seq, 2);
    Ok(())
}

#[tokio::test]
async fn base_fee_upgrade_applies_at_close() -> Result<()> {
    let mut h = Harness::new().await?;
    assert_eq!(h.manager.last_closed().base_fee, 10);

    let outcome = h
        .close(vec![], vec![LedgerUpgrade::BaseFee(100)], 20)
        .await?;

    assert_eq!(outcome.header.base_fee, 100);
    assert_eq!(h.manager.last_closed().base_fee, 100);
    Ok(())
}

#[tokio::test]
async fn allow_trust_flows() -> Result<()> {
    let mut h = Harness::new().await?;

    // issuer I does not require authorization; issuer J does
    let (issuer_sk, issuer) = test_account(1, 1_000);
    let (strict_sk, mut strict) = test_account(2, 1_000);
    strict.flags = ACCOUNT_AUTH_REQUIRED_FLAG | ACCOUNT_AUTH_REVOCABLE_FLAG;
    let (_, trustor) = test_account(3, 1_000);

    let lax_usd = Asset::alphanum4("USD", issuer.account_id)?;
    let strict_usd = Asset::alphanum4("USD", strict.account_id)?;

    h.seed(vec![
        LedgerEntry::Account(issuer.clone()),
        LedgerEntry::Account(strict.clone()),
        LedgerEntry::Account(trustor.clone()),
        trustline(trustor.account_id, lax_usd.clone(), 0, 10_000),
        // strict issuer's line starts out unauthorized
        LedgerEntry::Trustline(TrustlineEntry {
            account_id: trustor.account_id,
            asset: strict_usd.clone(),
            balance: 0,
            limit: 10_000,
            flags: 0,
        }),
    ])
    .await?;

    let allow = |trustor_id| Operation {
        source: None,
        body: OperationBody::AllowTrust(AllowTrustOp {
            trustor: trustor_id,
            asset: AllowTrustAsset::Code4(*b"USD\0"),
            authorize: true,
        }),
    };

    let network_id = h.params.network_id();
    let not_required = h.frame(signed_envelope(
        &issuer_sk,
        &network_id,
        1,
        10,
        vec![allow(trustor.account_id)],
    ));
    let granted = h.frame(signed_envelope(
        &strict_sk,
        &network_id,
        1,
        10,
        vec![allow(trustor.account_id)],
    ));

    let outcome = h.close(vec![not_required, granted], vec![], 30).await?;
    assert_eq!(outcome.tx_results.len(), 2);

    for (_, result) in &outcome.tx_results {
        let code = match &result.results[0] {
            OperationResult::AllowTrust(r) => r,
            other => panic!("unexpected result {other:?}"),
        };
        match code {
            AllowTrustResult::TrustNotRequired => {
                assert_eq!(result.code, TxResultCode::Failed)
            }
            AllowTrustResult::Success => {
                assert_eq!(result.code, TxResultCode::Success)
            }
            other => panic!("unexpected allow trust code {other:?}"),
        }
    }

    // the strict issuer's trustline is now authorized
    let store = h.manager.store();
    let mut conn = store.acquire().await?;
    let line =
        TrustFrame::load(store, &mut conn, &trustor.account_id, &strict_usd)
            .await?
            .expect("trustline exists");
    assert!(line.is_authorized());

    // the lax issuer's line is untouched
    let line =
        TrustFrame::load(store, &mut conn, &trustor.account_id, &lax_usd)
            .await?
            .expect("trustline exists");
    assert!(line.is_authorized());

    Ok(())
}

#[tokio::test]
async fn path_payment_without_offers_fails() -> Result<()> {
    let mut h = Harness::new().await?;

    let (source_sk, source) = test_account(10, 1_000);
    let (_, issuer) = test_account(11, 1_000);
    let (_, destination) = test_account(12, 100);
    let usd = Asset::alphanum4("USD", issuer.account_id)?;

    h.seed(vec![
        LedgerEntry::Account(source.clone()),
        LedgerEntry::Account(issuer.clone()),
        LedgerEntry::Account(destination.clone()),
        trustline(destination.account_id, usd.clone(), 0, 10_000),
    ])
    .await?;

    let op = gen_path_payment(
        destination.account_id,
        Asset::Native,
        250,
        usd.clone(),
        50,
    );
    let tx = h.frame(signed_envelope(
        &source_sk,
        &h.params.network_id(),
        1,
        10,
        vec![op],
    ));

    let outcome = h.close(vec![tx], vec![], 40).await?;

    assert_eq!(outcome.tx_results[0].1.code, TxResultCode::Failed);
    assert_eq!(
        *op_result(&outcome, 0),
        OperationResult::PathPayment(PathPaymentResult::TooFewOffers)
    );

    // the op rolled back, the fee did not
    assert_eq!(h.account_balance(&source.account_id).await?, 1_000 - 10);
    assert_eq!(
        h.trustline_balance(&destination.account_id, &usd).await?,
        0
    );
    Ok(())
}

#[tokio::test]
async fn path_payment_crosses_an_offer() -> Result<()> {
    let mut h = Harness::new().await?;

    let (source_sk, source) = test_account(10, 1_000);
    let (_, issuer) = test_account(11, 1_000);
    let (_, destination) = test_account(12, 100);
    let (_, maker) = test_account(13, 500);
    let usd = Asset::alphanum4("USD", issuer.account_id)?;

    h.seed(vec![
        LedgerEntry::Account(source.clone()),
        LedgerEntry::Account(issuer.clone()),
        LedgerEntry::Account(destination.clone()),
        LedgerEntry::Account(maker.clone()),
        trustline(destination.account_id, usd.clone(), 0, 10_000),
        trustline(maker.account_id, usd.clone(), 100, 10_000),
        // maker sells 100 USD at 5 native per USD
        LedgerEntry::Offer(OfferEntry {
            seller_id: maker.account_id,
            offer_id: 42,
            selling: usd.clone(),
            buying: Asset::Native,
            amount: 100,
            price: Price::new(5, 1),
            flags: 0,
        }),
    ])
    .await?;

    let op = gen_path_payment(
        destination.account_id,
        Asset::Native,
        250,
        usd.clone(),
        50,
    );
    let tx = h.frame(signed_envelope(
        &source_sk,
        &h.params.network_id(),
        1,
        10,
        vec![op],
    ));

    let outcome = h.close(vec![tx], vec![], 50).await?;

    assert_eq!(outcome.tx_results[0].1.code, TxResultCode::Success);
    match op_result(&outcome, 0) {
        OperationResult::PathPayment(PathPaymentResult::Success {
            offers,
            last,
        }) => {
            assert_eq!(offers.len(), 1);
            assert_eq!(offers[0].offer_id, 42);
            assert_eq!(offers[0].amount_claimed, 50);
            assert_eq!(offers[0].amount_sent, 250);
            assert_eq!(last.amount, 50);
            assert_eq!(last.destination, destination.account_id);
        }
        other => panic!("unexpected result {other:?}"),
    }

    // source: 1000 - 10 fee - 250 paid through the book
    assert_eq!(h.account_balance(&source.account_id).await?, 740);
    assert_eq!(
        h.trustline_balance(&destination.account_id, &usd).await?,
        50
    );
    // maker sold 50 USD for 250 native; half the offer remains
    assert_eq!(h.account_balance(&maker.account_id).await?, 750);
    assert_eq!(h.trustline_balance(&maker.account_id, &usd).await?, 50);

    let store = h.manager.store();
    let mut conn = store.acquire().await?;
    let offer = OfferFrame::load(store, &mut conn, &maker.account_id, 42)
        .await?
        .expect("offer remains on the book");
    assert_eq!(offer.offer().amount, 50);
    Ok(())
}

#[tokio::test]
async fn exhausted_book_rolls_the_payment_back() -> Result<()> {
    let mut h = Harness::new().await?;

    let (source_sk, source) = test_account(10, 1_000);
    let (_, issuer) = test_account(11, 1_000);
    let (_, destination) = test_account(12, 100);
    let (_, maker) = test_account(13, 500);
    let usd = Asset::alphanum4("USD", issuer.account_id)?;

    h.seed(vec![
        LedgerEntry::Account(source.clone()),
        LedgerEntry::Account(issuer.clone()),
        LedgerEntry::Account(destination.clone()),
        LedgerEntry::Account(maker.clone()),
        trustline(destination.account_id, usd.clone(), 0, 10_000),
        trustline(maker.account_id, usd.clone(), 100, 10_000),
        // only 40 USD on the book; the payment wants 50
        LedgerEntry::Offer(OfferEntry {
            seller_id: maker.account_id,
            offer_id: 42,
            selling: usd.clone(),
            buying: Asset::Native,
            amount: 40,
            price: Price::new(5, 1),
            flags: 0,
        }),
    ])
    .await?;

    let op = gen_path_payment(
        destination.account_id,
        Asset::Native,
        250,
        usd.clone(),
        50,
    );
    let tx = h.frame(signed_envelope(
        &source_sk,
        &h.params.network_id(),
        1,
        10,
        vec![op],
    ));

    let outcome = h.close(vec![tx], vec![], 60).await?;

    assert_eq!(
        *op_result(&outcome, 0),
        OperationResult::PathPayment(PathPaymentResult::TooFewOffers)
    );

    // the partial cross was rolled back with the rest of the op
    assert_eq!(h.account_balance(&source.account_id).await?, 990);
    assert_eq!(h.account_balance(&maker.account_id).await?, 500);
    assert_eq!(h.trustline_balance(&maker.account_id, &usd).await?, 100);
    assert_eq!(
        h.trustline_balance(&destination.account_id, &usd).await?,
        0
    );

    let store = h.manager.store();
    let mut conn = store.acquire().await?;
    let offer = OfferFrame::load(store, &mut conn, &maker.account_id, 42)
        .await?
        .expect("offer untouched");
    assert_eq!(offer.offer().amount, 40);
    Ok(())
}

#[tokio::test]
async fn path_payment_rounds_against_the_taker() -> Result<()> {
    let mut h = Harness::new().await?;

    let (source_sk, source) = test_account(10, 1_000);
    let (_, issuer) = test_account(11, 1_000);
    let (_, destination) = test_account(12, 100);
    let (_, maker) = test_account(13, 500);
    let usd = Asset::alphanum4("USD", issuer.account_id)?;

    h.seed(vec![
        LedgerEntry::Account(source.clone()),
        LedgerEntry::Account(issuer.clone()),
        LedgerEntry::Account(destination.clone()),
        LedgerEntry::Account(maker.clone()),
        trustline(destination.account_id, usd.clone(), 0, 10_000),
        trustline(maker.account_id, usd.clone(), 100, 10_000),
        // 3 native per 7 USD: 50 USD never divides evenly
        LedgerEntry::Offer(OfferEntry {
            seller_id: maker.account_id,
            offer_id: 42,
            selling: usd.clone(),
            buying: Asset::Native,
            amount: 100,
            price: Price::new(3, 7),
            flags: 0,
        }),
    ])
    .await?;

    let op = gen_path_payment(
        destination.account_id,
        Asset::Native,
        100,
        usd.clone(),
        50,
    );
    let tx = h.frame(signed_envelope(
        &source_sk,
        &h.params.network_id(),
        1,
        10,
        vec![op],
    ));

    let outcome = h.close(vec![tx], vec![], 55).await?;

    // 50 * 3/7 = 21.43..; what the taker pays rounds up to 22
    match op_result(&outcome, 0) {
        OperationResult::PathPayment(PathPaymentResult::Success {
            offers,
            ..
        }) => {
            assert_eq!(offers.len(), 1);
            assert_eq!(offers[0].amount_claimed, 50);
            assert_eq!(offers[0].amount_sent, 22);
            // never in the taker's favor
            assert!(
                offers[0].amount_sent * 7 >= offers[0].amount_claimed * 3
            );
        }
        other => panic!("unexpected result {other:?}"),
    }

    assert_eq!(h.account_balance(&source.account_id).await?, 1_000 - 10 - 22);
    assert_eq!(h.account_balance(&maker.account_id).await?, 522);
    assert_eq!(
        h.trustline_balance(&destination.account_id, &usd).await?,
        50
    );
    assert_eq!(h.trustline_balance(&maker.account_id, &usd).await?, 50);
    Ok(())
}

#[tokio::test]
async fn manage_offer_clamps_to_the_send_budget() -> Result<()> {
    let mut h = Harness::new().await?;

    let (trader_sk, trader) = test_account(20, 1_000);
    let (_, issuer) = test_account(21, 1_000);
    let (_, maker) = test_account(22, 500);
    let usd = Asset::alphanum4("USD", issuer.account_id)?;

    h.seed(vec![
        LedgerEntry::Account(trader.clone()),
        LedgerEntry::Account(issuer.clone()),
        LedgerEntry::Account(maker.clone()),
        trustline(trader.account_id, usd.clone(), 0, 10_000),
        trustline(maker.account_id, usd.clone(), 100, 10_000),
        // 100 USD resting at 3 native per 7 USD
        LedgerEntry::Offer(OfferEntry {
            seller_id: maker.account_id,
            offer_id: 42,
            selling: usd.clone(),
            buying: Asset::Native,
            amount: 100,
            price: Price::new(3, 7),
            flags: 0,
        }),
    ])
    .await?;

    // the trader only offers 10 native: taking the whole resting offer
    // would cost ceil(100 * 3/7) = 43, so the send budget clamps the
    // cross down to floor(10 * 7/3) = 23 USD
    let buy = Operation {
        source: None,
        body: OperationBody::ManageOffer(ManageOfferOp {
            selling: Asset::Native,
            buying: usd.clone(),
            amount: 10,
            price: Price::new(1, 1),
            offer_id: 0,
        }),
    };
    let tx = h.frame(signed_envelope(
        &trader_sk,
        &h.params.network_id(),
        1,
        10,
        vec![buy],
    ));
    let outcome = h.close(vec![tx], vec![], 65).await?;

    match op_result(&outcome, 0) {
        OperationResult::ManageOffer(ManageOfferResult::Success {
            offers_claimed,
            effect: ManageOfferEffect::Deleted,
        }) => {
            assert_eq!(offers_claimed.len(), 1);
            assert_eq!(offers_claimed[0].offer_id, 42);
            assert_eq!(offers_claimed[0].amount_claimed, 23);
            assert_eq!(offers_claimed[0].amount_sent, 10);
            // the clamp keeps rounding on the maker's side
            assert!(
                offers_claimed[0].amount_sent * 7
                    >= offers_claimed[0].amount_claimed * 3
            );
        }
        other => panic!("unexpected result {other:?}"),
    }

    // the whole budget went through the book; nothing rests
    assert_eq!(h.account_balance(&trader.account_id).await?, 1_000 - 10 - 10);
    assert_eq!(h.trustline_balance(&trader.account_id, &usd).await?, 23);
    assert_eq!(h.account_balance(&maker.account_id).await?, 510);
    assert_eq!(h.trustline_balance(&maker.account_id, &usd).await?, 77);

    let store = h.manager.store();
    let mut conn = store.acquire().await?;
    let offer = OfferFrame::load(store, &mut conn, &maker.account_id, 42)
        .await?
        .expect("offer remains on the book");
    assert_eq!(offer.offer().amount, 77);
    Ok(())
}

#[tokio::test]
async fn manage_offer_creates_and_cancels() -> Result<()> {
    let mut h = Harness::new().await?;

    let (maker_sk, maker) = test_account(20, 1_000);
    let (_, issuer) = test_account(21, 1_000);
    let usd = Asset::alphanum4("USD", issuer.account_id)?;

    h.seed(vec![
        LedgerEntry::Account(maker.clone()),
        LedgerEntry::Account(issuer.clone()),
        trustline(maker.account_id, usd.clone(), 100, 10_000),
    ])
    .await?;

    let place = Operation {
        source: None,
        body: OperationBody::ManageOffer(ManageOfferOp {
            selling: usd.clone(),
            buying: Asset::Native,
            amount: 100,
            price: Price::new(5, 1),
            offer_id: 0,
        }),
    };
    let tx = h.frame(signed_envelope(
        &maker_sk,
        &h.params.network_id(),
        1,
        10,
        vec![place],
    ));
    let outcome = h.close(vec![tx], vec![], 70).await?;

    let offer_id = match op_result(&outcome, 0) {
        OperationResult::ManageOffer(ManageOfferResult::Success {
            offers_claimed,
            effect: ManageOfferEffect::Created(offer),
        }) => {
            assert!(offers_claimed.is_empty());
            assert_eq!(offer.amount, 100);
            offer.offer_id
        }
        other => panic!("unexpected result {other:?}"),
    };

    // the id came out of the header id pool
    assert_eq!(offer_id, 1);
    assert_eq!(h.manager.last_closed().id_pool, 1);

    {
        let store = h.manager.store();
        let mut conn = store.acquire().await?;
        let book = store
            .best_offers(&mut conn, &usd, &Asset::Native, 10, 0)
            .await?;
        assert_eq!(book.len(), 1);
        assert_eq!(book[0].offer_id, offer_id);

        let account =
            AccountFrame::load(store, &mut conn, &maker.account_id)
                .await?
                .expect("maker exists");
        assert_eq!(account.account().num_sub_entries, 1);
    }

    // cancel it
    let cancel = Operation {
        source: None,
        body: OperationBody::ManageOffer(ManageOfferOp {
            selling: usd.clone(),
            buying: Asset::Native,
            amount: 0,
            price: Price::new(5, 1),
            offer_id,
        }),
    };
    let tx = h.frame(signed_envelope(
        &maker_sk,
        &h.params.network_id(),
        2,
        10,
        vec![cancel],
    ));
    let outcome = h.close(vec![tx], vec![], 80).await?;

    match op_result(&outcome, 0) {
        OperationResult::ManageOffer(ManageOfferResult::Success {
            effect: ManageOfferEffect::Deleted,
            ..
        }) => {}
        other => panic!("unexpected result {other:?}"),
    }

    let store = h.manager.store();
    let mut conn = store.acquire().await?;
    let book = store
        .best_offers(&mut conn, &usd, &Asset::Native, 10, 0)
        .await?;
    assert!(book.is_empty());

    let account = AccountFrame::load(store, &mut conn, &maker.account_id)
        .await?
        .expect("maker exists");
    assert_eq!(account.account().num_sub_entries, 0);
    Ok(())
}

#[tokio::test]
async fn floodgate_purges_on_close() -> Result<()> {
    let mut h = Harness::new().await?;

    let old = Message::ConsensusValue {
        ledger_seq: 1,
        value: vec![1],
    };
    let current = Message::ConsensusValue {
        ledger_seq: 2,
        value: vec![2],
    };
    assert!(h.floodgate.add_record(&old, None, 1));
    assert!(h.floodgate.add_record(&current, None, 2));
    assert_eq!(h.floodgate.len(), 2);

    // closing ledger 2 purges records below it
    h.close(vec![], vec![], 90).await?;
    assert_eq!(h.floodgate.len(), 1);
    Ok(())
}

#[tokio::test]
async fn invalid_transactions_are_trimmed() -> Result<()> {
    let mut h = Harness::new().await?;

    let (source_sk, source) = test_account(30, 1_000);
    h.seed(vec![LedgerEntry::Account(source.clone())]).await?;

    let op = || {
        gen_path_payment(
            source.account_id,
            Asset::Native,
            10,
            Asset::Native,
            10,
        )
    };

    let network_id = h.params.network_id();
    // wrong sequence number: the account is at 0, this claims 5
    let bad_seq =
        h.frame(signed_envelope(&source_sk, &network_id, 5, 10, vec![op()]));
    // fee below the floor
    let bad_fee =
        h.frame(signed_envelope(&source_sk, &network_id, 1, 1, vec![op()]));
    // signed over a different network
    let bad_sig =
        h.frame(signed_envelope(&source_sk, &[9; 32], 1, 10, vec![op()]));

    let outcome = h.close(vec![bad_seq, bad_fee, bad_sig], vec![], 95).await?;

    // everything was trimmed before apply
    assert!(outcome.tx_results.is_empty());
    assert_eq!(h.account_balance(&source.account_id).await?, 1_000);
    Ok(())
}
