// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) LUMEN NETWORK. All rights reserved.

use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;

use lumen_node::database::EntryStore;
use lumen_node::ledger::{EntryFrame, LedgerDelta, OfferFrame, TrustFrame};

use node_data::keys::faker::gen_account_id;
use node_data::keys::AccountId;
use node_data::ledger::{
    AccountEntry, Asset, LedgerEntry, LedgerKey, OfferEntry, Price,
    TrustlineEntry, TRUSTLINE_AUTHORIZED_FLAG,
};

async fn open_store(dir: &TempDir) -> Result<EntryStore> {
    Ok(EntryStore::create_or_open(dir.path().join("store.sqlite3"), 128)
        .await?)
}

fn sample_entries(rng: &mut StdRng) -> (AccountEntry, TrustlineEntry, OfferEntry) {
    let issuer = gen_account_id(rng);
    let holder = gen_account_id(rng);
    let usd = Asset::alphanum4("USD", issuer).expect("valid code");

    let mut account = AccountEntry::new(holder);
    account.balance = 5_000;
    account.seq_num = 7;
    account.thresholds = [1, 0, 10, 100];

    let line = TrustlineEntry {
        account_id: holder,
        asset: usd.clone(),
        balance: 250,
        limit: 10_000,
        flags: TRUSTLINE_AUTHORIZED_FLAG,
    };

    let offer = OfferEntry {
        seller_id: holder,
        offer_id: 9,
        selling: usd,
        buying: Asset::Native,
        amount: 100,
        price: Price::new(5, 1),
        flags: 0,
    };

    (account, line, offer)
}

#[tokio::test]
async fn stored_entries_load_back_identically() -> Result<()> {
    let dir = TempDir::new()?;
    let store = open_store(&dir).await?;
    let mut rng = StdRng::seed_from_u64(7);

    let (account, line, offer) = sample_entries(&mut rng);
    let entries = [
        LedgerEntry::Account(account),
        LedgerEntry::Trustline(line),
        LedgerEntry::Offer(offer),
    ];

    let mut dbtx = store.begin().await?;
    let mut delta = LedgerDelta::new(Default::default());
    for entry in &entries {
        let mut frame = EntryFrame::from_entry(entry.clone());
        frame.store_add(&store, &mut dbtx, &mut delta).await?;
    }
    dbtx.commit().await?;

    assert_eq!(delta.added().len(), 3);

    let mut conn = store.acquire().await?;
    for entry in &entries {
        let key = entry.key();
        assert!(store.exists(&mut conn, &key).await?);

        let loaded = EntryFrame::store_load(&store, &mut conn, &key)
            .await?
            .expect("entry exists");
        assert_eq!(loaded.entry(), *entry);

        // the consistency check agrees with the live copy
        store.check_against_database(&mut conn, entry).await?;
    }

    // cache snapshots were populated by the loads
    assert!(!store.cache().is_empty());
    Ok(())
}

#[tokio::test]
async fn exists_never_answers_from_cache() -> Result<()> {
    let dir = TempDir::new()?;
    let store = open_store(&dir).await?;

    let entry = LedgerEntry::Account(AccountEntry::new(AccountId::default()));
    let key = entry.key();

    // a cached snapshot without a row behind it must not fake existence
    store.cache().put(&key, entry);

    let mut conn = store.acquire().await?;
    assert!(!store.exists(&mut conn, &key).await?);
    Ok(())
}

#[tokio::test]
async fn change_and_delete_flush_the_cache() -> Result<()> {
    let dir = TempDir::new()?;
    let store = open_store(&dir).await?;
    let mut rng = StdRng::seed_from_u64(8);

    let (_, line, offer) = sample_entries(&mut rng);

    let mut dbtx = store.begin().await?;
    let mut delta = LedgerDelta::new(Default::default());

    let mut line_frame = TrustFrame::new(line.clone());
    line_frame.store_add(&store, &mut dbtx, &mut delta).await?;
    let mut offer_frame = OfferFrame::new(offer.clone());
    offer_frame.store_add(&store, &mut dbtx, &mut delta).await?;
    dbtx.commit().await?;

    // populate the cache, then write through the same keys; the pool
    // holds a single connection, so the read scope must end first
    let mut loaded = {
        let mut conn = store.acquire().await?;
        TrustFrame::load(&store, &mut conn, &line.account_id, &line.asset)
            .await?
            .expect("trustline exists")
    };
    assert!(loaded.add_balance(100));

    let mut dbtx = store.begin().await?;
    loaded.store_change(&store, &mut dbtx, &mut delta).await?;
    OfferFrame::load(&store, &mut dbtx, &offer.seller_id, offer.offer_id)
        .await?
        .expect("offer exists")
        .store_delete(&store, &mut dbtx, &mut delta)
        .await?;
    dbtx.commit().await?;

    let mut conn = store.acquire().await?;
    let reloaded =
        TrustFrame::load(&store, &mut conn, &line.account_id, &line.asset)
            .await?
            .expect("trustline exists");
    assert_eq!(reloaded.trustline().balance, 350);

    let gone = OfferFrame::load(
        &store,
        &mut conn,
        &offer.seller_id,
        offer.offer_id,
    )
    .await?;
    assert!(gone.is_none());
    assert!(!store
        .exists(
            &mut conn,
            &LedgerKey::Offer {
                seller_id: offer.seller_id,
                offer_id: offer.offer_id,
            },
        )
        .await?);
    Ok(())
}

#[tokio::test]
async fn best_offers_order_by_price_then_id() -> Result<()> {
    let dir = TempDir::new()?;
    let store = open_store(&dir).await?;
    let mut rng = StdRng::seed_from_u64(9);

    let issuer = gen_account_id(&mut rng);
    let seller = gen_account_id(&mut rng);
    let usd = Asset::alphanum4("USD", issuer).expect("valid code");

    // same rational price in different terms plus a better and worse one
    let offers = [
        (1u64, Price::new(10, 2)),
        (2, Price::new(5, 1)),
        (3, Price::new(3, 1)),
        (4, Price::new(7, 1)),
    ];

    let mut dbtx = store.begin().await?;
    let mut delta = LedgerDelta::new(Default::default());
    for (offer_id, price) in offers {
        let mut frame = OfferFrame::new(OfferEntry {
            seller_id: seller,
            offer_id,
            selling: usd.clone(),
            buying: Asset::Native,
            amount: 10,
            price,
            flags: 0,
        });
        frame.store_add(&store, &mut dbtx, &mut delta).await?;
    }
    dbtx.commit().await?;

    let mut conn = store.acquire().await?;
    let book = store
        .best_offers(&mut conn, &usd, &Asset::Native, 10, 0)
        .await?;

    let ids: Vec<u64> = book.iter().map(|o| o.offer_id).collect();
    // price ascending; the two 5/1-equivalent offers tie-break by id
    assert_eq!(ids, vec![3, 1, 2, 4]);

    // paging walks the same order
    let page = store
        .best_offers(&mut conn, &usd, &Asset::Native, 2, 1)
        .await?;
    let ids: Vec<u64> = page.iter().map(|o| o.offer_id).collect();
    assert_eq!(ids, vec![1, 2]);
    Ok(())
}
