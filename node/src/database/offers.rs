// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) LUMEN NETWORK. All rights reserved.

use sqlx::{Row, SqliteConnection};

use node_data::keys::AccountId;
use node_data::ledger::{Asset, OfferEntry, Price, OFFER_PRICE_DIVISOR};

use crate::utils::{big_divide, Rounding};

use super::accounts::account_id_from_column;
use super::StoreError;

pub(super) const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS offers
     (
     sellerid         VARCHAR(56)  NOT NULL,
     offerid          BIGINT       NOT NULL CHECK (offerid >= 0),
     sellingassettype INT          NOT NULL,
     sellingassetcode VARCHAR(12),
     sellingissuer    VARCHAR(56),
     buyingassettype  INT          NOT NULL,
     buyingassetcode  VARCHAR(12),
     buyingissuer     VARCHAR(56),
     amount           BIGINT       NOT NULL CHECK (amount >= 0),
     pricen           INT          NOT NULL,
     priced           INT          NOT NULL,
     price            BIGINT       NOT NULL,
     flags            INT          NOT NULL,
     PRIMARY KEY (offerid)
     );",
    "CREATE INDEX IF NOT EXISTS sellingissuerindex ON offers (sellingissuer);",
    "CREATE INDEX IF NOT EXISTS buyingissuerindex ON offers (buyingissuer);",
    "CREATE INDEX IF NOT EXISTS priceindex ON offers (price);",
];

const COLUMN_SELECTOR: &str =
    "SELECT sellerid, offerid, sellingassettype, sellingassetcode, \
     sellingissuer, buyingassettype, buyingassetcode, buyingissuer, amount, \
     pricen, priced, flags FROM offers";

/// Collapses the rational price into the indexed i64 column.
fn compute_price(price: &Price) -> Result<i64, StoreError> {
    big_divide(
        price.n as i64,
        OFFER_PRICE_DIVISOR,
        price.d as i64,
        Rounding::Down,
    )
    .ok_or_else(|| {
        StoreError::InvariantViolation("offer price out of range".into())
    })
}

pub(crate) async fn insert(
    conn: &mut SqliteConnection,
    offer: &OfferEntry,
) -> Result<(), StoreError> {
    let (selling_type, selling_code, selling_issuer) =
        asset_columns(&offer.selling);
    let (buying_type, buying_code, buying_issuer) =
        asset_columns(&offer.buying);

    let res = sqlx::query(
        "INSERT INTO offers (sellerid, offerid, sellingassettype, \
         sellingassetcode, sellingissuer, buyingassettype, buyingassetcode, \
         buyingissuer, amount, pricen, priced, price, flags) VALUES \
         (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(offer.seller_id.to_strkey())
    .bind(offer.offer_id as i64)
    .bind(selling_type)
    .bind(selling_code)
    .bind(selling_issuer)
    .bind(buying_type)
    .bind(buying_code)
    .bind(buying_issuer)
    .bind(offer.amount)
    .bind(offer.price.n)
    .bind(offer.price.d)
    .bind(compute_price(&offer.price)?)
    .bind(offer.flags)
    .execute(conn)
    .await?;

    if res.rows_affected() != 1 {
        return Err(StoreError::InvariantViolation(
            "offer insert affected no row".into(),
        ));
    }
    Ok(())
}

pub(crate) async fn update(
    conn: &mut SqliteConnection,
    offer: &OfferEntry,
) -> Result<(), StoreError> {
    let res = sqlx::query(
        "UPDATE offers SET amount = ?, pricen = ?, priced = ?, price = ? \
         WHERE offerid = ?",
    )
    .bind(offer.amount)
    .bind(offer.price.n)
    .bind(offer.price.d)
    .bind(compute_price(&offer.price)?)
    .bind(offer.offer_id as i64)
    .execute(conn)
    .await?;

    if res.rows_affected() != 1 {
        return Err(StoreError::InvariantViolation(format!(
            "offer update affected {} rows",
            res.rows_affected()
        )));
    }
    Ok(())
}

pub(crate) async fn delete(
    conn: &mut SqliteConnection,
    offer_id: u64,
) -> Result<(), StoreError> {
    sqlx::query("DELETE FROM offers WHERE offerid = ?")
        .bind(offer_id as i64)
        .execute(conn)
        .await?;
    Ok(())
}

pub(crate) async fn exists(
    conn: &mut SqliteConnection,
    seller_id: &AccountId,
    offer_id: u64,
) -> Result<bool, StoreError> {
    let row = sqlx::query(
        "SELECT EXISTS (SELECT NULL FROM offers WHERE sellerid = ? AND \
         offerid = ?) AS e",
    )
    .bind(seller_id.to_strkey())
    .bind(offer_id as i64)
    .fetch_one(conn)
    .await?;

    Ok(row.try_get::<i64, _>("e")? != 0)
}

pub(crate) async fn select(
    conn: &mut SqliteConnection,
    seller_id: &AccountId,
    offer_id: u64,
) -> Result<Option<OfferEntry>, StoreError> {
    let sql = format!("{COLUMN_SELECTOR} WHERE sellerid = ? AND offerid = ?");
    let row = sqlx::query(&sql)
        .bind(seller_id.to_strkey())
        .bind(offer_id as i64)
        .fetch_optional(conn)
        .await?;

    row.map(decode_row).transpose()
}

/// Offers selling `selling` for `buying`, best price first.
///
/// `ORDER BY price, offerid` is the crossing order every replica must
/// agree on.
pub(crate) async fn select_best(
    conn: &mut SqliteConnection,
    selling: &Asset,
    buying: &Asset,
    limit: u32,
    offset: u32,
) -> Result<Vec<OfferEntry>, StoreError> {
    let mut sql = String::from(COLUMN_SELECTOR);

    let (_, selling_code, selling_issuer) = asset_columns(selling);
    match (&selling_code, &selling_issuer) {
        (Some(_), Some(_)) => {
            sql += " WHERE sellingassetcode = ? AND sellingissuer = ?"
        }
        _ => sql += " WHERE sellingassettype = 0",
    }

    let (_, buying_code, buying_issuer) = asset_columns(buying);
    match (&buying_code, &buying_issuer) {
        (Some(_), Some(_)) => {
            sql += " AND buyingassetcode = ? AND buyingissuer = ?"
        }
        _ => sql += " AND buyingassettype = 0",
    }

    sql += " ORDER BY price, offerid LIMIT ? OFFSET ?";

    let mut query = sqlx::query(&sql);
    if let (Some(code), Some(issuer)) = (selling_code, selling_issuer) {
        query = query.bind(code).bind(issuer);
    }
    if let (Some(code), Some(issuer)) = (buying_code, buying_issuer) {
        query = query.bind(code).bind(issuer);
    }
    query = query.bind(limit).bind(offset);

    let rows = query.fetch_all(conn).await?;
    rows.into_iter().map(decode_row).collect()
}

fn decode_row(row: sqlx::sqlite::SqliteRow) -> Result<OfferEntry, StoreError> {
    let selling = asset_from_columns(
        row.try_get("sellingassettype")?,
        row.try_get("sellingassetcode")?,
        row.try_get("sellingissuer")?,
    )?;
    let buying = asset_from_columns(
        row.try_get("buyingassettype")?,
        row.try_get("buyingassetcode")?,
        row.try_get("buyingissuer")?,
    )?;

    Ok(OfferEntry {
        seller_id: account_id_from_column(row.try_get("sellerid")?)?,
        offer_id: row.try_get::<i64, _>("offerid")? as u64,
        selling,
        buying,
        amount: row.try_get("amount")?,
        price: Price::new(row.try_get("pricen")?, row.try_get("priced")?),
        flags: row.try_get("flags")?,
    })
}

/// Decomposes an asset into its database columns.
pub(super) fn asset_columns(
    asset: &Asset,
) -> (u32, Option<String>, Option<String>) {
    (
        asset.type_tag(),
        asset.code_str(),
        asset.issuer().map(|id| id.to_strkey()),
    )
}

/// Column triple for an asset that must not be native.
pub(super) fn credit_asset_columns(
    asset: &Asset,
) -> Result<(u32, String, String), StoreError> {
    match asset_columns(asset) {
        (tag, Some(code), Some(issuer)) => Ok((tag, code, issuer)),
        _ => Err(StoreError::InvariantViolation(
            "native asset cannot be stored as credit".into(),
        )),
    }
}

/// Rebuilds an asset from its database columns.
pub(super) fn asset_from_columns(
    asset_type: u32,
    code: Option<String>,
    issuer: Option<String>,
) -> Result<Asset, StoreError> {
    let bad =
        || StoreError::BadState("malformed asset columns".into());

    match asset_type {
        0 => Ok(Asset::Native),
        1 | 2 => {
            let code = code.ok_or_else(bad)?;
            let issuer =
                account_id_from_column(issuer.ok_or_else(bad)?)?;
            let asset = if asset_type == 1 {
                Asset::alphanum4(&code, issuer)
            } else {
                Asset::alphanum12(&code, issuer)
            };
            asset.map_err(|_| bad())
        }
        _ => Err(StoreError::BadState("unknown asset type in database".into())),
    }
}
