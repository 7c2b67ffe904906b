// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) LUMEN NETWORK. All rights reserved.

use sqlx::{Row, SqliteConnection};

use node_data::keys::AccountId;
use node_data::ledger::{Asset, TrustlineEntry};

use super::accounts::account_id_from_column;
use super::offers::{asset_from_columns, credit_asset_columns};
use super::StoreError;

pub(super) const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS trustlines
     (
     accountid       VARCHAR(56)  NOT NULL,
     assettype       INT          NOT NULL,
     issuer          VARCHAR(56)  NOT NULL,
     assetcode       VARCHAR(12)  NOT NULL,
     tlimit          BIGINT       NOT NULL CHECK (tlimit >= 0),
     balance         BIGINT       NOT NULL CHECK (balance >= 0),
     flags           INT          NOT NULL,
     PRIMARY KEY (accountid, issuer, assetcode)
     );",
];

const COLUMN_SELECTOR: &str =
    "SELECT accountid, assettype, issuer, assetcode, tlimit, balance, flags \
     FROM trustlines";

pub(crate) async fn insert(
    conn: &mut SqliteConnection,
    line: &TrustlineEntry,
) -> Result<(), StoreError> {
    let (asset_type, code, issuer) = credit_asset_columns(&line.asset)?;

    let res = sqlx::query(
        "INSERT INTO trustlines (accountid, assettype, issuer, assetcode, \
         tlimit, balance, flags) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(line.account_id.to_strkey())
    .bind(asset_type)
    .bind(issuer)
    .bind(code)
    .bind(line.limit)
    .bind(line.balance)
    .bind(line.flags)
    .execute(conn)
    .await?;

    if res.rows_affected() != 1 {
        return Err(StoreError::InvariantViolation(
            "trustline insert affected no row".into(),
        ));
    }
    Ok(())
}

pub(crate) async fn update(
    conn: &mut SqliteConnection,
    line: &TrustlineEntry,
) -> Result<(), StoreError> {
    let (_, code, issuer) = credit_asset_columns(&line.asset)?;

    let res = sqlx::query(
        "UPDATE trustlines SET tlimit = ?, balance = ?, flags = ? \
         WHERE accountid = ? AND issuer = ? AND assetcode = ?",
    )
    .bind(line.limit)
    .bind(line.balance)
    .bind(line.flags)
    .bind(line.account_id.to_strkey())
    .bind(issuer)
    .bind(code)
    .execute(conn)
    .await?;

    if res.rows_affected() != 1 {
        return Err(StoreError::InvariantViolation(format!(
            "trustline update affected {} rows",
            res.rows_affected()
        )));
    }
    Ok(())
}

pub(crate) async fn delete(
    conn: &mut SqliteConnection,
    account_id: &AccountId,
    asset: &Asset,
) -> Result<(), StoreError> {
    let (_, code, issuer) = credit_asset_columns(asset)?;

    sqlx::query(
        "DELETE FROM trustlines WHERE accountid = ? AND issuer = ? AND \
         assetcode = ?",
    )
    .bind(account_id.to_strkey())
    .bind(issuer)
    .bind(code)
    .execute(conn)
    .await?;
    Ok(())
}

pub(crate) async fn exists(
    conn: &mut SqliteConnection,
    account_id: &AccountId,
    asset: &Asset,
) -> Result<bool, StoreError> {
    let (_, code, issuer) = credit_asset_columns(asset)?;

    let row = sqlx::query(
        "SELECT EXISTS (SELECT NULL FROM trustlines WHERE accountid = ? AND \
         issuer = ? AND assetcode = ?) AS e",
    )
    .bind(account_id.to_strkey())
    .bind(issuer)
    .bind(code)
    .fetch_one(conn)
    .await?;

    Ok(row.try_get::<i64, _>("e")? != 0)
}

pub(crate) async fn select(
    conn: &mut SqliteConnection,
    account_id: &AccountId,
    asset: &Asset,
) -> Result<Option<TrustlineEntry>, StoreError> {
    let (_, code, issuer) = credit_asset_columns(asset)?;

    let sql = format!(
        "{COLUMN_SELECTOR} WHERE accountid = ? AND issuer = ? AND \
         assetcode = ?"
    );
    let row = sqlx::query(&sql)
        .bind(account_id.to_strkey())
        .bind(issuer)
        .bind(code)
        .fetch_optional(conn)
        .await?;

    row.map(decode_row).transpose()
}

fn decode_row(
    row: sqlx::sqlite::SqliteRow,
) -> Result<TrustlineEntry, StoreError> {
    let asset = asset_from_columns(
        row.try_get("assettype")?,
        row.try_get("assetcode")?,
        row.try_get("issuer")?,
    )?;

    Ok(TrustlineEntry {
        account_id: account_id_from_column(row.try_get("accountid")?)?,
        asset,
        balance: row.try_get("balance")?,
        limit: row.try_get("tlimit")?,
        flags: row.try_get("flags")?,
    })
}
