// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) LUMEN NETWORK. All rights reserved.

use std::str::FromStr;

use sqlx::{Row, SqliteConnection};

use node_data::keys::AccountId;
use node_data::ledger::{AccountEntry, Signer};
use node_data::Serializable;

use super::StoreError;

pub(super) const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS accounts
     (
     accountid       VARCHAR(56)  PRIMARY KEY,
     balance         BIGINT       NOT NULL CHECK (balance >= 0),
     seqnum          BIGINT       NOT NULL,
     numsubentries   INT          NOT NULL CHECK (numsubentries >= 0),
     flags           INT          NOT NULL,
     thresholds      TEXT         NOT NULL,
     signers         TEXT         NOT NULL
     );",
];

const COLUMN_SELECTOR: &str =
    "SELECT accountid, balance, seqnum, numsubentries, flags, thresholds, \
     signers FROM accounts";

pub(crate) async fn insert(
    conn: &mut SqliteConnection,
    account: &AccountEntry,
) -> Result<(), StoreError> {
    let res = sqlx::query(
        "INSERT INTO accounts (accountid, balance, seqnum, numsubentries, \
         flags, thresholds, signers) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(account.account_id.to_strkey())
    .bind(account.balance)
    .bind(account.seq_num as i64)
    .bind(account.num_sub_entries)
    .bind(account.flags)
    .bind(hex::encode(account.thresholds))
    .bind(signers_to_hex(&account.signers))
    .execute(conn)
    .await?;

    if res.rows_affected() != 1 {
        return Err(StoreError::InvariantViolation(
            "account insert affected no row".into(),
        ));
    }
    Ok(())
}

pub(crate) async fn update(
    conn: &mut SqliteConnection,
    account: &AccountEntry,
) -> Result<(), StoreError> {
    let res = sqlx::query(
        "UPDATE accounts SET balance = ?, seqnum = ?, numsubentries = ?, \
         flags = ?, thresholds = ?, signers = ? WHERE accountid = ?",
    )
    .bind(account.balance)
    .bind(account.seq_num as i64)
    .bind(account.num_sub_entries)
    .bind(account.flags)
    .bind(hex::encode(account.thresholds))
    .bind(signers_to_hex(&account.signers))
    .bind(account.account_id.to_strkey())
    .execute(conn)
    .await?;

    if res.rows_affected() != 1 {
        return Err(StoreError::InvariantViolation(format!(
            "account update affected {} rows",
            res.rows_affected()
        )));
    }
    Ok(())
}

pub(crate) async fn delete(
    conn: &mut SqliteConnection,
    account_id: &AccountId,
) -> Result<(), StoreError> {
    sqlx::query("DELETE FROM accounts WHERE accountid = ?")
        .bind(account_id.to_strkey())
        .execute(conn)
        .await?;
    Ok(())
}

pub(crate) async fn exists(
    conn: &mut SqliteConnection,
    account_id: &AccountId,
) -> Result<bool, StoreError> {
    let row = sqlx::query(
        "SELECT EXISTS (SELECT NULL FROM accounts WHERE accountid = ?) AS e",
    )
    .bind(account_id.to_strkey())
    .fetch_one(conn)
    .await?;

    Ok(row.try_get::<i64, _>("e")? != 0)
}

pub(crate) async fn select(
    conn: &mut SqliteConnection,
    account_id: &AccountId,
) -> Result<Option<AccountEntry>, StoreError> {
    let sql = format!("{COLUMN_SELECTOR} WHERE accountid = ?");
    let row = sqlx::query(&sql)
        .bind(account_id.to_strkey())
        .fetch_optional(conn)
        .await?;

    row.map(decode_row).transpose()
}

fn decode_row(row: sqlx::sqlite::SqliteRow) -> Result<AccountEntry, StoreError> {
    let account_id = account_id_from_column(row.try_get("accountid")?)?;

    let thresholds_hex: String = row.try_get("thresholds")?;
    let thresholds: [u8; 4] = hex::decode(&thresholds_hex)
        .ok()
        .and_then(|v| v.try_into().ok())
        .ok_or_else(|| {
            StoreError::BadState("malformed thresholds column".into())
        })?;

    Ok(AccountEntry {
        account_id,
        balance: row.try_get("balance")?,
        seq_num: row.try_get::<i64, _>("seqnum")? as u64,
        num_sub_entries: row.try_get("numsubentries")?,
        flags: row.try_get("flags")?,
        thresholds,
        signers: signers_from_hex(row.try_get("signers")?)?,
    })
}

pub(super) fn account_id_from_column(
    strkey: String,
) -> Result<AccountId, StoreError> {
    AccountId::from_str(&strkey).map_err(|_| {
        StoreError::BadState(format!("malformed account id column: {strkey}"))
    })
}

fn signers_to_hex(signers: &[Signer]) -> String {
    let mut buf = (signers.len() as u32).to_be_bytes().to_vec();
    for signer in signers {
        buf.extend_from_slice(&signer.to_bytes());
    }
    hex::encode(buf)
}

fn signers_from_hex(column: String) -> Result<Vec<Signer>, StoreError> {
    let bytes = hex::decode(&column)
        .map_err(|_| StoreError::BadState("malformed signers column".into()))?;

    let mut r = &bytes[..];
    let count = Signer::read_u32_be(&mut r)?;
    (0..count)
        .map(|_| Signer::read(&mut r).map_err(StoreError::from))
        .collect()
}
