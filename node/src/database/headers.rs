// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) LUMEN NETWORK. All rights reserved.

use sqlx::{Row, SqliteConnection};

use node_data::ledger::LedgerHeader;
use node_data::Serializable;

use super::StoreError;

pub(super) const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS ledgerheaders
     (
     ledgerhash      VARCHAR(64)  PRIMARY KEY,
     prevhash        VARCHAR(64)  NOT NULL,
     ledgerseq       INT          UNIQUE CHECK (ledgerseq >= 0),
     closetime       BIGINT       NOT NULL CHECK (closetime >= 0),
     data            TEXT         NOT NULL
     );",
];

pub(crate) async fn insert(
    conn: &mut SqliteConnection,
    header: &LedgerHeader,
) -> Result<(), StoreError> {
    let res = sqlx::query(
        "INSERT INTO ledgerheaders (ledgerhash, prevhash, ledgerseq, \
         closetime, data) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(hex::encode(header.hash))
    .bind(hex::encode(header.previous_ledger_hash))
    .bind(header.ledger_seq)
    .bind(header.close_time as i64)
    .bind(hex::encode(header.to_bytes()))
    .execute(conn)
    .await?;

    if res.rows_affected() != 1 {
        return Err(StoreError::InvariantViolation(
            "ledger header insert affected no row".into(),
        ));
    }
    Ok(())
}

pub(crate) async fn select_latest(
    conn: &mut SqliteConnection,
) -> Result<Option<LedgerHeader>, StoreError> {
    let row = sqlx::query(
        "SELECT data FROM ledgerheaders ORDER BY ledgerseq DESC LIMIT 1",
    )
    .fetch_optional(conn)
    .await?;

    row.map(decode_row).transpose()
}

pub(crate) async fn select_by_seq(
    conn: &mut SqliteConnection,
    ledger_seq: u32,
) -> Result<Option<LedgerHeader>, StoreError> {
    let row = sqlx::query("SELECT data FROM ledgerheaders WHERE ledgerseq = ?")
        .bind(ledger_seq)
        .fetch_optional(conn)
        .await?;

    row.map(decode_row).transpose()
}

fn decode_row(row: sqlx::sqlite::SqliteRow) -> Result<LedgerHeader, StoreError> {
    let data: String = row.try_get("data")?;
    let bytes = hex::decode(&data).map_err(|_| {
        StoreError::BadState("malformed ledger header column".into())
    })?;
    Ok(LedgerHeader::read(&mut &bytes[..])?)
}
