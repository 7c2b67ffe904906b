// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) LUMEN NETWORK. All rights reserved.

use sqlx::SqliteConnection;

use node_data::keys::AccountId;
use node_data::ledger::{is_asset_valid, AllowTrustOp, AllowTrustResult};

use crate::database::{EntryStore, StoreError};
use crate::ledger::{AccountFrame, LedgerDelta, TrustFrame};

use super::mark;

/// Grants or revokes a trustline authorization for an asset issued by
/// the operation source.
pub(crate) async fn apply(
    source: &AccountId,
    op: &AllowTrustOp,
    store: &EntryStore,
    conn: &mut SqliteConnection,
    delta: &mut LedgerDelta,
) -> Result<AllowTrustResult, StoreError> {
    // the trustline asset is the op's code issued by the source
    let asset = op.asset.with_issuer(*source);
    if !is_asset_valid(&asset) {
        mark("allow-trust", "invalid", "malformed-invalid-asset");
        return Ok(AllowTrustResult::Malformed);
    }

    let source_account = AccountFrame::load(store, conn, source)
        .await?
        .ok_or_else(|| {
            StoreError::BadState("operation source account missing".into())
        })?;

    if !source_account.is_auth_required() {
        // this account doesn't require authorization to hold its credit
        mark("allow-trust", "failure", "not-required");
        return Ok(AllowTrustResult::TrustNotRequired);
    }

    if !source_account.is_auth_revocable() && !op.authorize {
        mark("allow-trust", "failure", "cant-revoke");
        return Ok(AllowTrustResult::CantRevoke);
    }

    let Some(mut trustline) =
        TrustFrame::load(store, conn, &op.trustor, &asset).await?
    else {
        mark("allow-trust", "failure", "no-trust-line");
        return Ok(AllowTrustResult::NoTrustLine);
    };

    trustline.set_authorized(op.authorize);
    trustline.store_change(store, conn, delta).await?;

    mark("allow-trust", "success", "apply");
    Ok(AllowTrustResult::Success)
}
