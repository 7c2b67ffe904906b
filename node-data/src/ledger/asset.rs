// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) LUMEN NETWORK. All rights reserved.

use std::fmt;

use thiserror::Error;

use crate::keys::AccountId;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset code must be 1..={0} alphanumeric characters")]
    BadCode(usize),
}

/// An asset tradeable on the network.
///
/// `Native` is the built-in currency and carries no issuer; credit assets
/// are identified by an alphanumeric code plus the issuing account.
/// Equality is structural.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Hash)]
pub enum Asset {
    Native,
    AlphaNum4 { code: [u8; 4], issuer: AccountId },
    AlphaNum12 { code: [u8; 12], issuer: AccountId },
}

impl Asset {
    /// Union tag, also the `assettype` database column.
    pub fn type_tag(&self) -> u32 {
        match self {
            Asset::Native => 0,
            Asset::AlphaNum4 { .. } => 1,
            Asset::AlphaNum12 { .. } => 2,
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Asset::Native)
    }

    pub fn issuer(&self) -> Option<&AccountId> {
        match self {
            Asset::Native => None,
            Asset::AlphaNum4 { issuer, .. } => Some(issuer),
            Asset::AlphaNum12 { issuer, .. } => Some(issuer),
        }
    }

    /// Code with the zero padding stripped; `None` for native.
    pub fn code_str(&self) -> Option<String> {
        let raw: &[u8] = match self {
            Asset::Native => return None,
            Asset::AlphaNum4 { code, .. } => code,
            Asset::AlphaNum12 { code, .. } => code,
        };
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        Some(String::from_utf8_lossy(&raw[..end]).into_owned())
    }

    pub fn alphanum4(code: &str, issuer: AccountId) -> Result<Self, AssetError> {
        Ok(Asset::AlphaNum4 {
            code: pad_code::<4>(code)?,
            issuer,
        })
    }

    pub fn alphanum12(code: &str, issuer: AccountId) -> Result<Self, AssetError> {
        Ok(Asset::AlphaNum12 {
            code: pad_code::<12>(code)?,
            issuer,
        })
    }
}

impl fmt::Debug for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Native => write!(f, "native"),
            _ => write!(
                f,
                "{}:{}",
                self.code_str().unwrap_or_default(),
                self.issuer().expect("credit asset has an issuer")
            ),
        }
    }
}

fn pad_code<const N: usize>(code: &str) -> Result<[u8; N], AssetError> {
    let bytes = code.as_bytes();
    if bytes.is_empty()
        || bytes.len() > N
        || !bytes.iter().all(|b| b.is_ascii_alphanumeric())
    {
        return Err(AssetError::BadCode(N));
    }
    let mut out = [0u8; N];
    out[..bytes.len()].copy_from_slice(bytes);
    Ok(out)
}

/// Structural validity of an asset as accepted on the wire.
///
/// A credit code must hold at least one character, all characters must be
/// alphanumeric, and once a zero padding byte appears every following byte
/// must be zero as well.
pub fn is_asset_valid(asset: &Asset) -> bool {
    let code: &[u8] = match asset {
        Asset::Native => return true,
        Asset::AlphaNum4 { code, .. } => code,
        Asset::AlphaNum12 { code, .. } => code,
    };

    let mut in_padding = false;
    let mut one_char = false;
    for &b in code {
        if b == 0 {
            in_padding = true;
        } else if in_padding || !b.is_ascii_alphanumeric() {
            return false;
        } else {
            one_char = true;
        }
    }
    one_char
}
