// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) LUMEN NETWORK. All rights reserved.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use stellar_strkey::ed25519::PublicKey as StrkeyPublicKey;

pub const ACCOUNT_ID_SIZE: usize = 32;
pub const SIGNATURE_SIZE: usize = 64;

/// Ed25519 public key identifying an account.
///
/// Rendered as strkey (base32 with a CRC16 checksum) wherever the key
/// leaves the binary domain: logs, the database, user-facing APIs.
#[derive(Default, Eq, PartialEq, Clone, Copy, Hash)]
pub struct AccountId([u8; ACCOUNT_ID_SIZE]);

impl AccountId {
    pub fn new(bytes: [u8; ACCOUNT_ID_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ACCOUNT_ID_SIZE] {
        &self.0
    }

    /// Strkey representation, used as the database identifier.
    pub fn to_strkey(&self) -> String {
        StrkeyPublicKey(self.0).to_string()
    }

    /// Last four key bytes, matched against signature hints.
    pub fn hint(&self) -> [u8; 4] {
        let mut hint = [0u8; 4];
        hint.copy_from_slice(&self.0[ACCOUNT_ID_SIZE - 4..]);
        hint
    }
}

impl From<[u8; ACCOUNT_ID_SIZE]> for AccountId {
    fn from(bytes: [u8; ACCOUNT_ID_SIZE]) -> Self {
        Self(bytes)
    }
}

impl PartialOrd<AccountId> for AccountId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AccountId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_strkey())
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_strkey())
    }
}

impl FromStr for AccountId {
    type Err = stellar_strkey::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(StrkeyPublicKey::from_str(s)?.0))
    }
}

/// Raw ed25519 signature bytes.
#[derive(Eq, PartialEq, Clone, Copy)]
pub struct Signature([u8; SIGNATURE_SIZE]);

impl Signature {
    pub fn new(bytes: [u8; SIGNATURE_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn inner(&self) -> &[u8; SIGNATURE_SIZE] {
        &self.0
    }
}

impl Default for Signature {
    fn default() -> Self {
        Self([0u8; SIGNATURE_SIZE])
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", crate::ledger::to_str(&self.0))
    }
}

/// A signature together with the hint of the key that produced it.
#[derive(Debug, Default, Eq, PartialEq, Clone, Copy)]
pub struct DecoratedSignature {
    pub hint: [u8; 4],
    pub signature: Signature,
}

#[cfg(any(feature = "faker", test))]
pub mod faker {
    use super::*;

    use ed25519_dalek::{Signer, SigningKey};
    use rand::RngCore;

    /// Deterministic keypair from a 32-byte seed.
    pub fn keypair_from_seed(seed: [u8; 32]) -> (SigningKey, AccountId) {
        let sk = SigningKey::from_bytes(&seed);
        let id = AccountId::new(sk.verifying_key().to_bytes());
        (sk, id)
    }

    pub fn gen_account_id<R: RngCore>(rng: &mut R) -> AccountId {
        let mut seed = [0u8; 32];
        rng.fill_bytes(&mut seed);
        keypair_from_seed(seed).1
    }

    pub fn sign(sk: &SigningKey, payload: &[u8]) -> DecoratedSignature {
        let sig = sk.sign(payload);
        DecoratedSignature {
            hint: AccountId::new(sk.verifying_key().to_bytes()).hint(),
            signature: Signature::new(sig.to_bytes()),
        }
    }
}
