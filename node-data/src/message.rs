// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) LUMEN NETWORK. All rights reserved.

use sha2::{Digest, Sha256};

use crate::ledger::{Hash, TransactionEnvelope};
use crate::Serializable;

/// A broadcast message as seen by the flood layer.
///
/// Only the shapes the ledger core interacts with are modelled here; the
/// overlay owns transport and peer bookkeeping.
#[derive(Debug, Eq, PartialEq, Clone)]
pub enum Message {
    Transaction(TransactionEnvelope),
    ConsensusValue { ledger_seq: u32, value: Vec<u8> },
}

impl Message {
    /// Stable digest of the encoded message; the flood-dedup key.
    pub fn digest(&self) -> Hash {
        Sha256::digest(self.to_bytes()).into()
    }

    pub fn topic(&self) -> &'static str {
        match self {
            Message::Transaction(_) => "transaction",
            Message::ConsensusValue { .. } => "consensus_value",
        }
    }
}
