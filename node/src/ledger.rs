// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) LUMEN NETWORK. All rights reserved.

pub mod conf;

mod delta;
pub use delta::LedgerDelta;

mod frame;
pub use frame::{AccountFrame, EntryFrame, OfferFrame, TrustFrame};

mod txset;
pub use txset::TxSetFrame;

mod manager;
pub use manager::{
    CloseError, CloseState, LedgerCloseEvent, LedgerCloseOutcome,
    LedgerManager, GENESIS_LEDGER_SEQ,
};

use node_data::ledger::Hash;

/// A parameter change voted through consensus, applied at close.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum LedgerUpgrade {
    BaseFee(u32),
}

/// The value consensus externalized for one ledger.
#[derive(Debug, Clone)]
pub struct ConsensusValue {
    pub tx_set_hash: Hash,
    pub close_time: u64,
    pub upgrades: Vec<LedgerUpgrade>,
}

/// Everything `closeLedger` needs to advance the chain by one ledger.
#[derive(Debug)]
pub struct LedgerCloseData {
    pub ledger_seq: u32,
    pub tx_set: TxSetFrame,
    pub value: ConsensusValue,
}
