// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) LUMEN NETWORK. All rights reserved.

use std::collections::{BTreeMap, BTreeSet};
use std::net::SocketAddr;

use parking_lot::Mutex;

use node_data::ledger::Hash;
use node_data::message::Message;

/// Per-ledger dedup of broadcast messages.
///
/// For every message M and peer P the overlay either sends M to P once or
/// has received M from P; records are tagged with the ledger they belong
/// to and purged when that ledger closes.
pub struct Floodgate {
    records: Mutex<BTreeMap<Hash, FloodRecord>>,
    shutting_down: Mutex<bool>,
}

#[derive(Debug, Clone)]
pub struct FloodRecord {
    pub ledger_seq: u32,
    pub message: Message,
    pub peers_told: BTreeSet<SocketAddr>,
}

impl Floodgate {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(BTreeMap::new()),
            shutting_down: Mutex::new(false),
        }
    }

    /// Registers a message seen at `ledger_seq`; returns true when it is
    /// new. A known message only extends its told-peers set.
    pub fn add_record(
        &self,
        message: &Message,
        from_peer: Option<SocketAddr>,
        ledger_seq: u32,
    ) -> bool {
        if *self.shutting_down.lock() {
            return false;
        }

        let digest = message.digest();
        let mut records = self.records.lock();
        let is_new = match records.get_mut(&digest) {
            Some(record) => {
                if let Some(peer) = from_peer {
                    record.peers_told.insert(peer);
                }
                false
            }
            None => {
                let mut peers_told = BTreeSet::new();
                if let Some(peer) = from_peer {
                    peers_told.insert(peer);
                }
                records.insert(
                    digest,
                    FloodRecord {
                        ledger_seq,
                        message: message.clone(),
                        peers_told,
                    },
                );
                true
            }
        };

        metrics::gauge!("floodgate_records").set(records.len() as f64);
        is_new
    }

    /// Peers the overlay still has to forward `message` to.
    pub fn peers_to_tell<'a>(
        &self,
        message: &Message,
        alive: impl IntoIterator<Item = &'a SocketAddr>,
    ) -> Vec<SocketAddr> {
        let records = self.records.lock();
        let told = records
            .get(&message.digest())
            .map(|record| record.peers_told.clone())
            .unwrap_or_default();

        alive
            .into_iter()
            .filter(|peer| !told.contains(peer))
            .copied()
            .collect()
    }

    /// Purges every record older than the ledger that just closed.
    pub fn clear_below(&self, current_ledger: u32) {
        let mut records = self.records.lock();
        records.retain(|_, record| record.ledger_seq >= current_ledger);
        metrics::gauge!("floodgate_records").set(records.len() as f64);
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn shutdown(&self) {
        *self.shutting_down.lock() = true;
        self.records.lock().clear();
    }
}

impl Default for Floodgate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(seq: u32) -> Message {
        Message::ConsensusValue {
            ledger_seq: seq,
            value: vec![seq as u8],
        }
    }

    fn peer(port: u16) -> SocketAddr {
        format!("127.0.0.1:{port}").parse().expect("valid addr")
    }

    #[test]
    fn dedup_and_purge() {
        let gate = Floodgate::new();

        assert!(gate.add_record(&msg(5), Some(peer(1)), 5));
        assert!(!gate.add_record(&msg(5), Some(peer(2)), 5));
        assert!(gate.add_record(&msg(6), None, 6));
        assert_eq!(gate.len(), 2);

        let peers = [peer(1), peer(2), peer(3)];
        let to_tell = gate.peers_to_tell(&msg(5), peers.iter());
        assert_eq!(to_tell, vec![peer(3)]);

        // closing ledger 6 purges everything tagged below it
        gate.clear_below(6);
        assert_eq!(gate.len(), 1);
        assert!(gate.add_record(&msg(5), None, 7));
    }

    #[test]
    fn shutdown_rejects_records() {
        let gate = Floodgate::new();
        gate.shutdown();
        assert!(!gate.add_record(&msg(1), None, 1));
        assert!(gate.is_empty());
    }
}
