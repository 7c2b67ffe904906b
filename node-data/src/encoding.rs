// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) LUMEN NETWORK. All rights reserved.

use std::io::{self, Read, Write};

use crate::keys::{AccountId, DecoratedSignature, Signature};
use crate::ledger::{
    AccountEntry, AllowTrustAsset, AllowTrustOp, AllowTrustResult, Asset,
    ClaimOfferAtom, LedgerEntry, LedgerHeader, LedgerKey, ManageOfferEffect,
    ManageOfferOp, ManageOfferResult, Memo, OfferEntry, Operation,
    OperationBody, OperationResult, PathPaymentOp, PathPaymentResult, Price,
    SimplePaymentResult, Signer, Transaction, TransactionEnvelope,
    TransactionResult, TransactionSet, TrustlineEntry, TxResultCode,
    MAX_PATH_LENGTH,
};
use crate::message::Message;
use crate::Serializable;

/// Sanity cap on decoded sequence lengths.
const MAX_VEC_LEN: usize = 64 * 1024;

fn bad_data(what: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, what.to_owned())
}

fn write_u32<W: Write>(w: &mut W, v: u32) -> io::Result<()> {
    w.write_all(&v.to_be_bytes())
}

fn read_u32<R: Read>(r: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

fn write_vec<W: Write, T: Serializable>(
    w: &mut W,
    items: &[T],
) -> io::Result<()> {
    write_u32(w, items.len() as u32)?;
    for item in items {
        item.write(w)?;
    }
    Ok(())
}

fn read_vec<R: Read, T: Serializable>(r: &mut R) -> io::Result<Vec<T>> {
    let len = read_u32(r)? as usize;
    if len > MAX_VEC_LEN {
        return Err(bad_data("sequence length out of bounds"));
    }
    (0..len).map(|_| T::read(r)).collect()
}

impl Serializable for AccountId {
    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(self.as_bytes())
    }

    fn read<R: Read>(r: &mut R) -> io::Result<Self>
    where
        Self: Sized,
    {
        Ok(AccountId::new(Self::read_bytes(r)?))
    }
}

impl Serializable for Signature {
    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(self.inner())
    }

    fn read<R: Read>(r: &mut R) -> io::Result<Self>
    where
        Self: Sized,
    {
        Ok(Signature::new(Self::read_bytes(r)?))
    }
}

impl Serializable for DecoratedSignature {
    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.hint)?;
        self.signature.write(w)
    }

    fn read<R: Read>(r: &mut R) -> io::Result<Self>
    where
        Self: Sized,
    {
        let hint = Self::read_bytes(r)?;
        let signature = Signature::read(r)?;
        Ok(DecoratedSignature { hint, signature })
    }
}

impl Serializable for Asset {
    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write_u32(w, self.type_tag())?;
        match self {
            Asset::Native => Ok(()),
            Asset::AlphaNum4 { code, issuer } => {
                w.write_all(code)?;
                issuer.write(w)
            }
            Asset::AlphaNum12 { code, issuer } => {
                w.write_all(code)?;
                issuer.write(w)
            }
        }
    }

    fn read<R: Read>(r: &mut R) -> io::Result<Self>
    where
        Self: Sized,
    {
        match read_u32(r)? {
            0 => Ok(Asset::Native),
            1 => Ok(Asset::AlphaNum4 {
                code: Self::read_bytes(r)?,
                issuer: AccountId::read(r)?,
            }),
            2 => Ok(Asset::AlphaNum12 {
                code: Self::read_bytes(r)?,
                issuer: AccountId::read(r)?,
            }),
            _ => Err(bad_data("invalid asset type")),
        }
    }
}

impl Serializable for Price {
    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.n.to_be_bytes())?;
        w.write_all(&self.d.to_be_bytes())
    }

    fn read<R: Read>(r: &mut R) -> io::Result<Self>
    where
        Self: Sized,
    {
        let n = Self::read_i32_be(r)?;
        let d = Self::read_i32_be(r)?;
        Ok(Price { n, d })
    }
}

impl Serializable for Signer {
    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        self.key.write(w)?;
        write_u32(w, self.weight)
    }

    fn read<R: Read>(r: &mut R) -> io::Result<Self>
    where
        Self: Sized,
    {
        let key = AccountId::read(r)?;
        let weight = read_u32(r)?;
        Ok(Signer { key, weight })
    }
}

impl Serializable for AccountEntry {
    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        self.account_id.write(w)?;
        w.write_all(&self.balance.to_be_bytes())?;
        w.write_all(&self.seq_num.to_be_bytes())?;
        write_u32(w, self.num_sub_entries)?;
        write_u32(w, self.flags)?;
        w.write_all(&self.thresholds)?;
        write_vec(w, &self.signers)
    }

    fn read<R: Read>(r: &mut R) -> io::Result<Self>
    where
        Self: Sized,
    {
        Ok(AccountEntry {
            account_id: AccountId::read(r)?,
            balance: Self::read_i64_be(r)?,
            seq_num: Self::read_u64_be(r)?,
            num_sub_entries: read_u32(r)?,
            flags: read_u32(r)?,
            thresholds: Self::read_bytes(r)?,
            signers: read_vec(r)?,
        })
    }
}

impl Serializable for TrustlineEntry {
    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        self.account_id.write(w)?;
        self.asset.write(w)?;
        w.write_all(&self.balance.to_be_bytes())?;
        w.write_all(&self.limit.to_be_bytes())?;
        write_u32(w, self.flags)
    }

    fn read<R: Read>(r: &mut R) -> io::Result<Self>
    where
        Self: Sized,
    {
        Ok(TrustlineEntry {
            account_id: AccountId::read(r)?,
            asset: Asset::read(r)?,
            balance: Self::read_i64_be(r)?,
            limit: Self::read_i64_be(r)?,
            flags: read_u32(r)?,
        })
    }
}

impl Serializable for OfferEntry {
    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        self.seller_id.write(w)?;
        w.write_all(&self.offer_id.to_be_bytes())?;
        self.selling.write(w)?;
        self.buying.write(w)?;
        w.write_all(&self.amount.to_be_bytes())?;
        self.price.write(w)?;
        write_u32(w, self.flags)
    }

    fn read<R: Read>(r: &mut R) -> io::Result<Self>
    where
        Self: Sized,
    {
        Ok(OfferEntry {
            seller_id: AccountId::read(r)?,
            offer_id: Self::read_u64_be(r)?,
            selling: Asset::read(r)?,
            buying: Asset::read(r)?,
            amount: Self::read_i64_be(r)?,
            price: Price::read(r)?,
            flags: read_u32(r)?,
        })
    }
}

impl Serializable for LedgerEntry {
    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write_u32(w, self.type_tag())?;
        match self {
            LedgerEntry::Account(e) => e.write(w),
            LedgerEntry::Trustline(e) => e.write(w),
            LedgerEntry::Offer(e) => e.write(w),
        }
    }

    fn read<R: Read>(r: &mut R) -> io::Result<Self>
    where
        Self: Sized,
    {
        match read_u32(r)? {
            0 => Ok(LedgerEntry::Account(AccountEntry::read(r)?)),
            1 => Ok(LedgerEntry::Trustline(TrustlineEntry::read(r)?)),
            2 => Ok(LedgerEntry::Offer(OfferEntry::read(r)?)),
            _ => Err(bad_data("invalid ledger entry type")),
        }
    }
}

impl Serializable for LedgerKey {
    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write_u32(w, self.type_tag())?;
        match self {
            LedgerKey::Account { account_id } => account_id.write(w),
            LedgerKey::Trustline { account_id, asset } => {
                account_id.write(w)?;
                asset.write(w)
            }
            LedgerKey::Offer {
                seller_id,
                offer_id,
            } => {
                seller_id.write(w)?;
                w.write_all(&offer_id.to_be_bytes())
            }
        }
    }

    fn read<R: Read>(r: &mut R) -> io::Result<Self>
    where
        Self: Sized,
    {
        match read_u32(r)? {
            0 => Ok(LedgerKey::Account {
                account_id: AccountId::read(r)?,
            }),
            1 => Ok(LedgerKey::Trustline {
                account_id: AccountId::read(r)?,
                asset: Asset::read(r)?,
            }),
            2 => Ok(LedgerKey::Offer {
                seller_id: AccountId::read(r)?,
                offer_id: Self::read_u64_be(r)?,
            }),
            _ => Err(bad_data("invalid ledger key type")),
        }
    }
}

impl Serializable for LedgerHeader {
    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        self.marshal_hashable(w)?;
        w.write_all(&self.hash)?;

        Ok(())
    }

    fn read<R: Read>(r: &mut R) -> io::Result<Self>
    where
        Self: Sized,
    {
        let mut header = Self::unmarshal_hashable(r)?;
        header.hash = Self::read_bytes(r)?;
        Ok(header)
    }
}

impl Serializable for Memo {
    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        match self {
            Memo::None => write_u32(w, 0),
            Memo::Text(s) => {
                write_u32(w, 1)?;
                Self::write_string(w, s)
            }
            Memo::Hash(h) => {
                write_u32(w, 2)?;
                w.write_all(h)
            }
        }
    }

    fn read<R: Read>(r: &mut R) -> io::Result<Self>
    where
        Self: Sized,
    {
        match read_u32(r)? {
            0 => Ok(Memo::None),
            1 => Ok(Memo::Text(Self::read_string(r)?)),
            2 => Ok(Memo::Hash(Self::read_bytes(r)?)),
            _ => Err(bad_data("invalid memo type")),
        }
    }
}

impl Serializable for PathPaymentOp {
    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        self.send_asset.write(w)?;
        w.write_all(&self.send_max.to_be_bytes())?;
        self.destination.write(w)?;
        self.dest_asset.write(w)?;
        w.write_all(&self.dest_amount.to_be_bytes())?;
        write_vec(w, &self.path)
    }

    fn read<R: Read>(r: &mut R) -> io::Result<Self>
    where
        Self: Sized,
    {
        let send_asset = Asset::read(r)?;
        let send_max = Self::read_i64_be(r)?;
        let destination = AccountId::read(r)?;
        let dest_asset = Asset::read(r)?;
        let dest_amount = Self::read_i64_be(r)?;
        let path: Vec<Asset> = read_vec(r)?;
        if path.len() > MAX_PATH_LENGTH {
            return Err(bad_data("payment path too long"));
        }

        Ok(PathPaymentOp {
            send_asset,
            send_max,
            destination,
            dest_asset,
            dest_amount,
            path,
        })
    }
}

impl Serializable for ManageOfferOp {
    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        self.selling.write(w)?;
        self.buying.write(w)?;
        w.write_all(&self.amount.to_be_bytes())?;
        self.price.write(w)?;
        w.write_all(&self.offer_id.to_be_bytes())
    }

    fn read<R: Read>(r: &mut R) -> io::Result<Self>
    where
        Self: Sized,
    {
        Ok(ManageOfferOp {
            selling: Asset::read(r)?,
            buying: Asset::read(r)?,
            amount: Self::read_i64_be(r)?,
            price: Price::read(r)?,
            offer_id: Self::read_u64_be(r)?,
        })
    }
}

impl Serializable for AllowTrustAsset {
    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        match self {
            AllowTrustAsset::Code4(code) => {
                write_u32(w, 1)?;
                w.write_all(code)
            }
            AllowTrustAsset::Code12(code) => {
                write_u32(w, 2)?;
                w.write_all(code)
            }
        }
    }

    fn read<R: Read>(r: &mut R) -> io::Result<Self>
    where
        Self: Sized,
    {
        match read_u32(r)? {
            1 => Ok(AllowTrustAsset::Code4(Self::read_bytes(r)?)),
            2 => Ok(AllowTrustAsset::Code12(Self::read_bytes(r)?)),
            _ => Err(bad_data("invalid allow-trust asset type")),
        }
    }
}

impl Serializable for AllowTrustOp {
    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        self.trustor.write(w)?;
        self.asset.write(w)?;
        Self::write_bool(w, self.authorize)
    }

    fn read<R: Read>(r: &mut R) -> io::Result<Self>
    where
        Self: Sized,
    {
        Ok(AllowTrustOp {
            trustor: AccountId::read(r)?,
            asset: AllowTrustAsset::read(r)?,
            authorize: Self::read_bool(r)?,
        })
    }
}

impl Serializable for Operation {
    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        match &self.source {
            Some(source) => {
                Self::write_bool(w, true)?;
                source.write(w)?;
            }
            None => Self::write_bool(w, false)?,
        }

        write_u32(w, self.body.type_tag())?;
        match &self.body {
            OperationBody::PathPayment(op) => op.write(w),
            OperationBody::ManageOffer(op) => op.write(w),
            OperationBody::AllowTrust(op) => op.write(w),
        }
    }

    fn read<R: Read>(r: &mut R) -> io::Result<Self>
    where
        Self: Sized,
    {
        let source = match Self::read_bool(r)? {
            true => Some(AccountId::read(r)?),
            false => None,
        };

        let body = match read_u32(r)? {
            0 => OperationBody::PathPayment(PathPaymentOp::read(r)?),
            1 => OperationBody::ManageOffer(ManageOfferOp::read(r)?),
            2 => OperationBody::AllowTrust(AllowTrustOp::read(r)?),
            _ => return Err(bad_data("invalid operation type")),
        };

        Ok(Operation { source, body })
    }
}

impl Serializable for Transaction {
    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        self.source.write(w)?;
        write_u32(w, self.fee)?;
        w.write_all(&self.seq_num.to_be_bytes())?;
        self.memo.write(w)?;
        write_vec(w, &self.operations)
    }

    fn read<R: Read>(r: &mut R) -> io::Result<Self>
    where
        Self: Sized,
    {
        Ok(Transaction {
            source: AccountId::read(r)?,
            fee: read_u32(r)?,
            seq_num: Self::read_u64_be(r)?,
            memo: Memo::read(r)?,
            operations: read_vec(r)?,
        })
    }
}

impl Serializable for TransactionEnvelope {
    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        self.tx.write(w)?;
        write_vec(w, &self.signatures)
    }

    fn read<R: Read>(r: &mut R) -> io::Result<Self>
    where
        Self: Sized,
    {
        Ok(TransactionEnvelope {
            tx: Transaction::read(r)?,
            signatures: read_vec(r)?,
        })
    }
}

impl Serializable for TransactionSet {
    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.previous_ledger_hash)?;
        write_vec(w, &self.txs)
    }

    fn read<R: Read>(r: &mut R) -> io::Result<Self>
    where
        Self: Sized,
    {
        Ok(TransactionSet {
            previous_ledger_hash: Self::read_bytes(r)?,
            txs: read_vec(r)?,
        })
    }
}

impl Serializable for ClaimOfferAtom {
    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        self.seller_id.write(w)?;
        w.write_all(&self.offer_id.to_be_bytes())?;
        self.asset_claimed.write(w)?;
        w.write_all(&self.amount_claimed.to_be_bytes())?;
        self.asset_sent.write(w)?;
        w.write_all(&self.amount_sent.to_be_bytes())
    }

    fn read<R: Read>(r: &mut R) -> io::Result<Self>
    where
        Self: Sized,
    {
        Ok(ClaimOfferAtom {
            seller_id: AccountId::read(r)?,
            offer_id: Self::read_u64_be(r)?,
            asset_claimed: Asset::read(r)?,
            amount_claimed: Self::read_i64_be(r)?,
            asset_sent: Asset::read(r)?,
            amount_sent: Self::read_i64_be(r)?,
        })
    }
}

impl Serializable for SimplePaymentResult {
    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        self.destination.write(w)?;
        self.asset.write(w)?;
        w.write_all(&self.amount.to_be_bytes())
    }

    fn read<R: Read>(r: &mut R) -> io::Result<Self>
    where
        Self: Sized,
    {
        Ok(SimplePaymentResult {
            destination: AccountId::read(r)?,
            asset: Asset::read(r)?,
            amount: Self::read_i64_be(r)?,
        })
    }
}

impl Serializable for PathPaymentResult {
    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.code().to_be_bytes())?;
        if let PathPaymentResult::Success { offers, last } = self {
            write_vec(w, offers)?;
            last.write(w)?;
        }
        Ok(())
    }

    fn read<R: Read>(r: &mut R) -> io::Result<Self>
    where
        Self: Sized,
    {
        Ok(match Self::read_i32_be(r)? {
            0 => PathPaymentResult::Success {
                offers: read_vec(r)?,
                last: SimplePaymentResult::read(r)?,
            },
            -1 => PathPaymentResult::Malformed,
            -2 => PathPaymentResult::Underfunded,
            -3 => PathPaymentResult::SrcNoTrust,
            -4 => PathPaymentResult::SrcNotAuthorized,
            -5 => PathPaymentResult::NoDestination,
            -6 => PathPaymentResult::NoTrust,
            -7 => PathPaymentResult::NotAuthorized,
            -8 => PathPaymentResult::LineFull,
            -9 => PathPaymentResult::NoIssuer,
            -10 => PathPaymentResult::TooFewOffers,
            -11 => PathPaymentResult::OverSendmax,
            _ => return Err(bad_data("invalid path payment result code")),
        })
    }
}

impl Serializable for ManageOfferEffect {
    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        match self {
            ManageOfferEffect::Created(offer) => {
                write_u32(w, 0)?;
                offer.write(w)
            }
            ManageOfferEffect::Updated(offer) => {
                write_u32(w, 1)?;
                offer.write(w)
            }
            ManageOfferEffect::Deleted => write_u32(w, 2),
        }
    }

    fn read<R: Read>(r: &mut R) -> io::Result<Self>
    where
        Self: Sized,
    {
        match read_u32(r)? {
            0 => Ok(ManageOfferEffect::Created(OfferEntry::read(r)?)),
            1 => Ok(ManageOfferEffect::Updated(OfferEntry::read(r)?)),
            2 => Ok(ManageOfferEffect::Deleted),
            _ => Err(bad_data("invalid manage offer effect")),
        }
    }
}

impl Serializable for ManageOfferResult {
    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.code().to_be_bytes())?;
        if let ManageOfferResult::Success {
            offers_claimed,
            effect,
        } = self
        {
            write_vec(w, offers_claimed)?;
            effect.write(w)?;
        }
        Ok(())
    }

    fn read<R: Read>(r: &mut R) -> io::Result<Self>
    where
        Self: Sized,
    {
        Ok(match Self::read_i32_be(r)? {
            0 => ManageOfferResult::Success {
                offers_claimed: read_vec(r)?,
                effect: ManageOfferEffect::read(r)?,
            },
            -1 => ManageOfferResult::Malformed,
            -2 => ManageOfferResult::SellNoTrust,
            -3 => ManageOfferResult::BuyNoTrust,
            -4 => ManageOfferResult::SellNotAuthorized,
            -5 => ManageOfferResult::BuyNotAuthorized,
            -6 => ManageOfferResult::LineFull,
            -7 => ManageOfferResult::Underfunded,
            -8 => ManageOfferResult::CrossSelf,
            -9 => ManageOfferResult::SellNoIssuer,
            -10 => ManageOfferResult::BuyNoIssuer,
            -11 => ManageOfferResult::NotFound,
            -12 => ManageOfferResult::LowReserve,
            _ => return Err(bad_data("invalid manage offer result code")),
        })
    }
}

impl Serializable for AllowTrustResult {
    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.code().to_be_bytes())
    }

    fn read<R: Read>(r: &mut R) -> io::Result<Self>
    where
        Self: Sized,
    {
        Ok(match Self::read_i32_be(r)? {
            0 => AllowTrustResult::Success,
            -1 => AllowTrustResult::Malformed,
            -2 => AllowTrustResult::NoTrustLine,
            -3 => AllowTrustResult::TrustNotRequired,
            -4 => AllowTrustResult::CantRevoke,
            _ => return Err(bad_data("invalid allow trust result code")),
        })
    }
}

impl Serializable for OperationResult {
    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write_u32(w, self.type_tag())?;
        match self {
            OperationResult::PathPayment(res) => res.write(w),
            OperationResult::ManageOffer(res) => res.write(w),
            OperationResult::AllowTrust(res) => res.write(w),
        }
    }

    fn read<R: Read>(r: &mut R) -> io::Result<Self>
    where
        Self: Sized,
    {
        match read_u32(r)? {
            0 => Ok(OperationResult::PathPayment(PathPaymentResult::read(r)?)),
            1 => Ok(OperationResult::ManageOffer(ManageOfferResult::read(r)?)),
            2 => Ok(OperationResult::AllowTrust(AllowTrustResult::read(r)?)),
            _ => Err(bad_data("invalid operation result type")),
        }
    }
}

impl Serializable for TransactionResult {
    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.fee_charged.to_be_bytes())?;
        w.write_all(&(self.code as i32).to_be_bytes())?;
        // operation results exist only when the operations ran
        match self.code {
            TxResultCode::Success | TxResultCode::Failed => {
                write_vec(w, &self.results)
            }
            _ => Ok(()),
        }
    }

    fn read<R: Read>(r: &mut R) -> io::Result<Self>
    where
        Self: Sized,
    {
        let fee_charged = Self::read_i64_be(r)?;
        let code = TxResultCode::from_i32(Self::read_i32_be(r)?)
            .ok_or_else(|| bad_data("invalid transaction result code"))?;
        let results = match code {
            TxResultCode::Success | TxResultCode::Failed => read_vec(r)?,
            _ => vec![],
        };

        Ok(TransactionResult {
            fee_charged,
            code,
            results,
        })
    }
}

impl Serializable for Message {
    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        match self {
            Message::Transaction(env) => {
                write_u32(w, 0)?;
                env.write(w)
            }
            Message::ConsensusValue { ledger_seq, value } => {
                write_u32(w, 1)?;
                write_u32(w, *ledger_seq)?;
                Self::write_var_bytes32(w, value)
            }
        }
    }

    fn read<R: Read>(r: &mut R) -> io::Result<Self>
    where
        Self: Sized,
    {
        match read_u32(r)? {
            0 => Ok(Message::Transaction(TransactionEnvelope::read(r)?)),
            1 => Ok(Message::ConsensusValue {
                ledger_seq: read_u32(r)?,
                value: Self::read_var_bytes32(r)?,
            }),
            _ => Err(bad_data("invalid message topic")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::faker::{gen_account_id, keypair_from_seed};
    use crate::ledger::faker::{gen_path_payment, signed_envelope};
    use fake::{Fake, Faker};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Asserts that encoding/decoding of a serializable value round-trips.
    fn assert_serializable<S: Eq + Serializable + std::fmt::Debug>(obj: &S) {
        let mut buf = vec![];
        obj.write(&mut buf).expect("should be writable");

        let decoded =
            S::read(&mut &buf.to_vec()[..]).expect("should be readable");
        assert_eq!(*obj, decoded);
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(0xF00D)
    }

    fn gen_hash(rng: &mut StdRng) -> crate::ledger::Hash {
        let mut hash = [0u8; 32];
        rand::RngCore::fill_bytes(rng, &mut hash);
        hash
    }

    fn gen_usd(rng: &mut StdRng) -> Asset {
        Asset::alphanum4("USD", gen_account_id(rng)).expect("valid code")
    }

    fn gen_offer(rng: &mut StdRng) -> OfferEntry {
        OfferEntry {
            seller_id: gen_account_id(rng),
            offer_id: Faker.fake(),
            selling: gen_usd(rng),
            buying: Asset::Native,
            amount: (1..1_000_000i64).fake(),
            price: Price::new((1..1000i32).fake(), (1..1000i32).fake()),
            flags: 0,
        }
    }

    #[test]
    fn test_encoding_asset() {
        let mut rng = rng();
        assert_serializable(&Asset::Native);
        assert_serializable(&gen_usd(&mut rng));
        assert_serializable(
            &Asset::alphanum12("LONGCODE12", gen_account_id(&mut rng))
                .expect("valid code"),
        );
    }

    #[test]
    fn test_encoding_entries() {
        let mut rng = rng();

        let account = AccountEntry {
            account_id: gen_account_id(&mut rng),
            balance: (0..i64::MAX).fake(),
            seq_num: Faker.fake(),
            num_sub_entries: 3,
            flags: 1,
            thresholds: [1, 0, 5, 200],
            signers: vec![Signer {
                key: gen_account_id(&mut rng),
                weight: 1,
            }],
        };
        assert_serializable(&account);

        let trustline = TrustlineEntry {
            account_id: gen_account_id(&mut rng),
            asset: gen_usd(&mut rng),
            balance: 250,
            limit: 10_000,
            flags: 1,
        };
        assert_serializable(&trustline);

        let offer = gen_offer(&mut rng);
        assert_serializable(&offer);

        for entry in [
            LedgerEntry::Account(account),
            LedgerEntry::Trustline(trustline),
            LedgerEntry::Offer(offer),
        ] {
            assert_serializable(&entry);
            assert_serializable(&entry.key());
        }
    }

    #[test]
    fn test_encoding_header() {
        let mut rng = rng();
        let mut header = LedgerHeader {
            ledger_version: 1,
            previous_ledger_hash: gen_hash(&mut rng),
            tx_set_hash: gen_hash(&mut rng),
            close_time: Faker.fake(),
            total_coins: (0..i64::MAX).fake(),
            fee_pool: (0..i64::MAX).fake(),
            ledger_seq: Faker.fake(),
            id_pool: Faker.fake(),
            base_fee: 10,
            base_reserve: 10_000_000,
            hash: [0; 32],
        };
        header.finalize_hash();
        assert_serializable(&header);
    }

    #[test]
    fn test_encoding_envelope() {
        let mut rng = rng();
        let (sk, _) = keypair_from_seed([9; 32]);
        let network_id = gen_hash(&mut rng);

        let dest = gen_account_id(&mut rng);
        let usd = gen_usd(&mut rng);
        let op = gen_path_payment(dest, Asset::Native, 250, usd, 50);
        let env = signed_envelope(&sk, &network_id, 7, 10, vec![op]);

        assert_serializable(&env);

        // the wire set keeps its insertion order through a round-trip
        let set = TransactionSet {
            previous_ledger_hash: gen_hash(&mut rng),
            txs: vec![env.clone(), env],
        };
        assert_serializable(&set);
    }

    #[test]
    fn test_encoding_operations() {
        let mut rng = rng();

        let manage = Operation {
            source: Some(gen_account_id(&mut rng)),
            body: OperationBody::ManageOffer(ManageOfferOp {
                selling: gen_usd(&mut rng),
                buying: Asset::Native,
                amount: 100,
                price: Price::new(5, 1),
                offer_id: 0,
            }),
        };
        assert_serializable(&manage);

        let allow = Operation {
            source: None,
            body: OperationBody::AllowTrust(AllowTrustOp {
                trustor: gen_account_id(&mut rng),
                asset: AllowTrustAsset::Code4(*b"USD\0"),
                authorize: true,
            }),
        };
        assert_serializable(&allow);
    }

    #[test]
    fn test_encoding_results() {
        let mut rng = rng();
        let atom = ClaimOfferAtom {
            seller_id: gen_account_id(&mut rng),
            offer_id: 42,
            asset_claimed: gen_usd(&mut rng),
            amount_claimed: 50,
            asset_sent: Asset::Native,
            amount_sent: 250,
        };
        assert_serializable(&atom);

        let success = PathPaymentResult::Success {
            offers: vec![atom.clone()],
            last: SimplePaymentResult {
                destination: gen_account_id(&mut rng),
                asset: gen_usd(&mut rng),
                amount: 50,
            },
        };
        assert_serializable(&success);
        assert_serializable(&PathPaymentResult::TooFewOffers);

        let manage = ManageOfferResult::Success {
            offers_claimed: vec![atom],
            effect: ManageOfferEffect::Created(gen_offer(&mut rng)),
        };
        assert_serializable(&manage);
        assert_serializable(&ManageOfferResult::CrossSelf);

        assert_serializable(&AllowTrustResult::TrustNotRequired);

        let tx_result = TransactionResult {
            fee_charged: 10,
            code: TxResultCode::Failed,
            results: vec![OperationResult::PathPayment(
                PathPaymentResult::Underfunded,
            )],
        };
        assert_serializable(&tx_result);

        // codes without operation results drop the vector on the wire
        let bad_seq = TransactionResult {
            fee_charged: 0,
            code: TxResultCode::BadSeq,
            results: vec![],
        };
        assert_serializable(&bad_seq);
    }

    #[test]
    fn test_encoding_var_bytes_padding() {
        // 5 bytes of payload must round-trip through 3 pad bytes
        struct Blob(Vec<u8>);
        impl Serializable for Blob {
            fn write<W: std::io::Write>(
                &self,
                w: &mut W,
            ) -> io::Result<()> {
                Self::write_var_bytes32(w, &self.0)
            }
            fn read<R: std::io::Read>(r: &mut R) -> io::Result<Self> {
                Ok(Blob(Self::read_var_bytes32(r)?))
            }
        }

        let blob = Blob(vec![1, 2, 3, 4, 5]);
        let bytes = blob.to_bytes();
        assert_eq!(bytes.len(), 4 + 5 + 3);

        let back = Blob::read(&mut &bytes[..]).expect("should be readable");
        assert_eq!(back.0, vec![1, 2, 3, 4, 5]);
    }
}
