// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) LUMEN NETWORK. All rights reserved.

#![deny(unused_crate_dependencies)]
#![deny(unused_extern_crates)]

pub mod encoding;
pub mod keys;
pub mod ledger;
pub mod message;

use std::io::{self, Read, Write};

/// Canonical binary encoding of all wire and hash-input types.
///
/// The encoding is XDR: big-endian fixed-width integers, `u32` tags for
/// unions and booleans, and variable-length opaques carrying a `u32`
/// length prefix padded with zero bytes to a four-byte boundary. Every
/// content hash in the protocol is computed over these bytes, so two
/// nodes must produce them bit-for-bit identically.
pub trait Serializable {
    fn write<W: Write>(&self, w: &mut W) -> io::Result<()>;
    fn read<R: Read>(r: &mut R) -> io::Result<Self>
    where
        Self: Sized;

    /// Encodes `self` into a fresh buffer.
    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![];
        self.write(&mut buf).expect("write to vec should not fail");
        buf
    }

    fn read_bytes<R: Read, const N: usize>(r: &mut R) -> io::Result<[u8; N]> {
        let mut buffer = [0u8; N];
        r.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    fn read_u32_be<R: Read>(r: &mut R) -> io::Result<u32> {
        let data = Self::read_bytes(r)?;
        Ok(u32::from_be_bytes(data))
    }

    fn read_i32_be<R: Read>(r: &mut R) -> io::Result<i32> {
        let data = Self::read_bytes(r)?;
        Ok(i32::from_be_bytes(data))
    }

    fn read_u64_be<R: Read>(r: &mut R) -> io::Result<u64> {
        let data = Self::read_bytes(r)?;
        Ok(u64::from_be_bytes(data))
    }

    fn read_i64_be<R: Read>(r: &mut R) -> io::Result<i64> {
        let data = Self::read_bytes(r)?;
        Ok(i64::from_be_bytes(data))
    }

    fn write_bool<W: Write>(w: &mut W, b: bool) -> io::Result<()> {
        w.write_all(&(b as u32).to_be_bytes())
    }

    fn read_bool<R: Read>(r: &mut R) -> io::Result<bool> {
        match Self::read_u32_be(r)? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "invalid boolean tag",
            )),
        }
    }

    /// Writes a length-prefixed opaque, zero-padded to a 4-byte boundary.
    fn write_var_bytes32<W: Write>(w: &mut W, buf: &[u8]) -> io::Result<()> {
        let len = buf.len() as u32;
        w.write_all(&len.to_be_bytes())?;
        w.write_all(buf)?;
        let pad = (4 - buf.len() % 4) % 4;
        w.write_all(&[0u8; 3][..pad])?;
        Ok(())
    }

    /// Reads a length-prefixed opaque and its padding.
    fn read_var_bytes32<R: Read>(r: &mut R) -> io::Result<Vec<u8>> {
        let len = Self::read_u32_be(r)? as usize;
        if len > MAX_OPAQUE_LEN {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "opaque length out of bounds",
            ));
        }

        let mut buf = vec![0u8; len];
        r.read_exact(&mut buf)?;

        let pad = (4 - len % 4) % 4;
        let mut scratch = [0u8; 3];
        r.read_exact(&mut scratch[..pad])?;

        Ok(buf)
    }

    fn write_string<W: Write>(w: &mut W, s: &str) -> io::Result<()> {
        Self::write_var_bytes32(w, s.as_bytes())
    }

    fn read_string<R: Read>(r: &mut R) -> io::Result<String> {
        let buf = Self::read_var_bytes32(r)?;
        String::from_utf8(buf)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "invalid utf-8"))
    }
}

/// Upper bound accepted for any single variable-length opaque.
const MAX_OPAQUE_LEN: usize = 1024 * 1024;

impl<const N: usize> Serializable for [u8; N] {
    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self[..])
    }

    fn read<R: Read>(r: &mut R) -> io::Result<Self>
    where
        Self: Sized,
    {
        Self::read_bytes(r)
    }
}

pub fn serialize_hex<const N: usize, S>(
    t: &[u8; N],
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let hex = hex::encode(t);
    serializer.serialize_str(&hex)
}
