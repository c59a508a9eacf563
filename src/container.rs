//! Compressed artifact layout.
//!
//! ```text
//! magic "HUFP" | version u8 | distinct u16 | distinct x (symbol u8, freq u64)
//!     | bit count u64 | payload
//! ```
//!
//! Integers are big-endian. The frequency pairs are enough to rebuild the
//! tree; the bit count marks where the payload's meaningful bits end.

use crate::error::{Result, ensure_stream};
use crate::frequency::FrequencyTable;

pub const MAGIC: &[u8; 4] = b"HUFP";
pub const VERSION: u8 = 1;

const MAX_DISTINCT: usize = 256;
const PAIR_LEN: usize = 9;

/// Keeps every weight sum and `weight * depth` product inside a `u64`.
const MAX_TOTAL: u64 = u64::MAX >> 9;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Header {
    pub freqs: FrequencyTable,
    pub bit_count: u64,
}

impl Header {
    pub fn encoded_len(&self) -> usize {
        MAGIC.len() + 1 + 2 + self.freqs.len() * PAIR_LEN + 8
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.reserve(self.encoded_len());
        out.extend_from_slice(MAGIC);
        out.push(VERSION);
        // at most 256 distinct byte values
        out.extend_from_slice(&(self.freqs.len() as u16).to_be_bytes());
        for (symbol, freq) in self.freqs.iter() {
            out.push(symbol);
            out.extend_from_slice(&freq.to_be_bytes());
        }
        out.extend_from_slice(&self.bit_count.to_be_bytes());
    }
}

/// Splits an artifact into its header and payload bytes.
#[derive(Debug)]
pub struct Reader<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    pub fn parse_header(&mut self) -> Result<Header> {
        ensure_stream!(self.pos == 0, "header already parsed");

        let magic = self.read_bytes(MAGIC.len())?;
        ensure_stream!(
            magic == MAGIC,
            "invalid magic: expected {:02x?}, got {:02x?}",
            MAGIC,
            magic
        );

        let version = self.read_byte()?;
        ensure_stream!(version == VERSION, "unsupported version: {}", version);

        let distinct = self.read_u16()? as usize;
        ensure_stream!(
            distinct <= MAX_DISTINCT,
            "{} distinct symbols exceeds {}",
            distinct,
            MAX_DISTINCT
        );

        let mut pairs = Vec::with_capacity(distinct);
        for _ in 0..distinct {
            let symbol = self.read_byte()?;
            let freq = self.read_u64()?;
            pairs.push((symbol, freq));
        }

        let total = pairs
            .iter()
            .try_fold(0u64, |acc, &(_, freq)| acc.checked_add(freq))
            .filter(|&total| total <= MAX_TOTAL);
        ensure_stream!(total.is_some(), "symbol count too large");

        let freqs = FrequencyTable::from_pairs(pairs)?;
        let bit_count = self.read_u64()?;

        Ok(Header { freqs, bit_count })
    }

    /// Everything after the header.
    pub fn payload(&self) -> &'a [u8] {
        &self.input[self.pos..]
    }

    fn read_byte(&mut self) -> Result<u8> {
        let bytes = self.read_bytes(1)?;
        Ok(bytes[0])
    }

    fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn read_u64(&mut self) -> Result<u64> {
        let bytes = self.read_bytes(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(bytes);
        Ok(u64::from_be_bytes(buf))
    }

    fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        ensure_stream!(
            self.pos + count <= self.input.len(),
            "unexpected end of header: need {} bytes at offset {}, have {}",
            count,
            self.pos,
            self.input.len()
        );
        let bytes = &self.input[self.pos..self.pos + count];
        self.pos += count;
        Ok(bytes)
    }
}
