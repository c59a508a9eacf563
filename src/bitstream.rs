use bitvec::prelude::*;

use crate::error::{Result, ensure_stream};

/// Bytes needed to hold `bits` bits.
pub fn packed_len(bits: u64) -> u64 {
    bits.div_ceil(8)
}

/// Accumulates code words MSB-first.
#[derive(Debug, Default)]
pub struct BitWriter {
    bits: BitVec<u8, Msb0>,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bits: usize) -> Self {
        Self {
            bits: BitVec::with_capacity(bits),
        }
    }

    pub fn write(&mut self, code: &BitSlice<u8, Msb0>) {
        self.bits.extend_from_bitslice(code);
    }

    pub fn bit_count(&self) -> u64 {
        self.bits.len() as u64
    }

    /// Packed bytes, with the last partial byte padded by zero bits.
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.bits.set_uninitialized(false);
        self.bits.into_vec()
    }
}

/// Reads back exactly `bit_count` bits from a packed payload; padding past
/// that point is never yielded.
#[derive(Debug)]
pub struct BitReader<'a> {
    bits: &'a BitSlice<u8, Msb0>,
    pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(bytes: &'a [u8], bit_count: u64) -> Result<Self> {
        ensure_stream!(
            packed_len(bit_count) == bytes.len() as u64,
            "payload holds {} bytes, {} bits need {}",
            bytes.len(),
            bit_count,
            packed_len(bit_count)
        );

        // bit_count fits: it is bounded by the slice length checked above
        let bits = &bytes.view_bits::<Msb0>()[..bit_count as usize];
        Ok(Self { bits, pos: 0 })
    }

    pub fn read(&mut self) -> Option<bool> {
        let bit = self.bits.get(self.pos).map(|bit| *bit)?;
        self.pos += 1;
        Some(bit)
    }

    pub fn remaining(&self) -> usize {
        self.bits.len() - self.pos
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }
}
