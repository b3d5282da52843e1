//! Slice implementation for reading data back out of cells
//!
//! A Slice walks a cell's bits and references sequentially. The transfer
//! path only writes cells; reading exists for BOC deserialization and for
//! round-trip verification in tests.

use crate::tvm::address::Address;
use crate::tvm::cell::Cell;
use anyhow::{Result, bail};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Slice {
    cell: Arc<Cell>,
    bit_pos: usize,
    ref_pos: usize,
}

impl Slice {
    /// Creates a new slice from a cell
    pub fn new(cell: Arc<Cell>) -> Self {
        Self {
            cell,
            bit_pos: 0,
            ref_pos: 0,
        }
    }

    /// Returns the number of remaining bits
    pub fn remaining_bits(&self) -> usize {
        self.cell.bit_len().saturating_sub(self.bit_pos)
    }

    /// Returns the number of remaining references
    pub fn remaining_refs(&self) -> usize {
        self.cell.reference_count().saturating_sub(self.ref_pos)
    }

    /// Checks whether both bits and references are exhausted
    pub fn is_empty(&self) -> bool {
        self.remaining_bits() == 0 && self.remaining_refs() == 0
    }

    /// Loads a single bit
    pub fn load_bit(&mut self) -> Result<bool> {
        if self.remaining_bits() == 0 {
            bail!("No more bits to read");
        }

        let byte_idx = self.bit_pos / 8;
        let bit_idx = 7 - (self.bit_pos % 8);
        let bit = (self.cell.data()[byte_idx] >> bit_idx) & 1;
        self.bit_pos += 1;

        Ok(bit == 1)
    }

    /// Loads `n` bits into a byte vector, MSB-aligned
    pub fn load_bits(&mut self, n: usize) -> Result<Vec<u8>> {
        if n > self.remaining_bits() {
            bail!(
                "Not enough bits remaining: requested {}, available {}",
                n,
                self.remaining_bits()
            );
        }

        let mut result = vec![0u8; n.div_ceil(8)];
        for i in 0..n {
            if self.load_bit()? {
                result[i / 8] |= 1 << (7 - i % 8);
            }
        }
        Ok(result)
    }

    /// Loads a byte
    pub fn load_byte(&mut self) -> Result<u8> {
        Ok(self.load_bits(8)?[0])
    }

    /// Loads multiple bytes
    pub fn load_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        self.load_bits(n * 8)
    }

    /// Loads a u32 value
    pub fn load_u32(&mut self) -> Result<u32> {
        Ok(self.load_uint(32)? as u32)
    }

    /// Loads a u64 value
    pub fn load_u64(&mut self) -> Result<u64> {
        self.load_uint(64)
    }

    /// Loads an unsigned integer of `bits` bits
    pub fn load_uint(&mut self, bits: usize) -> Result<u64> {
        if bits > 64 {
            bail!("Cannot load more than 64 bits into u64");
        }
        let mut result = 0u64;
        for _ in 0..bits {
            result = (result << 1) | self.load_bit()? as u64;
        }
        Ok(result)
    }

    /// Loads a two's-complement signed integer of `bits` bits
    pub fn load_int(&mut self, bits: usize) -> Result<i64> {
        if bits == 0 {
            return Ok(0);
        }
        let unsigned = self.load_uint(bits)?;
        let sign_bit = 1u64 << (bits - 1);
        if bits < 64 && unsigned & sign_bit != 0 {
            Ok((unsigned | !0u64 << bits) as i64)
        } else {
            Ok(unsigned as i64)
        }
    }

    /// Loads a coin amount (4-bit length header, big-endian magnitude)
    pub fn load_coins(&mut self) -> Result<u128> {
        let len = self.load_uint(4)? as usize;
        let mut result = 0u128;
        for byte in self.load_bytes(len)? {
            result = (result << 8) | byte as u128;
        }
        Ok(result)
    }

    /// Loads an address: `None` for the 2-bit empty tag, a full address for
    /// the `10` internal tag
    pub fn load_address(&mut self) -> Result<Option<Address>> {
        match self.load_uint(2)? {
            0b00 => Ok(None),
            0b10 => {
                if self.load_bit()? {
                    bail!("Anycast addresses are not supported");
                }
                let workchain = self.load_int(8)? as i8;
                let mut hash_part = [0u8; 32];
                hash_part.copy_from_slice(&self.load_bytes(32)?);
                Ok(Some(Address::new(workchain, hash_part)))
            }
            tag => bail!("Unsupported address tag: 0b{tag:02b}"),
        }
    }

    /// Loads the next reference
    pub fn load_reference(&mut self) -> Result<Arc<Cell>> {
        if self.remaining_refs() == 0 {
            bail!("No more references to read");
        }
        let reference = self
            .cell
            .reference(self.ref_pos)
            .ok_or_else(|| anyhow::anyhow!("Reference not found"))?
            .clone();
        self.ref_pos += 1;
        Ok(reference)
    }

    /// Skips `n` bits
    pub fn skip_bits(&mut self, n: usize) -> Result<&mut Self> {
        if n > self.remaining_bits() {
            bail!(
                "Cannot skip {} bits: only {} remaining",
                n,
                self.remaining_bits()
            );
        }
        self.bit_pos += n;
        Ok(self)
    }

    /// Loads all remaining bits
    pub fn load_remaining_bits(&mut self) -> Result<Vec<u8>> {
        self.load_bits(self.remaining_bits())
    }

    /// Gets the underlying cell
    pub fn cell(&self) -> &Arc<Cell> {
        &self.cell
    }
}

impl From<Arc<Cell>> for Slice {
    fn from(cell: Arc<Cell>) -> Self {
        Self::new(cell)
    }
}
