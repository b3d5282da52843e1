//! High-level builder with composite store operations
//!
//! Wraps the low-level [`CellBuilder`] with the composite encodings message
//! construction needs: coin amounts, addresses, optional references and
//! short text. Use [`CellBuilder`] directly for plain bit/byte sequences.

use crate::tvm::address::Address;
use crate::tvm::cell::{Cell, CellBuilder, MAX_CELL_BITS, MAX_CELL_REFS};
use crate::tvm::slice::Slice;
use anyhow::{Result, bail};
use std::sync::Arc;

pub struct Builder {
    inner: CellBuilder,
}

impl Builder {
    /// Creates a new builder
    pub fn new() -> Self {
        Self {
            inner: CellBuilder::new(),
        }
    }

    /// Returns the number of bits written so far
    pub fn bit_len(&self) -> usize {
        self.inner.bit_len()
    }

    /// Returns the number of bits still available
    pub fn available_bits(&self) -> usize {
        MAX_CELL_BITS - self.bit_len()
    }

    /// Returns the number of references stored so far
    pub fn ref_count(&self) -> usize {
        self.inner.reference_count()
    }

    /// Returns the number of references still available
    pub fn available_refs(&self) -> usize {
        MAX_CELL_REFS - self.ref_count()
    }

    /// Stores a single bit
    pub fn store_bit(&mut self, bit: bool) -> Result<&mut Self> {
        self.inner.store_bit(bit)?;
        Ok(self)
    }

    /// Stores bits from a byte slice
    pub fn store_bits(&mut self, bits: &[u8], bit_len: usize) -> Result<&mut Self> {
        self.inner.store_bits(bits, bit_len)?;
        Ok(self)
    }

    /// Stores multiple bytes
    pub fn store_bytes(&mut self, bytes: &[u8]) -> Result<&mut Self> {
        self.inner.store_bytes(bytes)?;
        Ok(self)
    }

    /// Stores a u32 value
    pub fn store_u32(&mut self, value: u32) -> Result<&mut Self> {
        self.inner.store_u32(value)?;
        Ok(self)
    }

    /// Stores a u64 value
    pub fn store_u64(&mut self, value: u64) -> Result<&mut Self> {
        self.inner.store_u64(value)?;
        Ok(self)
    }

    /// Stores an unsigned integer with a specific bit length
    pub fn store_uint(&mut self, value: u64, bits: usize) -> Result<&mut Self> {
        self.inner.store_uint(value, bits)?;
        Ok(self)
    }

    /// Stores a signed integer with a specific bit length
    pub fn store_int(&mut self, value: i64, bits: usize) -> Result<&mut Self> {
        self.inner.store_int(value, bits)?;
        Ok(self)
    }

    /// Stores a reference to another cell
    pub fn store_ref(&mut self, cell: Arc<Cell>) -> Result<&mut Self> {
        self.inner.store_reference(cell)?;
        Ok(self)
    }

    /// Stores an optional reference: presence bit, then the reference
    pub fn store_maybe_ref(&mut self, cell: Option<Arc<Cell>>) -> Result<&mut Self> {
        match cell {
            Some(c) => {
                self.store_bit(true)?;
                self.store_ref(c)?;
            }
            None => {
                self.store_bit(false)?;
            }
        }
        Ok(self)
    }

    /// Stores a coin amount as a variable-length integer
    ///
    /// A 4-bit byte-length header, 0 for a zero amount, then that many
    /// big-endian magnitude bytes. This is the chain's native coin
    /// serialization; it is never a fixed-width field.
    pub fn store_coins(&mut self, amount: u128) -> Result<&mut Self> {
        if amount == 0 {
            return self.store_uint(0, 4);
        }

        let byte_len = ((128 - amount.leading_zeros()) as usize).div_ceil(8);
        if byte_len > 15 {
            bail!("Coin amount too large for a 4-bit length header");
        }

        self.store_uint(byte_len as u64, 4)?;
        let bytes = amount.to_be_bytes();
        self.store_bytes(&bytes[16 - byte_len..])?;
        Ok(self)
    }

    /// Stores the empty-address tag
    pub fn store_address_none(&mut self) -> Result<&mut Self> {
        self.store_uint(0b00, 2)
    }

    /// Stores an internal address, or the empty-address tag for `None`
    ///
    /// Layout: 2-bit `10` tag, 1-bit anycast-absent flag, 8-bit workchain,
    /// 256-bit hash.
    pub fn store_address(&mut self, address: Option<&Address>) -> Result<&mut Self> {
        match address {
            None => {
                self.store_address_none()?;
            }
            Some(addr) => {
                self.store_uint(0b10, 2)?;
                self.store_bit(false)?; // no anycast
                self.store_int(addr.workchain as i64, 8)?;
                self.store_bytes(&addr.hash_part)?;
            }
        }
        Ok(self)
    }

    /// Stores a short string (at most 127 bytes)
    pub fn store_string(&mut self, s: &str) -> Result<&mut Self> {
        let bytes = s.as_bytes();
        if bytes.len() > 127 {
            bail!("String of {} bytes exceeds single-cell limit", bytes.len());
        }
        self.store_bytes(bytes)
    }

    /// Freezes the builder into a cell
    pub fn build(self) -> Result<Arc<Cell>> {
        self.inner.build()
    }

    /// Freezes the builder and opens a reader over the result
    pub fn to_slice(self) -> Result<Slice> {
        Ok(Slice::new(self.build()?))
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_address() {
        let addr = Address::new(0, [0u8; 32]);
        let mut builder = Builder::new();
        builder.store_address(Some(&addr)).unwrap();

        let cell = builder.build().unwrap();
        // 2 (tag) + 1 (anycast) + 8 (workchain) + 256 (hash)
        assert_eq!(cell.bit_len(), 267);
    }

    #[test]
    fn test_builder_address_none() {
        let mut builder = Builder::new();
        builder.store_address(None).unwrap();
        let cell = builder.build().unwrap();
        assert_eq!(cell.bit_len(), 2);
        assert_eq!(cell.data(), &[0x00]);
    }

    #[test]
    fn test_builder_coins_zero() {
        let mut builder = Builder::new();
        builder.store_coins(0).unwrap();
        let cell = builder.build().unwrap();
        assert_eq!(cell.bit_len(), 4);
        assert_eq!(cell.data(), &[0x00]);
    }

    #[test]
    fn test_builder_coins_one_ton() {
        let mut builder = Builder::new();
        builder.store_coins(1_000_000_000).unwrap();
        let cell = builder.build().unwrap();

        // length header 4 + 4 value bytes
        assert_eq!(cell.bit_len(), 4 + 32);
        let mut slice = Slice::new(cell);
        assert_eq!(slice.load_coins().unwrap(), 1_000_000_000);
    }

    #[test]
    fn test_builder_coins_round_trip() {
        for amount in [1u128, 255, 256, 0xFFFF_FFFF, 1_500_000_000, u64::MAX as u128] {
            let mut builder = Builder::new();
            builder.store_coins(amount).unwrap();
            let mut slice = builder.to_slice().unwrap();
            assert_eq!(slice.load_coins().unwrap(), amount);
        }
    }

    #[test]
    fn test_builder_maybe_ref() {
        let leaf = Builder::new().build().unwrap();

        let mut with = Builder::new();
        with.store_maybe_ref(Some(leaf)).unwrap();
        let with = with.build().unwrap();
        assert_eq!(with.bit_len(), 1);
        assert_eq!(with.reference_count(), 1);

        let mut without = Builder::new();
        without.store_maybe_ref(None).unwrap();
        let without = without.build().unwrap();
        assert_eq!(without.bit_len(), 1);
        assert_eq!(without.reference_count(), 0);
    }

    #[test]
    fn test_builder_string() {
        let mut builder = Builder::new();
        builder.store_string("Hello!").unwrap();
        let cell = builder.build().unwrap();
        assert_eq!(cell.bit_len(), 6 * 8);
    }
}
