//! Cell implementation
//!
//! A cell is the atomic node of the chain's data model: up to 1023 bits of
//! data plus up to 4 references to other cells. Cells are frozen once built;
//! hash and depth are pure functions of the content and are memoized.

use anyhow::{Result, bail};
use sha2::{Digest, Sha256};
use std::sync::{Arc, OnceLock};

/// Maximum number of bits a cell can store
pub const MAX_CELL_BITS: usize = 1023;

/// Maximum number of references a cell can have
pub const MAX_CELL_REFS: usize = 4;

/// An immutable cell: bit data plus ordered child references
#[derive(Debug)]
pub struct Cell {
    /// Cell data as bytes (last byte possibly partial)
    data: Vec<u8>,
    /// Number of bits in the cell (not necessarily a multiple of 8)
    bit_len: usize,
    /// References to other cells, in semantic order
    references: Vec<Arc<Cell>>,
    hash: OnceLock<[u8; 32]>,
    depth: OnceLock<u16>,
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.bit_len == other.bit_len
            && self.data == other.data
            && self.references == other.references
    }
}

impl Eq for Cell {}

impl Cell {
    /// Creates a leaf cell with the given data and bit length
    pub fn with_data(data: Vec<u8>, bit_len: usize) -> Result<Self> {
        Self::with_refs(data, bit_len, Vec::new())
    }

    /// Creates a cell with data and child references
    pub fn with_refs(data: Vec<u8>, bit_len: usize, references: Vec<Arc<Cell>>) -> Result<Self> {
        if bit_len > MAX_CELL_BITS {
            bail!(
                "Cell bit length {} exceeds maximum {}",
                bit_len,
                MAX_CELL_BITS
            );
        }
        if data.len() < bit_len.div_ceil(8) {
            bail!(
                "Data length {} is insufficient for {} bits",
                data.len(),
                bit_len
            );
        }
        if references.len() > MAX_CELL_REFS {
            bail!(
                "Cell has {} references, maximum is {}",
                references.len(),
                MAX_CELL_REFS
            );
        }

        Ok(Self {
            data,
            bit_len,
            references,
            hash: OnceLock::new(),
            depth: OnceLock::new(),
        })
    }

    /// Returns the cell's data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the number of bits in the cell
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Returns the cell's references
    pub fn references(&self) -> &[Arc<Cell>] {
        &self.references
    }

    /// Returns the number of references
    pub fn reference_count(&self) -> usize {
        self.references.len()
    }

    /// Gets a reference by index
    pub fn reference(&self, index: usize) -> Option<&Arc<Cell>> {
        self.references.get(index)
    }

    /// Computes the cell's descriptor pair
    ///
    /// First byte is the reference count. Second byte encodes the data
    /// length as `floor(b/8) + ceil(b/8)`: even for whole bytes, odd when a
    /// partial byte carries augmentation.
    pub fn descriptors(&self) -> [u8; 2] {
        let refs_descriptor = self.references.len() as u8;
        let bits_descriptor = (self.bit_len / 8 + self.bit_len.div_ceil(8)) as u8;
        [refs_descriptor, bits_descriptor]
    }

    /// Returns the byte-aligned data with the augmentation rule applied
    ///
    /// A partial final byte gets a single terminating 1-bit after the last
    /// data bit, then zeros. This output participates in hashing and BOC
    /// serialization; it is not plain zero padding.
    pub fn augmented_data(&self) -> Vec<u8> {
        let mut result = self.data[..self.bit_len.div_ceil(8)].to_vec();
        if self.bit_len % 8 != 0 {
            let last = result.len() - 1;
            result[last] |= 1 << (7 - self.bit_len % 8);
        }
        result
    }

    /// Computes the depth of the cell: 0 for a leaf, else 1 + max child depth
    pub fn depth(&self) -> u16 {
        *self.depth.get_or_init(|| {
            self.references
                .iter()
                .map(|r| r.depth() + 1)
                .max()
                .unwrap_or(0)
        })
    }

    /// Computes the representation hash of the cell
    ///
    /// SHA-256 over: descriptors, augmented data, then the depth of every
    /// reference (2-byte big-endian, all of them), then the hash of every
    /// reference (all of them). Depths and hashes are two separate passes,
    /// never interleaved per child.
    pub fn hash(&self) -> [u8; 32] {
        *self.hash.get_or_init(|| {
            let mut hasher = Sha256::new();
            hasher.update(self.descriptors());
            hasher.update(self.augmented_data());
            for reference in &self.references {
                hasher.update(reference.depth().to_be_bytes());
            }
            for reference in &self.references {
                hasher.update(reference.hash());
            }
            hasher.finalize().into()
        })
    }
}

/// Low-level builder appending fixed-width values to a growing bit sequence
///
/// Tracks the exact bit length; writing past [`MAX_CELL_BITS`] is an
/// immediate error, never a truncation. For coin amounts, addresses and
/// other composite values see [`Builder`](crate::tvm::Builder).
pub struct CellBuilder {
    data: Vec<u8>,
    bit_len: usize,
    references: Vec<Arc<Cell>>,
}

impl CellBuilder {
    /// Creates a new cell builder
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            bit_len: 0,
            references: Vec::new(),
        }
    }

    /// Returns the number of bits written so far
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Returns the number of references stored so far
    pub fn reference_count(&self) -> usize {
        self.references.len()
    }

    /// Stores a single bit
    pub fn store_bit(&mut self, bit: bool) -> Result<&mut Self> {
        if self.bit_len + 1 > MAX_CELL_BITS {
            bail!("Cannot store bit: cell capacity of {} bits exceeded", MAX_CELL_BITS);
        }
        if self.bit_len % 8 == 0 {
            self.data.push(0);
        }
        if bit {
            let last = self.data.len() - 1;
            self.data[last] |= 1 << (7 - self.bit_len % 8);
        }
        self.bit_len += 1;
        Ok(self)
    }

    /// Stores `bit_len` bits read MSB-first from a byte slice
    pub fn store_bits(&mut self, bits: &[u8], bit_len: usize) -> Result<&mut Self> {
        if self.bit_len + bit_len > MAX_CELL_BITS {
            bail!(
                "Cannot store {} bits: cell capacity of {} bits exceeded",
                bit_len,
                MAX_CELL_BITS
            );
        }
        if bits.len() < bit_len.div_ceil(8) {
            bail!("Insufficient data for {} bits", bit_len);
        }

        for i in 0..bit_len {
            let bit = (bits[i / 8] >> (7 - i % 8)) & 1 == 1;
            self.store_bit(bit)?;
        }
        Ok(self)
    }

    /// Stores a byte
    pub fn store_byte(&mut self, byte: u8) -> Result<&mut Self> {
        self.store_bits(&[byte], 8)
    }

    /// Stores multiple bytes
    pub fn store_bytes(&mut self, bytes: &[u8]) -> Result<&mut Self> {
        self.store_bits(bytes, bytes.len() * 8)
    }

    /// Stores a u32 value
    pub fn store_u32(&mut self, value: u32) -> Result<&mut Self> {
        self.store_bits(&value.to_be_bytes(), 32)
    }

    /// Stores a u64 value
    pub fn store_u64(&mut self, value: u64) -> Result<&mut Self> {
        self.store_bits(&value.to_be_bytes(), 64)
    }

    /// Stores the least significant `bits` of an unsigned value, MSB first
    pub fn store_uint(&mut self, value: u64, bits: usize) -> Result<&mut Self> {
        if bits > 64 {
            bail!("Cannot store more than 64 bits from u64");
        }
        for i in (0..bits).rev() {
            self.store_bit((value >> i) & 1 == 1)?;
        }
        Ok(self)
    }

    /// Stores a signed value in `bits` bits, two's complement
    pub fn store_int(&mut self, value: i64, bits: usize) -> Result<&mut Self> {
        if bits > 64 {
            bail!("Cannot store more than 64 bits from i64");
        }
        let mask = if bits == 64 { u64::MAX } else { (1u64 << bits) - 1 };
        self.store_uint((value as u64) & mask, bits)
    }

    /// Adds a reference to another cell
    pub fn store_reference(&mut self, cell: Arc<Cell>) -> Result<&mut Self> {
        if self.references.len() >= MAX_CELL_REFS {
            bail!(
                "Cannot add reference: maximum {} references allowed",
                MAX_CELL_REFS
            );
        }
        self.references.push(cell);
        Ok(self)
    }

    /// Freezes the builder into a cell
    pub fn build(self) -> Result<Arc<Cell>> {
        Ok(Arc::new(Cell::with_refs(
            self.data,
            self.bit_len,
            self.references,
        )?))
    }
}

impl Default for CellBuilder {
    fn default() -> Self {
        Self::new()
    }
}
