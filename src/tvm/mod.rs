//! Cell-level data structures and codecs
//!
//! This module holds the binary foundation every message is built on:
//! - Cell: up to 1023 bits of data plus up to 4 references
//! - CellBuilder / Builder: bit-exact writers, low- and high-level
//! - Slice: a sequential reader over a cell
//! - BOC: the Bag-of-Cells wire container
//! - Address: textual address forms and the internal representation

pub mod address;
pub mod boc;
pub mod builder;
pub mod cell;
pub mod slice;

pub use address::Address;
pub use boc::{base64_to_boc, boc_to_base64, boc_to_hex, deserialize_boc, hex_to_boc, serialize_boc};
pub use builder::Builder;
pub use cell::{Cell, CellBuilder, MAX_CELL_BITS, MAX_CELL_REFS};
pub use slice::Slice;
