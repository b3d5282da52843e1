//! Bag of Cells (BOC) serialization and deserialization
//!
//! The BOC container is the canonical wire encoding of a cell graph. The
//! serializer walks the graph in pre-order, deduplicating by reference
//! identity, so the root always lands at index 0 and every child index
//! points forward. Reference indices are one byte and the total-size field
//! is two bytes, which bounds a single container at 255 cells — far above
//! anything a transfer produces, and exceeding it is a loud error.

use crate::tvm::cell::Cell;
use anyhow::{Result, bail};
use base64::Engine;
use std::collections::HashMap;
use std::sync::Arc;

/// BOC magic number for the generic format
const BOC_GENERIC_MAGIC: u32 = 0xb5ee9c72;

/// Serializes a cell graph into a BOC container
pub fn serialize_boc(root: &Arc<Cell>, has_crc32: bool) -> Result<Vec<u8>> {
    let cells = collect_cells(root);
    if cells.len() > 255 {
        bail!(
            "Cell graph of {} cells exceeds the 1-byte index space",
            cells.len()
        );
    }

    let mut index_of = HashMap::new();
    for (idx, cell) in cells.iter().enumerate() {
        index_of.insert(Arc::as_ptr(cell) as usize, idx);
    }

    let mut payload = Vec::new();
    for cell in &cells {
        payload.extend_from_slice(&cell.descriptors());
        payload.extend_from_slice(&cell.augmented_data());
        for reference in cell.references() {
            // Present by construction: every reachable cell was collected
            let ref_idx = index_of[&(Arc::as_ptr(reference) as usize)];
            payload.push(ref_idx as u8);
        }
    }
    if payload.len() > u16::MAX as usize {
        bail!("BOC payload of {} bytes exceeds the 2-byte size field", payload.len());
    }

    let mut result = Vec::with_capacity(payload.len() + 16);
    result.extend_from_slice(&BOC_GENERIC_MAGIC.to_be_bytes());

    // flags: no index table, 1-byte reference indices, optional CRC32
    let flags = if has_crc32 { 0x40u8 } else { 0x00u8 };
    result.push(flags | 0x01);
    result.push(0x02); // offset size: 2-byte total-size field
    result.push(cells.len() as u8);
    result.push(1); // root count
    result.push(0); // absent count
    result.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    result.push(0); // root index: pre-order puts the root first
    result.extend_from_slice(&payload);

    if has_crc32 {
        let crc = crate::crc::CRC32.checksum(&result);
        result.extend_from_slice(&crc.to_le_bytes());
    }

    Ok(result)
}

/// Deserializes a BOC container back into its root cell
///
/// Accepts the generic format with any size/offset field widths, an
/// optional index table and an optional CRC32 tail, so foreign containers
/// (contract code, fixtures) parse too. The exact inverse of
/// [`serialize_boc`] for everything this crate produces.
pub fn deserialize_boc(data: &[u8]) -> Result<Arc<Cell>> {
    if data.len() < 11 {
        bail!("BOC data too short: {} bytes", data.len());
    }

    let magic = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
    if magic != BOC_GENERIC_MAGIC {
        bail!("Invalid BOC magic number: 0x{magic:08x}");
    }

    let mut pos = 4;
    let flags = read_byte(data, &mut pos)?;
    let has_idx = flags & 0x80 != 0;
    let has_crc32 = flags & 0x40 != 0;
    let size_bytes = (flags & 0x07) as usize;
    if size_bytes == 0 || size_bytes > 8 {
        bail!("Invalid reference index width: {size_bytes}");
    }

    let offset_bytes = read_byte(data, &mut pos)? as usize;
    if offset_bytes == 0 || offset_bytes > 8 {
        bail!("Invalid offset width: {offset_bytes}");
    }

    let cells_count = read_uint(data, &mut pos, size_bytes)?;
    let roots_count = read_uint(data, &mut pos, size_bytes)?;
    if roots_count != 1 {
        bail!("Expected a single root, got {roots_count}");
    }
    let absent_count = read_uint(data, &mut pos, size_bytes)?;
    if absent_count != 0 {
        bail!("Absent cells are not supported");
    }
    let cells_size = read_uint(data, &mut pos, offset_bytes)?;
    let root_idx = read_uint(data, &mut pos, size_bytes)?;

    if has_idx {
        // Per-cell offset table; nothing in it we need
        pos += cells_count * offset_bytes;
    }

    let crc_len = if has_crc32 { 4 } else { 0 };
    if pos + cells_size + crc_len > data.len() {
        bail!("BOC payload exceeds container size");
    }

    if has_crc32 {
        let crc_pos = pos + cells_size;
        let expected = u32::from_le_bytes([
            data[crc_pos],
            data[crc_pos + 1],
            data[crc_pos + 2],
            data[crc_pos + 3],
        ]);
        let actual = crate::crc::CRC32.checksum(&data[..crc_pos]);
        if expected != actual {
            bail!("BOC checksum mismatch: expected 0x{expected:08x}, computed 0x{actual:08x}");
        }
    }

    let cells = parse_cells(&data[pos..pos + cells_size], cells_count, size_bytes)?;
    cells
        .into_iter()
        .nth(root_idx)
        .ok_or_else(|| anyhow::anyhow!("Root index {root_idx} out of range"))
}

fn parse_cells(data: &[u8], count: usize, size_bytes: usize) -> Result<Vec<Arc<Cell>>> {
    struct RawCell {
        data: Vec<u8>,
        bit_len: usize,
        refs: Vec<usize>,
    }

    let mut raw = Vec::with_capacity(count);
    let mut pos = 0;

    for idx in 0..count {
        let d1 = read_byte(data, &mut pos)?;
        let d2 = read_byte(data, &mut pos)?;

        if d1 & 0x08 != 0 {
            bail!("Exotic cells are not supported");
        }
        let ref_count = (d1 & 0x07) as usize;

        // d2 = floor(b/8) + ceil(b/8); odd means an augmented partial byte
        let data_size = (d2 as usize).div_ceil(2);
        if pos + data_size > data.len() {
            bail!("Cell data exceeds payload");
        }
        let cell_data = data[pos..pos + data_size].to_vec();
        pos += data_size;

        let bit_len = if d2 % 2 == 0 {
            data_size * 8
        } else {
            // Strip the augmentation: the lowest set bit of the last byte
            // is the terminator, everything above it is data
            let last = cell_data[data_size - 1];
            if last == 0 {
                bail!("Augmented partial byte has no terminator bit");
            }
            data_size * 8 - 1 - last.trailing_zeros() as usize
        };

        let mut refs = Vec::with_capacity(ref_count);
        for _ in 0..ref_count {
            let ref_idx = read_uint(data, &mut pos, size_bytes)?;
            if ref_idx <= idx || ref_idx >= count {
                bail!("Reference from cell {idx} to {ref_idx} breaks topological order");
            }
            refs.push(ref_idx);
        }

        raw.push(RawCell {
            data: cell_data,
            bit_len,
            refs,
        });
    }

    // Children always come later, so building back-to-front resolves
    // every reference in one pass
    let mut cells: Vec<Option<Arc<Cell>>> = (0..count).map(|_| None).collect();
    for idx in (0..count).rev() {
        let r = &raw[idx];
        let references = r
            .refs
            .iter()
            .map(|&i| cells[i].clone().expect("forward reference already built"))
            .collect();
        cells[idx] = Some(Arc::new(Cell::with_refs(
            r.data.clone(),
            r.bit_len,
            references,
        )?));
    }

    Ok(cells.into_iter().map(|c| c.expect("all cells built")).collect())
}

/// Collects every distinct cell reachable from `root` in pre-order,
/// deduplicating by reference identity
fn collect_cells(root: &Arc<Cell>) -> Vec<Arc<Cell>> {
    fn walk(cell: &Arc<Cell>, out: &mut Vec<Arc<Cell>>, seen: &mut HashMap<usize, ()>) {
        let key = Arc::as_ptr(cell) as usize;
        if seen.contains_key(&key) {
            return;
        }
        seen.insert(key, ());
        out.push(cell.clone());
        for reference in cell.references() {
            walk(reference, out, seen);
        }
    }

    let mut cells = Vec::new();
    walk(root, &mut cells, &mut HashMap::new());
    cells
}

fn read_byte(data: &[u8], pos: &mut usize) -> Result<u8> {
    if *pos >= data.len() {
        bail!("Unexpected end of BOC data");
    }
    let b = data[*pos];
    *pos += 1;
    Ok(b)
}

fn read_uint(data: &[u8], pos: &mut usize, size: usize) -> Result<usize> {
    if *pos + size > data.len() {
        bail!("Unexpected end of BOC data");
    }
    let mut result = 0usize;
    for i in 0..size {
        result = (result << 8) | data[*pos + i] as usize;
    }
    *pos += size;
    Ok(result)
}

/// Serializes a cell graph and encodes it as base64 for transport
pub fn boc_to_base64(cell: &Arc<Cell>, has_crc32: bool) -> Result<String> {
    let bytes = serialize_boc(cell, has_crc32)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
}

/// Decodes a base64 BOC back into its root cell
pub fn base64_to_boc(b64: &str) -> Result<Arc<Cell>> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64.trim())
        .map_err(|e| anyhow::anyhow!("Failed to decode base64: {e}"))?;
    deserialize_boc(&bytes)
}

/// Decodes a hex BOC back into its root cell
pub fn hex_to_boc(hex: &str) -> Result<Arc<Cell>> {
    let bytes = hex::decode(hex.trim())
        .map_err(|e| anyhow::anyhow!("Failed to decode hex: {e}"))?;
    deserialize_boc(&bytes)
}

/// Serializes a cell graph as a hex string
pub fn boc_to_hex(cell: &Arc<Cell>, has_crc32: bool) -> Result<String> {
    Ok(hex::encode(serialize_boc(cell, has_crc32)?))
}
