//! Transfer request and internal message construction
//!
//! The internal message cell describes the actual value movement and is
//! shared by every wallet revision; the revision-specific envelope wraps
//! around it.

use crate::tvm::{Address, Builder, Cell};
use anyhow::Result;
use std::sync::Arc;

/// Maximum memo length after UTF-8 encoding, in bytes
pub const MAX_MEMO_BYTES: usize = 120;

/// One outbound value transfer, fully resolved
#[derive(Debug, Clone)]
pub struct TransferRequest {
    /// Destination address
    pub destination: Address,
    /// Amount in nanotons
    pub amount: u128,
    /// Optional short text comment
    pub memo: Option<String>,
    /// Account sequence number the transfer is built against
    pub seqno: u32,
    /// Expiry as unix time, computed from the chain's clock
    pub valid_until: u32,
    /// Whether undeliverable value bounces back to the sender
    pub bounce: bool,
}

impl TransferRequest {
    /// Creates a request with the default bounceable flag
    pub fn new(destination: Address, amount: u128, seqno: u32, valid_until: u32) -> Self {
        Self {
            destination,
            amount,
            memo: None,
            seqno,
            valid_until,
            bounce: true,
        }
    }

    /// Attaches a memo
    pub fn with_memo(mut self, memo: Option<String>) -> Self {
        self.memo = memo.filter(|m| !m.is_empty());
        self
    }

    /// Overrides the bounce flag
    pub fn with_bounce(mut self, bounce: bool) -> Self {
        self.bounce = bounce;
        self
    }
}

/// Builds the internal message cell for a transfer
///
/// Flags mark a non-IHR, bounceable, not-bounced message with an empty
/// source; fees, logical time and creation time are zero and filled in by
/// the network. A memo becomes a comment cell referenced as the body.
pub fn build_internal_message(request: &TransferRequest) -> Result<Arc<Cell>> {
    let mut builder = Builder::new();

    builder.store_bit(false)?; // int_msg_info$0
    builder.store_bit(true)?; // ihr_disabled
    builder.store_bit(request.bounce)?;
    builder.store_bit(false)?; // bounced

    builder.store_address(None)?; // src, assigned by the network
    builder.store_address(Some(&request.destination))?;
    builder.store_coins(request.amount)?;
    builder.store_bit(false)?; // no extra currencies

    builder.store_coins(0)?; // ihr_fee
    builder.store_coins(0)?; // fwd_fee
    builder.store_uint(0, 64)?; // created_lt
    builder.store_uint(0, 32)?; // created_at

    builder.store_bit(false)?; // no state_init

    match &request.memo {
        Some(memo) => {
            builder.store_bit(true)?; // body in a reference
            builder.store_ref(build_comment_cell(memo)?)?;
        }
        None => {
            builder.store_bit(false)?; // empty inline body
        }
    }

    builder.build()
}

/// Builds a comment cell: 32-bit zero opcode, then the UTF-8 text
/// truncated to [`MAX_MEMO_BYTES`] on a character boundary
pub fn build_comment_cell(text: &str) -> Result<Arc<Cell>> {
    let mut end = text.len().min(MAX_MEMO_BYTES);
    while !text.is_char_boundary(end) {
        end -= 1;
    }

    let mut builder = Builder::new();
    builder.store_u32(0)?;
    builder.store_bytes(text[..end].as_bytes())?;
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tvm::Slice;

    fn request() -> TransferRequest {
        TransferRequest::new(Address::new(0, [0x11u8; 32]), 1_500_000_000, 3, 1_700_000_120)
    }

    #[test]
    fn test_internal_message_layout() {
        let cell = build_internal_message(&request()).unwrap();
        let mut slice = Slice::new(cell);

        // int_msg_info$0 + flags
        assert!(!slice.load_bit().unwrap());
        assert!(slice.load_bit().unwrap()); // ihr_disabled
        assert!(slice.load_bit().unwrap()); // bounce
        assert!(!slice.load_bit().unwrap()); // bounced

        assert!(slice.load_address().unwrap().is_none());
        let dest = slice.load_address().unwrap().unwrap();
        assert_eq!(dest.hash_part, [0x11u8; 32]);
        assert_eq!(slice.load_coins().unwrap(), 1_500_000_000);

        assert!(!slice.load_bit().unwrap()); // extra currencies
        assert_eq!(slice.load_coins().unwrap(), 0); // ihr_fee
        assert_eq!(slice.load_coins().unwrap(), 0); // fwd_fee
        assert_eq!(slice.load_uint(64).unwrap(), 0); // created_lt
        assert_eq!(slice.load_uint(32).unwrap(), 0); // created_at

        assert!(!slice.load_bit().unwrap()); // state_init
        assert!(!slice.load_bit().unwrap()); // inline empty body
        assert!(slice.is_empty());
    }

    #[test]
    fn test_memo_goes_into_comment_ref() {
        let cell = build_internal_message(&request().with_memo(Some("test".into()))).unwrap();
        assert_eq!(cell.reference_count(), 1);

        let mut slice = Slice::new(cell);
        slice.skip_bits(4).unwrap();
        slice.load_address().unwrap();
        slice.load_address().unwrap();
        slice.load_coins().unwrap();
        slice.skip_bits(1).unwrap();
        slice.load_coins().unwrap();
        slice.load_coins().unwrap();
        slice.skip_bits(64 + 32 + 1).unwrap();
        assert!(slice.load_bit().unwrap()); // body present as reference

        let mut comment = Slice::new(slice.load_reference().unwrap());
        assert_eq!(comment.load_u32().unwrap(), 0);
        assert_eq!(comment.load_remaining_bits().unwrap(), b"test");
    }

    #[test]
    fn test_empty_memo_treated_as_none() {
        let req = request().with_memo(Some(String::new()));
        assert!(req.memo.is_none());
    }

    #[test]
    fn test_memo_truncated_to_limit() {
        let long = "x".repeat(200);
        let cell = build_comment_cell(&long).unwrap();
        assert_eq!(cell.bit_len(), 32 + MAX_MEMO_BYTES * 8);
    }

    #[test]
    fn test_memo_truncation_respects_char_boundary() {
        // 40 three-byte characters: 120 bytes exactly, then one more
        let text = "€".repeat(41);
        let cell = build_comment_cell(&text).unwrap();
        // 40 characters fit; the 41st would split
        assert_eq!(cell.bit_len(), 32 + 120 * 8);
    }
}
