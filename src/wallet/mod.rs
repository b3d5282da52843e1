//! Wallet contract envelope builders
//!
//! Each supported contract revision gets its own envelope builder; the
//! cell, BOC, address and signing primitives are shared. The variant tag
//! selects the builder at the orchestration layer.

pub mod codes;
pub mod mnemonic;
pub mod transfer;
pub mod v4r2;
pub mod v5r1;

use crate::tvm::{Address, Cell};
use anyhow::Result;
use std::sync::Arc;

pub use mnemonic::{KeyPair, MNEMONIC_WORDS, Mnemonic};
pub use transfer::{MAX_MEMO_BYTES, TransferRequest};
pub use v4r2::{DEFAULT_SUBWALLET_ID, WalletV4R2};
pub use v5r1::WalletV5R1;

/// Supported wallet contract revisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletVariant {
    V4R2,
    V5R1,
}

impl WalletVariant {
    /// Builds the signed external envelope for this revision
    ///
    /// `subwallet_id` applies to v4r2 only; v5r1 uses its own wallet-id
    /// scheme with the mainnet default.
    pub fn build_external(
        &self,
        subwallet_id: u32,
        keypair: &KeyPair,
        sender: &Address,
        request: &TransferRequest,
        deploy: bool,
    ) -> Result<Arc<Cell>> {
        match self {
            Self::V4R2 => WalletV4R2::with_subwallet(subwallet_id)
                .build_external(keypair, sender, request, deploy),
            Self::V5R1 => WalletV5R1::new().build_external(keypair, sender, request, deploy),
        }
    }
}

impl std::fmt::Display for WalletVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::V4R2 => write!(f, "v4r2"),
            Self::V5R1 => write!(f, "v5r1"),
        }
    }
}
