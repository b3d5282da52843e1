//! From-scratch client for building, signing and broadcasting value
//! transfers against wallet-v4r2 (and v5r1) smart-contract wallets.
//!
//! The crate derives an Ed25519 key from a 24-word mnemonic, encodes a
//! transfer into the chain's cell/BOC binary format, signs the exact byte
//! range the wallet contract verifies, and submits the result over a JSON
//! HTTP RPC endpoint, recovering the transaction hash.
//!
//! ```no_run
//! use tontransfer_rs::client::FallbackClient;
//! use tontransfer_rs::send::{TransferParams, send_transfer};
//!
//! let client = FallbackClient::from_urls(
//!     &["https://toncenter.com/api/v2".to_string()],
//!     None,
//!     15,
//! );
//! let params = TransferParams::new("EQAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAM9c");
//! let hash = send_transfer(
//!     "word1 ... word24",
//!     "EQCD39VS5jcptHL8vMjEXrzGaRcCVYto7HUn4bpAOg8xqB2N",
//!     "1.5",
//!     Some("thanks"),
//!     &client,
//!     &params,
//! )?;
//! # Ok::<(), tontransfer_rs::TransferError>(())
//! ```

pub mod cli;
pub mod client;
pub mod crc;
pub mod error;
pub mod models;
pub mod send;
pub mod tvm;
pub mod utils;
pub mod wallet;

pub use error::{TransferError, TransferResult};
pub use send::{TransferParams, send_transfer};
