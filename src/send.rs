//! Transfer orchestration
//!
//! Ties the whole path together: key derivation, address resolution,
//! sequence-number and network-time lookup, envelope construction, signing,
//! BOC serialization and submission. Stateless between calls; callers
//! running transfers concurrently must serialize them per sender address,
//! because two transfers racing on the same sequence number will have one
//! of them rejected as a duplicate.

use crate::client::ChainProvider;
use crate::error::{TransferError, TransferResult};
use crate::tvm::{Address, boc_to_base64};
use crate::utils::{format_ton_amount, parse_ton_amount};
use crate::wallet::{Mnemonic, TransferRequest, WalletVariant, v4r2::DEFAULT_SUBWALLET_ID};

/// Orchestration parameters
///
/// The sender address always comes from configuration. Deriving it from
/// the public key requires assuming the exact on-chain contract code hash,
/// and a wrong assumption silently yields a different, unfunded account.
#[derive(Debug, Clone)]
pub struct TransferParams {
    /// The wallet's own, known deployed address (either textual form)
    pub sender_address: String,
    /// Contract revision to build the envelope for
    pub variant: WalletVariant,
    /// Seconds added to network time for the expiry field
    pub expiry_window: u32,
    /// Subwallet constant (v4r2 only)
    pub subwallet_id: u32,
}

impl TransferParams {
    pub fn new(sender_address: impl Into<String>) -> Self {
        Self {
            sender_address: sender_address.into(),
            variant: WalletVariant::V4R2,
            expiry_window: 180,
            subwallet_id: DEFAULT_SUBWALLET_ID,
        }
    }

    pub fn with_variant(mut self, variant: WalletVariant) -> Self {
        self.variant = variant;
        self
    }

    pub fn with_expiry_window(mut self, seconds: u32) -> Self {
        self.expiry_window = seconds;
        self
    }
}

fn parse_address(text: &str) -> TransferResult<Address> {
    Address::parse(text).map_err(|e| TransferError::InvalidAddress {
        address: text.to_string(),
        reason: e.to_string(),
    })
}

/// Builds, signs and broadcasts one transfer, returning the transaction
/// hash reported by the chain
///
/// Input validation happens before the first network call. Submission is
/// never retried here: after a rejection the sequence number must be
/// re-fetched and the envelope rebuilt.
pub fn send_transfer(
    mnemonic: &str,
    destination: &str,
    amount_ton: &str,
    memo: Option<&str>,
    client: &dyn ChainProvider,
    params: &TransferParams,
) -> TransferResult<String> {
    let mnemonic = Mnemonic::from_phrase(mnemonic)?;
    let keypair = mnemonic.derive_keypair();

    let sender = parse_address(&params.sender_address)?;
    let destination = parse_address(destination)?;
    let amount = parse_ton_amount(amount_ton)
        .map_err(|_| TransferError::InvalidAmount(amount_ton.to_string()))?;

    let seqno = client.get_seqno(&sender)?;
    let deploy = seqno == 0;
    if deploy {
        log::info!("sender has no on-chain state, attaching deployment data");
    }

    let network_time = client.get_time()?;
    let valid_until = network_time as u32 + params.expiry_window;
    log::info!("network time {network_time}, message valid until {valid_until}");

    let request = TransferRequest::new(destination, amount, seqno, valid_until)
        .with_memo(memo.map(str::to_string));
    log::info!(
        "signing {} coins to {} (seqno {seqno}, {} wallet)",
        format_ton_amount(amount),
        request.destination.to_friendly(),
        params.variant,
    );

    let envelope =
        params
            .variant
            .build_external(params.subwallet_id, &keypair, &sender, &request, deploy)?;
    let boc = boc_to_base64(&envelope, false)?;

    let hash = client.send_boc(&boc)?;
    log::info!("transfer accepted, transaction hash {hash}");
    Ok(hash)
}
