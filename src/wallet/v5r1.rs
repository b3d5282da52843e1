//! Wallet v5r1 envelope construction
//!
//! The v5 revision shares the internal message and all cell primitives
//! with v4r2 and differs only in the signed envelope: the body opens with
//! a signed-external opcode and a 32-bit wallet id, the transfer itself is
//! carried as a send-message action in a referenced action list, and the
//! 512-bit signature is appended after the body bits instead of preceding
//! them.

use crate::tvm::{Address, Builder, Cell};
use crate::wallet::mnemonic::KeyPair;
use crate::wallet::transfer::{TransferRequest, build_internal_message};
use anyhow::{Result, bail};
use std::sync::Arc;

/// Opcode for an externally signed request ("sign" in ASCII)
pub const OP_AUTH_SIGNED: u32 = 0x7369676e;

/// Tag for a send-message action
const ACTION_SEND_MSG: u32 = 0x0ec3c86d;

/// Mainnet network global id
pub const NETWORK_MAINNET: i32 = -239;

/// Send mode 3, as for v4r2
const SEND_MODE: u8 = 3;

/// Envelope builder for the v5r1 wallet contract
#[derive(Debug, Clone, Copy)]
pub struct WalletV5R1 {
    pub wallet_id: i32,
}

impl WalletV5R1 {
    const WALLET_VERSION: u8 = 0;

    /// Creates a builder with the default mainnet wallet id
    pub fn new() -> Self {
        Self {
            wallet_id: Self::compute_wallet_id(NETWORK_MAINNET, 0, 0),
        }
    }

    /// Creates a builder with an explicit wallet id
    pub fn with_wallet_id(wallet_id: i32) -> Self {
        Self { wallet_id }
    }

    /// Computes a wallet id from its components
    ///
    /// The id is the network global id XOR'ed with a client context of
    /// `[flag:1][workchain:8][version:8][subwallet:15]`, MSB to LSB. The
    /// workchain byte is sign-preserving.
    pub fn compute_wallet_id(network_global_id: i32, workchain: i32, subwallet_number: u32) -> i32 {
        let workchain_byte = ((workchain as i8) as u32) & 0xFF;
        let context: u32 = (1u32 << 31)
            | (workchain_byte << 23)
            | ((Self::WALLET_VERSION as u32) << 15)
            | (subwallet_number & 0x7FFF);
        network_global_id ^ (context as i32)
    }

    /// Builds the single-entry send-message action list
    fn build_actions(&self, request: &TransferRequest) -> Result<Arc<Cell>> {
        let internal = build_internal_message(request)?;

        let mut action = Builder::new();
        action.store_u32(ACTION_SEND_MSG)?;
        action.store_uint(SEND_MODE as u64, 8)?;
        action.store_ref(internal)?;
        action.build()
    }

    /// Builds the body cell whose hash the signature covers
    ///
    /// Layout: opcode(32) | wallet_id(32, signed) | valid_until(32) |
    /// seqno(32), with the action list as the single child.
    pub fn build_signed_body(&self, request: &TransferRequest) -> Result<Arc<Cell>> {
        let mut builder = Builder::new();
        self.store_body_bits(&mut builder, request)?;
        builder.store_ref(self.build_actions(request)?)?;
        builder.build()
    }

    fn store_body_bits(&self, builder: &mut Builder, request: &TransferRequest) -> Result<()> {
        builder.store_u32(OP_AUTH_SIGNED)?;
        builder.store_int(self.wallet_id as i64, 32)?;
        builder.store_u32(request.valid_until)?;
        builder.store_u32(request.seqno)?;
        Ok(())
    }

    /// Builds and signs the external inbound envelope
    ///
    /// Deployment through this builder is not supported: the account must
    /// already exist on chain, i.e. `seqno > 0`.
    pub fn build_external(
        &self,
        keypair: &KeyPair,
        sender: &Address,
        request: &TransferRequest,
        deploy: bool,
    ) -> Result<Arc<Cell>> {
        if deploy {
            bail!("v5r1 deployment is not supported; fund and deploy the wallet first");
        }

        let actions = self.build_actions(request)?;

        let mut body = Builder::new();
        self.store_body_bits(&mut body, request)?;
        body.store_ref(actions.clone())?;
        let body = body.build()?;
        let signature = keypair.sign(&body.hash());

        let mut ext = Builder::new();
        ext.store_uint(0b10, 2)?; // ext_in_msg_info$10
        ext.store_address(None)?; // src
        ext.store_address(Some(sender))?; // dest: the wallet itself
        ext.store_coins(0)?; // import_fee
        ext.store_bit(false)?; // no state_init
        ext.store_bit(false)?; // body inline

        self.store_body_bits(&mut ext, request)?;
        ext.store_ref(actions)?;
        // v5 appends the signature after the body bits
        ext.store_bytes(&signature)?;

        ext.build()
    }
}

impl Default for WalletV5R1 {
    fn default() -> Self {
        Self::new()
    }
}
