//! Wallet v4r2 envelope construction
//!
//! Three nested structures: the internal message (the value transfer), the
//! signed body the contract verifies, and the external inbound envelope
//! submitted to the network. The signature covers the signed body cell's
//! representation hash and nothing else; the envelope then repeats the
//! body bits inline after the signature, with the internal message as its
//! sole child. When the account has never been deployed the envelope also
//! carries the contract's state-init, which is how the wallet contract
//! comes to exist on its first transaction.

use crate::tvm::{Address, Builder, Cell};
use crate::wallet::codes::wallet_v4r2_code;
use crate::wallet::mnemonic::KeyPair;
use crate::wallet::transfer::{TransferRequest, build_internal_message};
use anyhow::Result;
use std::sync::Arc;

/// Default subwallet constant for v4r2 on the basechain
pub const DEFAULT_SUBWALLET_ID: u32 = 698983191;

/// Operation code for a plain transfer
const OP_TRANSFER: u8 = 0;

/// Send mode 3: fees taken from the transferred value, minor errors ignored
const SEND_MODE: u8 = 3;

/// Envelope builder for the v4r2 wallet contract
#[derive(Debug, Clone, Copy)]
pub struct WalletV4R2 {
    pub subwallet_id: u32,
}

impl WalletV4R2 {
    /// Creates a builder with the default subwallet constant
    pub fn new() -> Self {
        Self {
            subwallet_id: DEFAULT_SUBWALLET_ID,
        }
    }

    /// Creates a builder with a custom subwallet constant
    pub fn with_subwallet(subwallet_id: u32) -> Self {
        Self { subwallet_id }
    }

    /// Builds the body cell the contract verifies the signature against
    ///
    /// Layout: subwallet_id(32) | valid_until(32) | seqno(32) | op(8) |
    /// send_mode(8), with the internal message as the single child.
    pub fn build_signed_body(
        &self,
        request: &TransferRequest,
        internal: Arc<Cell>,
    ) -> Result<Arc<Cell>> {
        let mut builder = Builder::new();
        self.store_body_bits(&mut builder, request)?;
        builder.store_ref(internal)?;
        builder.build()
    }

    fn store_body_bits(&self, builder: &mut Builder, request: &TransferRequest) -> Result<()> {
        builder.store_u32(self.subwallet_id)?;
        builder.store_u32(request.valid_until)?;
        builder.store_u32(request.seqno)?;
        builder.store_uint(OP_TRANSFER as u64, 8)?;
        builder.store_uint(SEND_MODE as u64, 8)?;
        Ok(())
    }

    /// Builds the contract state-init for first-transaction deployment
    ///
    /// Data layout: seqno=0 | subwallet_id | public_key | empty plugin dict.
    pub fn state_init(&self, public_key: &[u8; 32]) -> Result<Arc<Cell>> {
        let mut data = Builder::new();
        data.store_u32(0)?; // initial seqno
        data.store_u32(self.subwallet_id)?;
        data.store_bytes(public_key)?;
        data.store_bit(false)?; // empty plugin dict
        let data = data.build()?;

        let mut init = Builder::new();
        init.store_bit(false)?; // split_depth absent
        init.store_bit(false)?; // special absent
        init.store_maybe_ref(Some(wallet_v4r2_code()?))?;
        init.store_maybe_ref(Some(data))?;
        init.store_bit(false)?; // library absent
        init.build()
    }

    /// Builds and signs the external inbound envelope
    ///
    /// `deploy` must be set exactly when the account's sequence number is 0.
    pub fn build_external(
        &self,
        keypair: &KeyPair,
        sender: &Address,
        request: &TransferRequest,
        deploy: bool,
    ) -> Result<Arc<Cell>> {
        let internal = build_internal_message(request)?;
        let body = self.build_signed_body(request, internal.clone())?;
        let signature = keypair.sign(&body.hash());

        let mut ext = Builder::new();
        ext.store_uint(0b10, 2)?; // ext_in_msg_info$10
        ext.store_address(None)?; // src
        ext.store_address(Some(sender))?; // dest: the wallet itself
        ext.store_coins(0)?; // import_fee

        if deploy {
            ext.store_bit(true)?; // state_init present
            ext.store_bit(true)?; // carried as a reference
            ext.store_ref(self.state_init(&keypair.public_key)?)?;
        } else {
            ext.store_bit(false)?;
        }

        ext.store_bit(false)?; // body inline
        ext.store_bytes(&signature)?;
        self.store_body_bits(&mut ext, request)?;
        ext.store_ref(internal)?;

        ext.build()
    }
}

impl Default for WalletV4R2 {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tvm::{Slice, deserialize_boc, serialize_boc};
    use crate::wallet::mnemonic::Mnemonic;
    use ed25519_dalek::{Signature, Verifier};

    const PHRASE: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon art";
    const DESTINATION: &str = "EQCD39VS5jcptHL8vMjEXrzGaRcCVYto7HUn4bpAOg8xqB2N";
    const NETWORK_TIME: u32 = 1_700_000_000;
    const WINDOW: u32 = 120;

    fn fixture() -> (KeyPair, Address, TransferRequest) {
        let keypair = Mnemonic::from_phrase(PHRASE).unwrap().derive_keypair();
        let sender = Address::new(0, [0x42u8; 32]);
        let request = TransferRequest::new(
            Address::parse(DESTINATION).unwrap(),
            1_500_000_000,
            3,
            NETWORK_TIME + WINDOW,
        )
        .with_memo(Some("test".into()));
        (keypair, sender, request)
    }

    #[test]
    fn test_signed_body_layout() {
        let (_, _, request) = fixture();
        let internal = build_internal_message(&request).unwrap();
        let body = WalletV4R2::new()
            .build_signed_body(&request, internal)
            .unwrap();

        assert_eq!(body.bit_len(), 32 + 32 + 32 + 8 + 8);
        assert_eq!(body.reference_count(), 1);

        let mut slice = Slice::new(body);
        assert_eq!(slice.load_u32().unwrap(), DEFAULT_SUBWALLET_ID);
        assert_eq!(slice.load_u32().unwrap(), NETWORK_TIME + WINDOW);
        assert_eq!(slice.load_u32().unwrap(), 3);
        assert_eq!(slice.load_uint(8).unwrap(), 0); // op
        assert_eq!(slice.load_uint(8).unwrap(), 3); // send mode
    }

    #[test]
    fn test_end_to_end_envelope() {
        let (keypair, sender, request) = fixture();
        let wallet = WalletV4R2::new();
        let envelope = wallet
            .build_external(&keypair, &sender, &request, false)
            .unwrap();

        // Through the wire container and back
        let boc = serialize_boc(&envelope, false).unwrap();
        let root = deserialize_boc(&boc).unwrap();
        assert_eq!(root.hash(), envelope.hash());

        let mut slice = Slice::new(root);

        // Exactly two bits of external-inbound tag
        assert_eq!(slice.load_uint(2).unwrap(), 0b10);
        assert!(slice.load_address().unwrap().is_none()); // src
        let dest = slice.load_address().unwrap().unwrap();
        assert_eq!(dest.hash_part, sender.hash_part); // envelope targets the wallet
        assert_eq!(slice.load_coins().unwrap(), 0); // import fee
        assert!(!slice.load_bit().unwrap()); // no state-init at seqno 3
        assert!(!slice.load_bit().unwrap()); // body inline

        // Reconstruct the signed slice and verify the signature over it
        let signature = slice.load_bytes(64).unwrap();
        let body_bits = slice.remaining_bits();
        assert_eq!(body_bits, 32 + 32 + 32 + 8 + 8);
        let mut rebuilt = Builder::new();
        rebuilt
            .store_bits(&slice.load_remaining_bits().unwrap(), body_bits)
            .unwrap();
        rebuilt.store_ref(slice.load_reference().unwrap()).unwrap();
        let rebuilt = rebuilt.build().unwrap();

        let signature = Signature::from_bytes(&signature.try_into().unwrap());
        keypair
            .verifying_key()
            .verify(&rebuilt.hash(), &signature)
            .unwrap();

        // The internal message carries the real destination and amount
        let mut internal = Slice::new(rebuilt.reference(0).unwrap().clone());
        internal.skip_bits(4).unwrap();
        assert!(internal.load_address().unwrap().is_none());
        let transfer_dest = internal.load_address().unwrap().unwrap();
        assert_eq!(
            transfer_dest.to_raw(),
            Address::parse(DESTINATION).unwrap().to_raw()
        );
        assert_eq!(internal.load_coins().unwrap(), 1_500_000_000);
    }

    #[test]
    fn test_expiry_field_is_exact() {
        let (keypair, sender, request) = fixture();
        let envelope = WalletV4R2::new()
            .build_external(&keypair, &sender, &request, false)
            .unwrap();

        let mut slice = Slice::new(envelope);
        // tag(2) + src(2) + dest(267) + fee(4) + init(1) + either(1) + sig(512) + subwallet(32)
        slice.skip_bits(2 + 2 + 267 + 4 + 1 + 1 + 512 + 32).unwrap();
        assert_eq!(slice.load_u32().unwrap(), NETWORK_TIME + WINDOW);
    }

    #[test]
    fn test_deploy_envelope_carries_state_init() {
        let (keypair, sender, mut request) = fixture();
        request.seqno = 0;
        let wallet = WalletV4R2::new();
        let envelope = wallet
            .build_external(&keypair, &sender, &request, true)
            .unwrap();

        // state-init ref first, internal message second
        assert_eq!(envelope.reference_count(), 2);
        let expected = wallet.state_init(&keypair.public_key).unwrap();
        assert_eq!(envelope.reference(0).unwrap().hash(), expected.hash());

        let mut slice = Slice::new(envelope);
        slice.skip_bits(2 + 2 + 267 + 4).unwrap();
        assert!(slice.load_bit().unwrap()); // state-init present
        assert!(slice.load_bit().unwrap()); // as a reference
        assert!(!slice.load_bit().unwrap()); // body still inline
    }

    #[test]
    fn test_state_init_embeds_public_key() {
        let (keypair, _, _) = fixture();
        let init = WalletV4R2::new().state_init(&keypair.public_key).unwrap();

        // split_depth, special, code ref, data ref, library
        assert_eq!(init.bit_len(), 5);
        assert_eq!(init.reference_count(), 2);

        let mut data = Slice::new(init.reference(1).unwrap().clone());
        assert_eq!(data.load_u32().unwrap(), 0); // fresh seqno
        assert_eq!(data.load_u32().unwrap(), DEFAULT_SUBWALLET_ID);
        assert_eq!(data.load_bytes(32).unwrap(), keypair.public_key);
        assert!(!data.load_bit().unwrap()); // no plugins
    }

    #[test]
    fn test_signature_depends_on_every_signed_field() {
        let (keypair, sender, request) = fixture();
        let wallet = WalletV4R2::new();

        let base = wallet
            .build_external(&keypair, &sender, &request, false)
            .unwrap();

        let mut bumped = request.clone();
        bumped.seqno += 1;
        let other = wallet
            .build_external(&keypair, &sender, &bumped, false)
            .unwrap();

        assert_ne!(base.hash(), other.hash());
    }
}
