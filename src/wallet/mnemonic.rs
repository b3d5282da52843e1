//! Mnemonic handling and signing-key derivation
//!
//! A 24-word mnemonic is stretched into a 32-byte Ed25519 seed with
//! PBKDF2-HMAC-SHA-512 over the space-joined words and a fixed salt. No
//! wordlist checksum is enforced: a mistyped mnemonic simply derives a
//! different, unfunded account, but the word count is validated early to
//! avoid a confusing downstream failure.

use crate::error::{TransferError, TransferResult};
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use hmac::Hmac;
use pbkdf2::pbkdf2;
use sha2::Sha512;

/// Number of PBKDF2 iterations for seed derivation
const PBKDF2_ITERATIONS: u32 = 100_000;

/// Fixed salt for seed derivation
const SEED_SALT: &[u8] = b"TON default seed";

/// Required word count
pub const MNEMONIC_WORDS: usize = 24;

/// A validated 24-word mnemonic phrase
#[derive(Clone)]
pub struct Mnemonic {
    words: Vec<String>,
}

impl Mnemonic {
    /// Parses a mnemonic from a whitespace-separated phrase
    pub fn from_phrase(phrase: &str) -> TransferResult<Self> {
        let words = phrase
            .split_whitespace()
            .map(|w| w.to_lowercase())
            .collect();
        Self::from_words(words)
    }

    /// Builds a mnemonic from individual words, enforcing the word count
    pub fn from_words(words: Vec<String>) -> TransferResult<Self> {
        if words.len() != MNEMONIC_WORDS {
            return Err(TransferError::WrongWordCount(words.len()));
        }
        Ok(Self { words })
    }

    /// Returns the words joined by single spaces
    pub fn to_phrase(&self) -> String {
        self.words.join(" ")
    }

    /// Derives the 32-byte signing seed
    ///
    /// PBKDF2-HMAC-SHA-512, password = the joined words, salt =
    /// `"TON default seed"`, 100 000 iterations, first 32 bytes of the
    /// derived key.
    pub fn derive_seed(&self) -> [u8; 32] {
        let mut seed = [0u8; 32];
        pbkdf2::<Hmac<Sha512>>(
            self.to_phrase().as_bytes(),
            SEED_SALT,
            PBKDF2_ITERATIONS,
            &mut seed,
        )
        .expect("HMAC accepts any key length");
        seed
    }

    /// Derives the Ed25519 key pair
    pub fn derive_keypair(&self) -> KeyPair {
        KeyPair::from_seed(self.derive_seed())
    }
}

impl std::fmt::Debug for Mnemonic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mnemonic")
            .field("words", &"[REDACTED]")
            .finish()
    }
}

/// An Ed25519 key pair derived from a mnemonic seed
///
/// Never persisted; constructed fresh per transfer and dropped with it.
#[derive(Clone)]
pub struct KeyPair {
    signing: SigningKey,
    /// The 32-byte public key
    pub public_key: [u8; 32],
}

impl KeyPair {
    /// Builds a key pair from a 32-byte seed
    pub fn from_seed(seed: [u8; 32]) -> Self {
        let signing = SigningKey::from_bytes(&seed);
        let public_key = signing.verifying_key().to_bytes();
        Self { signing, public_key }
    }

    /// Signs a message, returning the 64-byte signature
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        let signature: Signature = self.signing.sign(message);
        signature.to_bytes()
    }

    /// Returns the verifying half of the pair
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing.verifying_key()
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &hex::encode(self.public_key))
            .finish()
    }
}
