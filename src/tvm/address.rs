//! Account address handling
//!
//! Converts between the two textual address forms used by clients — raw
//! (`workchain:hex64`) and friendly (base64url with a CRC16 tail) — and the
//! internal `(workchain, 32-byte hash)` representation.

use crate::crc::CRC16;
use anyhow::{Result, bail};
use base64::Engine;
use std::fmt;

/// Friendly-form tag for a bounceable address
const TAG_BOUNCEABLE: u8 = 0x11;
/// Friendly-form tag for a non-bounceable address
const TAG_NON_BOUNCEABLE: u8 = 0x51;
/// Flag OR'ed into the tag for test-only addresses
const FLAG_TEST_ONLY: u8 = 0x80;

/// An account address
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    /// Workchain ID (-1 for masterchain, 0 for basechain)
    pub workchain: i8,
    /// 32-byte hash part of the address
    pub hash_part: [u8; 32],
    /// Whether the parsed friendly form carried the bounceable tag
    pub is_bounceable: bool,
    /// Whether the parsed friendly form carried the test-only flag
    pub is_test_only: bool,
}

impl Address {
    /// Creates a new address from workchain and hash part
    pub fn new(workchain: i8, hash_part: [u8; 32]) -> Self {
        Self {
            workchain,
            hash_part,
            is_bounceable: true,
            is_test_only: false,
        }
    }

    /// Parses an address in either textual form
    ///
    /// A colon selects the raw form; anything else is treated as a friendly
    /// base64url string.
    pub fn parse(address: &str) -> Result<Self> {
        let address = address.trim();
        if address.contains(':') {
            Self::from_raw(address)
        } else {
            Self::from_friendly(address)
        }
    }

    /// Parses the raw form: `workchain:hash` with 64 hex characters
    pub fn from_raw(address: &str) -> Result<Self> {
        let Some((wc_str, hash_hex)) = address.split_once(':') else {
            bail!("Invalid raw address format: {address}");
        };

        let workchain = wc_str
            .parse::<i8>()
            .map_err(|_| anyhow::anyhow!("Invalid workchain in address: {wc_str}"))?;

        if hash_hex.len() != 64 {
            bail!("Address hash part must be 64 hex characters, got {}", hash_hex.len());
        }
        let hash_bytes = hex::decode(hash_hex)?;
        let mut hash_part = [0u8; 32];
        hash_part.copy_from_slice(&hash_bytes);

        Ok(Self::new(workchain, hash_part))
    }

    /// Parses the friendly base64url form and verifies its CRC16 tail
    ///
    /// A checksum mismatch is a fatal invalid-address error, never a value
    /// silently accepted with wrong bytes.
    pub fn from_friendly(address: &str) -> Result<Self> {
        let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(address)
            .or_else(|_| base64::engine::general_purpose::STANDARD_NO_PAD.decode(address))
            .map_err(|_| anyhow::anyhow!("Invalid base64 in address"))?;

        if decoded.len() != 36 {
            bail!("Friendly address must decode to 36 bytes, got {}", decoded.len());
        }

        let mut tag = decoded[0];
        let is_test_only = tag & FLAG_TEST_ONLY != 0;
        tag &= !FLAG_TEST_ONLY;

        let is_bounceable = match tag {
            TAG_BOUNCEABLE => true,
            TAG_NON_BOUNCEABLE => false,
            _ => bail!("Invalid address tag: 0x{tag:02x}"),
        };

        let expected = u16::from_be_bytes([decoded[34], decoded[35]]);
        let actual = CRC16.checksum(&decoded[0..34]);
        if expected != actual {
            bail!(
                "Address checksum mismatch: expected 0x{expected:04x}, computed 0x{actual:04x}"
            );
        }

        let workchain = decoded[1] as i8;
        let mut hash_part = [0u8; 32];
        hash_part.copy_from_slice(&decoded[2..34]);

        Ok(Self {
            workchain,
            hash_part,
            is_bounceable,
            is_test_only,
        })
    }

    /// Formats as the raw `workchain:hex` form
    pub fn to_raw(&self) -> String {
        format!("{}:{}", self.workchain, hex::encode(self.hash_part))
    }

    /// Formats as the friendly form, always bounceable-tagged, with a
    /// freshly computed checksum
    pub fn to_friendly(&self) -> String {
        let mut data = Vec::with_capacity(36);
        let mut tag = TAG_BOUNCEABLE;
        if self.is_test_only {
            tag |= FLAG_TEST_ONLY;
        }
        data.push(tag);
        data.push(self.workchain as u8);
        data.extend_from_slice(&self.hash_part);

        let crc = CRC16.checksum(&data);
        data.extend_from_slice(&crc.to_be_bytes());

        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&data)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_friendly())
    }
}

impl std::str::FromStr for Address {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Address::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: &str = "0:83dfd552e63729b472fcbcc8c45ebcc6691702558b68ec7527e1ba403a0f31a8";
    const FRIENDLY: &str = "EQCD39VS5jcptHL8vMjEXrzGaRcCVYto7HUn4bpAOg8xqB2N";

    #[test]
    fn test_raw_round_trip() {
        let addr = Address::from_raw(RAW).unwrap();
        assert_eq!(addr.workchain, 0);
        assert_eq!(addr.to_raw(), RAW);
    }

    #[test]
    fn test_friendly_round_trip() {
        let addr = Address::from_friendly(FRIENDLY).unwrap();
        assert!(addr.is_bounceable);
        assert!(!addr.is_test_only);
        assert_eq!(addr.to_friendly(), FRIENDLY);
    }

    #[test]
    fn test_raw_and_friendly_agree() {
        let a = Address::parse(RAW).unwrap();
        let b = Address::parse(FRIENDLY).unwrap();
        assert_eq!(a.workchain, b.workchain);
        assert_eq!(a.hash_part, b.hash_part);
    }

    #[test]
    fn test_zero_address_friendly() {
        let addr = Address::new(0, [0u8; 32]);
        assert_eq!(
            addr.to_friendly(),
            "EQAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAM9c"
        );
    }

    #[test]
    fn test_checksum_rejection() {
        // Flip one character of the checksum tail
        let mut corrupted: Vec<char> = FRIENDLY.chars().collect();
        let last = corrupted.len() - 1;
        corrupted[last] = if corrupted[last] == 'N' { 'M' } else { 'N' };
        let corrupted: String = corrupted.into_iter().collect();
        assert!(Address::from_friendly(&corrupted).is_err());
    }

    #[test]
    fn test_payload_mutation_rejected() {
        // Flip a character in the middle of the payload
        let mut chars: Vec<char> = FRIENDLY.chars().collect();
        chars[10] = if chars[10] == 'A' { 'B' } else { 'A' };
        let mutated: String = chars.into_iter().collect();
        assert!(Address::from_friendly(&mutated).is_err());
    }

    #[test]
    fn test_invalid_tag_rejected() {
        // Valid checksum over an invalid tag byte still fails on the tag
        let mut data = vec![0x22u8, 0x00];
        data.extend_from_slice(&[0u8; 32]);
        let crc = CRC16.checksum(&data);
        data.extend_from_slice(&crc.to_be_bytes());
        let text = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&data);
        assert!(Address::from_friendly(&text).is_err());
    }

    #[test]
    fn test_non_bounceable_parses_to_same_account() {
        let bounceable =
            Address::from_friendly("EQAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAM9c").unwrap();
        let non_bounceable =
            Address::from_friendly("UQAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAJKZ").unwrap();
        assert_eq!(bounceable.hash_part, non_bounceable.hash_part);
        assert!(!non_bounceable.is_bounceable);
        // Reformatting always yields the bounceable tag
        assert_eq!(non_bounceable.to_friendly(), bounceable.to_friendly());
    }

    #[test]
    fn test_workchain_minus_one() {
        let raw = "-1:83dfd552e63729b472fcbcc8c45ebcc6691702558b68ec7527e1ba403a0f31a8";
        let addr = Address::parse(raw).unwrap();
        assert_eq!(addr.workchain, -1);
        assert_eq!(addr.to_raw(), raw);
    }
}
