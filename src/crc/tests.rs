//! Tests for CRC module

use super::*;

#[test]
fn test_crc16_known_vector() {
    // Standard XMODEM check value
    assert_eq!(CRC16.checksum(b"123456789"), 0x31C3);
}

#[test]
fn test_crc32_known_vector() {
    assert_eq!(CRC32.checksum(b"123456789"), 0xCBF43926);
}

#[test]
fn test_crc16_deterministic() {
    let data = b"test data";
    assert_eq!(CRC16.checksum(data), CRC16.checksum(data));
}

#[test]
fn test_crc16_different_data() {
    assert_ne!(CRC16.checksum(b"data1"), CRC16.checksum(b"data2"));
}

#[test]
fn test_crc16_order_matters() {
    assert_ne!(CRC16.checksum(b"abc"), CRC16.checksum(b"bca"));
}

#[test]
fn test_crc16_digest_update() {
    let mut digest = CRC16.digest();
    digest.update(b"hello");
    digest.update(b" world");

    // Incremental update should produce same result
    assert_eq!(digest.finalize(), CRC16.checksum(b"hello world"));
}

#[test]
fn test_crc32_digest_update() {
    let mut digest = CRC32.digest();
    digest.update(b"hello");
    digest.update(b" world");

    assert_eq!(digest.finalize(), CRC32.checksum(b"hello world"));
}

#[test]
fn test_crc16_address_payload() {
    // tag + workchain + all-zero hash, the first 34 bytes of a friendly address
    let mut data = vec![0x11u8, 0x00];
    data.extend_from_slice(&[0u8; 32]);
    let checksum = CRC16.checksum(&data);

    // Matches the trailing bytes of EQAAA...AAM9c (the zero address)
    assert_eq!(checksum.to_be_bytes(), [0xCF, 0x5C]);
}
