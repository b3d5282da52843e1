use crc::{Crc, CRC_16_XMODEM, CRC_32_ISO_HDLC};

/// CRC16/XMODEM, the checksum trailing a friendly-form address
pub const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

/// CRC32, the optional checksum tail of a BOC container
pub const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

#[cfg(test)]
mod tests;
