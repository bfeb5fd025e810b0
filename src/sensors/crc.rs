//! CRC-8 used by the HTU21D to protect each 16-bit measurement.
//!
//! Generator polynomial x^8 + x^5 + x^4 + 1 (`0x131`), no reflection, zero
//! initial value, computed MSB first over the big-endian payload. Same
//! generator as the Sensirion parts but with a zero seed, so the catalogue
//! `CRC_8_NRSC_5` (seed `0xFF`) does not fit.

use crc::{Algorithm, Crc};

/// x^8 + x^5 + x^4 + 1
pub const GENERATOR_POLYNOMIAL: u16 = 0x0131;

const CRC_8_HTU21D: Algorithm<u8> = Algorithm {
    width: 8,
    poly: (GENERATOR_POLYNOMIAL & 0xFF) as u8,
    init: 0x00,
    refin: false,
    refout: false,
    xorout: 0x00,
    check: 0xA2,
    residue: 0x00,
};

const HTU21D: Crc<u8> = Crc::<u8>::new(&CRC_8_HTU21D);

/// Compute the checksum of a 16-bit payload.
pub fn crc8(data: u16) -> u8 {
    HTU21D.checksum(&data.to_be_bytes())
}

/// `true` when `received` is the checksum of `data`.
pub fn crc8_matches(data: u16, received: u8) -> bool {
    crc8(data) == received
}
