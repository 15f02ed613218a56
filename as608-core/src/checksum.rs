//! AS608 checksum algorithm
//!
//! From the sensor datasheet: the arithmetic sum of the package identifier,
//! the package length and all package contents. Overflowing bits are omitted.

use tracing::trace;

/// Calculate the packet checksum
///
/// # Algorithm
///
/// ```text
/// 1. Sum bytes: [packet_type, len_hi, len_lo, ...payload]
/// 2. Keep the low 16 bits (sum & 0xFFFF)
/// ```
///
/// `length` is the value of the length field, i.e. payload length plus the
/// two checksum bytes.
///
/// # Examples
///
/// ```
/// use as608_core::checksum;
///
/// // verify-password with the default password
/// let checksum = checksum::calculate(0x01, 7, &[0x13, 0, 0, 0, 0]);
/// assert_eq!(checksum, 0x001B);
/// ```
pub fn calculate(packet_type: u8, length: u16, payload: &[u8]) -> u16 {
    let [len_hi, len_lo] = length.to_be_bytes();

    let mut sum: u32 = packet_type as u32 + len_hi as u32 + len_lo as u32;
    for &byte in payload {
        sum = sum.wrapping_add(byte as u32);
    }

    let checksum = (sum & 0xFFFF) as u16;

    trace!(
        packet_type = packet_type,
        length = length,
        payload_len = payload.len(),
        checksum = format!("0x{:04X}", checksum),
        "Calculated checksum"
    );

    checksum
}

/// Verify checksum
pub fn verify(packet_type: u8, length: u16, payload: &[u8], expected: u16) -> bool {
    calculate(packet_type, length, payload) == expected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_get_image() {
        // EF 01 FF FF FF FF 01 00 03 01 00 05
        assert_eq!(calculate(0x01, 3, &[0x01]), 0x0005);
    }

    #[test]
    fn test_checksum_verify_password() {
        assert_eq!(calculate(0x01, 7, &[0x13, 0, 0, 0, 0]), 0x001B);
    }

    #[test]
    fn test_checksum_includes_length() {
        let cs1 = calculate(0x02, 0x0082, &[]);
        let cs2 = calculate(0x02, 0x0102, &[]);

        assert_ne!(cs1, cs2);
    }

    #[test]
    fn test_checksum_truncates_to_16_bits() {
        // 0x08 + 0x01 + 0x02 + 0xFF * 257 = 0x1000A
        let payload = vec![0xFF; 257];
        assert_eq!(calculate(0x08, 0x0102, &payload), 0x000A);
    }

    #[test]
    fn test_checksum_verify() {
        let payload = vec![0xAB, 0xCD];
        let checksum = calculate(0x07, 4, &payload);

        assert!(verify(0x07, 4, &payload, checksum));
        assert!(!verify(0x07, 4, &payload, checksum.wrapping_add(1)));
    }
}
