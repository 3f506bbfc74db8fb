//! COBS + CRC32 wire framing for the bytebus protocol.
//!
//! This is the wire pipeline of bytebus. A packet on the wire is
//! `COBS(frame ‖ CRC32(frame))` terminated by a single `0x00` delimiter:
//! COBS removes every zero byte from the encoded region, so the delimiter is
//! unambiguous and a receiver can always resynchronize on the next `0x00`
//! after corruption.
//!
//! The [`Framer`] is agnostic to frame contents; it only validates the CRC
//! and emits the decoded frame bytes. Frame parsing and dispatch live one
//! layer up, in `bytebus-node`.

pub mod cobs;
pub mod crc32;
pub mod error;
pub mod framer;

pub use crc32::crc32_iso_hdlc;
pub use error::{Result, WireError};
pub use framer::{create_packet, Framer};

/// Frame header size in bytes: version(1) + msg_id(1) + msg_hash(4) + len(2).
pub const FRAME_HEADER_SIZE: usize = 8;

/// CRC32 trailer size appended to every frame before encoding.
pub const CRC_SIZE: usize = 4;

/// Packet delimiter. Never appears inside the encoded region.
pub const DELIMITER: u8 = 0x00;

/// COBS worst-case overhead for `n` input bytes, beyond the leading code byte.
pub const fn cobs_max_overhead(n: usize) -> usize {
    (n + 253) / 254
}

/// Largest frame produced for a given maximum payload size.
pub const fn max_frame_size(max_payload_size: usize) -> usize {
    FRAME_HEADER_SIZE + max_payload_size
}

/// Largest wire packet (delimiter included) for a given maximum payload size.
pub const fn max_packet_size(max_payload_size: usize) -> usize {
    let encoded_input = max_frame_size(max_payload_size) + CRC_SIZE;
    encoded_input + cobs_max_overhead(encoded_input) + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizing_helpers() {
        assert_eq!(max_frame_size(0), 8);
        assert_eq!(max_frame_size(256), 264);

        assert_eq!(cobs_max_overhead(0), 0);
        assert_eq!(cobs_max_overhead(1), 1);
        assert_eq!(cobs_max_overhead(254), 1);
        assert_eq!(cobs_max_overhead(255), 2);

        // frame(12) + crc(4) = 16 encoded input bytes, 1 overhead, 1 delimiter.
        assert_eq!(max_packet_size(4), 18);
    }

    #[test]
    fn max_packet_size_covers_worst_case_encoding() {
        // An all-zero frame is COBS worst case for short inputs.
        let frame = vec![0u8; max_frame_size(32)];
        let mut packet = vec![0u8; max_packet_size(32)];
        let len = create_packet(&frame, &mut packet).unwrap();
        assert!(len <= packet.len());
    }
}
