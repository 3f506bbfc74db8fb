//! Byte-stream framing: packets in, frames out.
//!
//! Send side: [`create_packet`] appends a big-endian CRC32 to the frame,
//! COBS-encodes the pair, and terminates with the `0x00` delimiter.
//!
//! Receive side: [`Framer`] consumes transport bytes one at a time, locates
//! delimiters, decodes and CRC-checks the accumulated packet, and hands the
//! frame bytes to a caller-supplied sink.

use crate::cobs;
use crate::crc32::crc32_iso_hdlc;
use crate::error::{Result, WireError};
use crate::{CRC_SIZE, DELIMITER};

/// Wrap `frame` into a wire packet inside `packet`, returning the packet
/// length.
///
/// The packet is `COBS(frame ‖ CRC32_BE(frame)) ‖ 0x00`. Fails with
/// [`WireError::InvalidParameter`] if `packet` is shorter than two bytes or
/// too small for the encoding; size `packet` with
/// [`max_packet_size`](crate::max_packet_size) to make overflow impossible.
pub fn create_packet(frame: &[u8], packet: &mut [u8]) -> Result<usize> {
    if packet.len() < 2 {
        return Err(WireError::InvalidParameter);
    }

    let crc = crc32_iso_hdlc(frame).to_be_bytes();
    let encoded_len = cobs::encode_pair(frame, &crc, packet)?;

    if encoded_len >= packet.len() {
        return Err(WireError::InvalidParameter);
    }
    packet[encoded_len] = DELIMITER;
    Ok(encoded_len + 1)
}

/// Delimiter-driven receive state machine.
///
/// Feed bytes through [`Framer::process_byte`]. When a delimiter completes a
/// packet, the framer COBS-decodes it in place, verifies the CRC32 trailer,
/// and invokes the sink with the frame bytes. The frame slice aliases the
/// internal receive buffer and is only valid for the duration of that call;
/// copy it out to retain it.
///
/// Errors are local to the current packet. Whatever went wrong, the receive
/// buffer is reset and the framer accepts the next packet cleanly.
pub struct Framer {
    rx_buf: Box<[u8]>,
    rx_len: usize,
}

impl Framer {
    /// Create a framer accepting encoded packets up to `max_packet_size`
    /// bytes between delimiters.
    ///
    /// The receive buffer is allocated here, once; processing bytes never
    /// allocates.
    pub fn new(max_packet_size: usize) -> Self {
        Self {
            rx_buf: vec![0; max_packet_size].into_boxed_slice(),
            rx_len: 0,
        }
    }

    /// Capacity of the receive buffer.
    pub fn max_packet_size(&self) -> usize {
        self.rx_buf.len()
    }

    /// Process one byte from the transport.
    ///
    /// On a delimiter completing a valid packet, `on_frame` is called exactly
    /// once with the decoded frame and its result is returned. Calling back
    /// into this framer from the sink is rejected by the borrow checker, so
    /// the no-reentrancy rule needs no runtime guard.
    pub fn process_byte<F>(&mut self, byte: u8, on_frame: F) -> Result<()>
    where
        F: FnOnce(&[u8]) -> Result<()>,
    {
        if byte == DELIMITER {
            if self.rx_len == 0 {
                // Idle delimiter between packets.
                return Ok(());
            }

            let encoded_len = self.rx_len;
            // Reset before validating: a bad packet must leave the receiver
            // synchronized for the next one.
            self.rx_len = 0;

            let decoded_len = cobs::decode_in_place(&mut self.rx_buf[..encoded_len])?;
            if decoded_len < CRC_SIZE {
                return Err(WireError::FrameHeaderSize);
            }

            let frame_len = decoded_len - CRC_SIZE;
            let received_crc =
                u32::from_be_bytes(self.rx_buf[frame_len..decoded_len].try_into().unwrap());
            if received_crc != crc32_iso_hdlc(&self.rx_buf[..frame_len]) {
                return Err(WireError::CrcMismatch);
            }

            return on_frame(&self.rx_buf[..frame_len]);
        }

        if self.rx_len == self.rx_buf.len() {
            // Overflow: drop the packet, resynchronize on the next delimiter.
            self.rx_len = 0;
            return Err(WireError::FrameTooLarge);
        }
        self.rx_buf[self.rx_len] = byte;
        self.rx_len += 1;
        Ok(())
    }
}
