//! Consistent Overhead Byte Stuffing.
//!
//! COBS rewrites a byte sequence so that it contains no `0x00`, at a
//! worst-case cost of one byte per 254 input bytes plus one leading code
//! byte. The framer uses it to make `0x00` a packet delimiter that can never
//! appear inside a packet body.

use crate::error::{Result, WireError};

/// Incremental COBS encoder writing into a caller-provided buffer.
///
/// Drive it one byte at a time: [`Encoder::new`], then [`Encoder::put`] for
/// each input byte, then [`Encoder::finish`]. The output never contains a
/// zero byte and does not include the trailing delimiter; appending that is
/// the framer's job.
pub struct Encoder<'a> {
    out: &'a mut [u8],
    code_index: usize,
    write_index: usize,
    code: u8,
}

impl<'a> Encoder<'a> {
    /// Start encoding into `out`. Fails if `out` is empty.
    pub fn new(out: &'a mut [u8]) -> Result<Self> {
        if out.is_empty() {
            return Err(WireError::InvalidParameter);
        }
        // Placeholder for the first group's code byte.
        out[0] = 0;
        Ok(Self {
            out,
            code_index: 0,
            write_index: 1,
            code: 1,
        })
    }

    /// Append one input byte. Fails if the output buffer overflows.
    pub fn put(&mut self, byte: u8) -> Result<()> {
        if byte == 0 {
            return self.close_group();
        }

        if self.write_index >= self.out.len() {
            return Err(WireError::InvalidParameter);
        }
        self.out[self.write_index] = byte;
        self.write_index += 1;
        self.code += 1;

        // A full 254-byte run closes the group without an implied zero.
        if self.code == 0xFF {
            return self.close_group();
        }
        Ok(())
    }

    /// Append a run of input bytes.
    pub fn put_all(&mut self, bytes: &[u8]) -> Result<()> {
        for &byte in bytes {
            self.put(byte)?;
        }
        Ok(())
    }

    /// Seal the final group and return the total number of bytes written.
    pub fn finish(self) -> usize {
        self.out[self.code_index] = self.code;
        self.write_index
    }

    /// Seal the open group and reserve the code slot for the next one.
    fn close_group(&mut self) -> Result<()> {
        if self.write_index >= self.out.len() {
            return Err(WireError::InvalidParameter);
        }
        self.out[self.code_index] = self.code;
        self.code_index = self.write_index;
        self.write_index += 1;
        self.code = 1;
        Ok(())
    }
}

/// COBS-encode `input` into `out`, returning the encoded length.
pub fn encode(input: &[u8], out: &mut [u8]) -> Result<usize> {
    encode_pair(input, &[], out)
}

/// COBS-encode the concatenation `first ‖ second` into `out`.
///
/// Lets the framer encode `frame ‖ crc` without staging them in a temporary
/// contiguous buffer.
pub fn encode_pair(first: &[u8], second: &[u8], out: &mut [u8]) -> Result<usize> {
    let mut enc = Encoder::new(out)?;
    enc.put_all(first)?;
    enc.put_all(second)?;
    Ok(enc.finish())
}

/// Decode a COBS-encoded buffer in place, returning the decoded length.
///
/// `buf` holds the encoded bytes with the delimiter already stripped. Zero
/// bytes are never valid inside the encoded region; one of those, or a group
/// missing its promised data bytes, fails with
/// [`WireError::CobsDecodeFailed`]. The decoder never writes past what it
/// has read, which is what makes single-buffer operation sound.
pub fn decode_in_place(buf: &mut [u8]) -> Result<usize> {
    let encoded_len = buf.len();
    let mut read_index = 0;
    let mut write_index = 0;

    while read_index < encoded_len {
        let code = buf[read_index];
        read_index += 1;
        if code == 0 {
            return Err(WireError::CobsDecodeFailed);
        }

        for _ in 1..code {
            if read_index >= encoded_len {
                return Err(WireError::CobsDecodeFailed);
            }
            buf[write_index] = buf[read_index];
            write_index += 1;
            read_index += 1;
        }

        // Every group except a full 254-run and the final one stands for a
        // zero byte in the original data.
        if code != 0xFF && read_index < encoded_len {
            buf[write_index] = 0;
            write_index += 1;
        }
    }

    Ok(write_index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(input: &[u8]) {
        let mut out = vec![0u8; input.len() + crate::cobs_max_overhead(input.len()) + 1];
        let encoded_len = encode(input, &mut out).unwrap();

        assert!(
            out[..encoded_len].iter().all(|&b| b != 0),
            "encoded region must be zero-free for input {input:02x?}"
        );

        let mut buf = out[..encoded_len].to_vec();
        let decoded_len = decode_in_place(&mut buf).unwrap();
        assert_eq!(&buf[..decoded_len], input);
    }

    #[test]
    fn known_vectors() {
        let cases: &[(&[u8], &[u8])] = &[
            (&[], &[0x01]),
            (&[0x00], &[0x01, 0x01]),
            (&[0x00, 0x00], &[0x01, 0x01, 0x01]),
            (&[0x11, 0x22, 0x00, 0x33], &[0x03, 0x11, 0x22, 0x02, 0x33]),
            (&[0x11, 0x22, 0x33, 0x44], &[0x05, 0x11, 0x22, 0x33, 0x44]),
            (&[0x11, 0x00, 0x00, 0x00], &[0x02, 0x11, 0x01, 0x01, 0x01]),
        ];

        for (input, expected) in cases {
            let mut out = vec![0u8; expected.len()];
            let encoded_len = encode(input, &mut out).unwrap();
            assert_eq!(&out[..encoded_len], *expected, "input {input:02x?}");
        }
    }

    #[test]
    fn roundtrip_short_inputs() {
        roundtrip(&[]);
        roundtrip(&[0x01]);
        roundtrip(&[0x00]);
        roundtrip(b"hello, bytebus");
        roundtrip(&[0x00, 0xFF, 0x00, 0xFF]);
    }

    #[test]
    fn roundtrip_at_run_boundaries() {
        // 253, 254, 255 consecutive non-zero bytes straddle the 0xFF code
        // boundary.
        for len in [253usize, 254, 255, 300, 508, 509] {
            let input: Vec<u8> = (0..len).map(|i| (i % 255) as u8 + 1).collect();
            roundtrip(&input);
        }
    }

    #[test]
    fn roundtrip_sprinkled_zeros() {
        let mut input = vec![0xABu8; 1000];
        for i in (0..input.len()).step_by(50) {
            input[i] = 0;
        }
        roundtrip(&input);
    }

    #[test]
    fn full_run_has_expected_shape() {
        let input = [0x42u8; 254];
        let mut out = vec![0u8; 256];
        let encoded_len = encode(&input, &mut out).unwrap();

        // One 0xFF group plus an empty trailing group.
        assert_eq!(encoded_len, 256);
        assert_eq!(out[0], 0xFF);
        assert_eq!(out[255], 0x01);
    }

    #[test]
    fn encoder_rejects_empty_output() {
        let mut out: [u8; 0] = [];
        assert_eq!(
            Encoder::new(&mut out).err(),
            Some(WireError::InvalidParameter)
        );
    }

    #[test]
    fn encoder_reports_overflow() {
        let mut out = [0u8; 3];
        let mut enc = Encoder::new(&mut out).unwrap();
        enc.put(0x01).unwrap();
        enc.put(0x02).unwrap();
        assert_eq!(enc.put(0x03), Err(WireError::InvalidParameter));
    }

    #[test]
    fn decode_rejects_zero_code_byte() {
        let mut buf = [0x01, 0x00, 0x11];
        assert_eq!(
            decode_in_place(&mut buf),
            Err(WireError::CobsDecodeFailed)
        );
    }

    #[test]
    fn decode_rejects_truncated_run() {
        // Code byte promises 4 data bytes, only 2 follow.
        let mut buf = [0x05, 0x11, 0x22];
        assert_eq!(
            decode_in_place(&mut buf),
            Err(WireError::CobsDecodeFailed)
        );
    }

    #[test]
    fn decode_empty_buffer_is_empty() {
        let mut buf: [u8; 0] = [];
        assert_eq!(decode_in_place(&mut buf).unwrap(), 0);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn roundtrip_arbitrary(input in proptest::collection::vec(any::<u8>(), 0..2048)) {
                roundtrip(&input);
            }

            #[test]
            fn decoded_length_matches_group_arithmetic(
                input in proptest::collection::vec(any::<u8>(), 0..2048)
            ) {
                let mut out = vec![0u8; input.len() + crate::cobs_max_overhead(input.len()) + 1];
                let encoded_len = encode(&input, &mut out).unwrap();

                // Walk the code groups; data bytes may themselves be 0xFF.
                let mut full_runs = 0;
                let mut i = 0;
                while i < encoded_len {
                    let code = out[i] as usize;
                    if code == 0xFF {
                        full_runs += 1;
                    }
                    i += code;
                }

                // Encoded size = decoded size + leading code + one per 254-run.
                prop_assert_eq!(encoded_len, input.len() + 1 + full_runs);
            }
        }
    }
}
