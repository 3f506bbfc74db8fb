//! The contract between typed messages and the bus.

use crate::error::Result;

/// A typed message that can travel on the bus.
///
/// `MSG_HASH` is an opaque 32-bit schema fingerprint carried in every frame
/// and checked on typed dispatch; mint it with
/// [`fnv1a_32`](crate::fnv1a_32) over a canonical description of the
/// message's fields, or any other scheme both ends agree on.
///
/// Encoding follows the canonical marshalling rules (see
/// [`marshal`](crate::marshal)): big-endian scalars, strict bools, floats by
/// bit pattern, arrays without length prefixes.
pub trait Message: Sized {
    /// Schema fingerprint carried alongside every instance on the wire.
    const MSG_HASH: u32;

    /// Encode into `out`, returning the number of bytes written.
    ///
    /// `out` provides capacity; implementations fail rather than truncate.
    fn encode(&self, out: &mut [u8]) -> Result<usize>;

    /// Decode from a payload. How strict to be (for instance, requiring the
    /// payload to be fully consumed) is the message's choice.
    fn decode(payload: &[u8]) -> Result<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MarshalError;
    use crate::hash::fnv1a_32;
    use crate::marshal::{Reader, Writer};

    #[derive(Debug, PartialEq)]
    struct SensorReading {
        channel: u8,
        value: f32,
        saturated: bool,
    }

    impl Message for SensorReading {
        const MSG_HASH: u32 = fnv1a_32(b"SensorReading{channel:u8,value:f32,saturated:bool}");

        fn encode(&self, out: &mut [u8]) -> Result<usize> {
            let mut w = Writer::new(out);
            w.write(self.channel)?;
            w.write(self.value)?;
            w.write(self.saturated)?;
            Ok(w.bytes_written())
        }

        fn decode(payload: &[u8]) -> Result<Self> {
            let mut r = Reader::new(payload);
            let msg = Self {
                channel: r.read()?,
                value: r.read()?,
                saturated: r.read()?,
            };
            if !r.fully_consumed() {
                return Err(MarshalError::UnexpectedEnd);
            }
            Ok(msg)
        }
    }

    #[test]
    fn encode_decode_round_trip() {
        let msg = SensorReading {
            channel: 3,
            value: 21.5,
            saturated: false,
        };

        let mut payload = [0u8; 16];
        let len = msg.encode(&mut payload).unwrap();
        assert_eq!(len, 6);
        assert_eq!(SensorReading::decode(&payload[..len]).unwrap(), msg);
    }

    #[test]
    fn strict_decode_rejects_trailing_bytes() {
        let mut payload = [0u8; 7];
        let msg = SensorReading {
            channel: 1,
            value: 0.0,
            saturated: true,
        };
        msg.encode(&mut payload).unwrap();
        // One extra byte beyond the encoded fields.
        assert!(SensorReading::decode(&payload).is_err());
    }

    #[test]
    fn encode_fails_rather_than_truncates() {
        let msg = SensorReading {
            channel: 1,
            value: 1.0,
            saturated: true,
        };
        let mut payload = [0u8; 4];
        assert_eq!(
            msg.encode(&mut payload),
            Err(MarshalError::BufferOverflow)
        );
    }
}
