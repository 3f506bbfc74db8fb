//! Protocol frame build/parse and dispatch by message id.

use bytebus_frame::{Result, WireError, FRAME_HEADER_SIZE};
use bytebus_schema::Message;

/// Largest payload a frame can carry (the `len` header is 16 bits).
pub const MAX_PAYLOAD_LEN: usize = u16::MAX as usize;

type BoxedHandler = Box<dyn FnMut(&[u8], u32) -> Result<()>>;

struct HandlerSlot {
    msg_id: u8,
    handler: BoxedHandler,
}

/// Builds and parses protocol frames and dispatches payloads by `msg_id`.
///
/// The handler table is a flat array of `MAX_HANDLERS` slots scanned in
/// index order, with at most one slot per message id. Registering a handler
/// boxes it once; dispatch is a plain indirect call with no allocation.
///
/// Incoming frames are assumed to have passed CRC validation already
/// (normally performed by the [`Framer`](bytebus_frame::Framer)); the router
/// checks the protocol header, not integrity.
pub struct Router<const MAX_HANDLERS: usize> {
    expected_version: u8,
    slots: [Option<HandlerSlot>; MAX_HANDLERS],
}

impl<const MAX_HANDLERS: usize> Router<MAX_HANDLERS> {
    /// Create a router that accepts frames carrying `expected_version`.
    pub fn new(expected_version: u8) -> Self {
        Self {
            expected_version,
            slots: std::array::from_fn(|_| None),
        }
    }

    /// The protocol version this router stamps on built frames and requires
    /// of incoming ones.
    pub fn expected_version(&self) -> u8 {
        self.expected_version
    }

    /// Build a protocol frame into `out`, returning the frame length.
    ///
    /// Writes the header (version, `msg_id`, `msg_hash`, payload length) and
    /// copies the payload. Fails with [`WireError::InvalidParameter`] if the
    /// payload exceeds [`MAX_PAYLOAD_LEN`] or `out` is too small.
    pub fn build_frame(
        &self,
        msg_id: u8,
        msg_hash: u32,
        payload: &[u8],
        out: &mut [u8],
    ) -> Result<usize> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(WireError::InvalidParameter);
        }
        let needed = FRAME_HEADER_SIZE + payload.len();
        if out.len() < needed {
            return Err(WireError::InvalidParameter);
        }

        out[0] = self.expected_version;
        out[1] = msg_id;
        out[2..6].copy_from_slice(&msg_hash.to_be_bytes());
        out[6..8].copy_from_slice(&(payload.len() as u16).to_be_bytes());
        out[FRAME_HEADER_SIZE..needed].copy_from_slice(payload);
        Ok(needed)
    }

    /// Register a raw handler for a message id.
    ///
    /// The handler receives the payload slice and the frame's `msg_hash`.
    /// The payload aliases framer-owned receive storage and is only valid
    /// for the duration of the call; copy it out to retain it.
    ///
    /// If a handler for `msg_id` already exists it is replaced. Fails with
    /// [`WireError::InvalidParameter`] when the id is new and the table is
    /// full.
    pub fn register<F>(&mut self, msg_id: u8, handler: F) -> Result<()>
    where
        F: FnMut(&[u8], u32) -> Result<()> + 'static,
    {
        self.install(msg_id, Box::new(handler))
    }

    /// Register a typed handler for a message id.
    ///
    /// On dispatch the frame's `msg_hash` is checked against `M::MSG_HASH`
    /// (mismatch reports [`WireError::MsgVersionMismatch`]) and the payload
    /// decoded (failure reports [`WireError::InvalidParameter`]); the
    /// handler only ever sees well-formed messages.
    pub fn register_typed<M, F>(&mut self, msg_id: u8, mut handler: F) -> Result<()>
    where
        M: Message + 'static,
        F: FnMut(&M) -> Result<()> + 'static,
    {
        self.install(
            msg_id,
            Box::new(move |payload, msg_hash| {
                if msg_hash != M::MSG_HASH {
                    return Err(WireError::MsgVersionMismatch);
                }
                let msg = M::decode(payload).map_err(|_| WireError::InvalidParameter)?;
                handler(&msg)
            }),
        )
    }

    fn install(&mut self, msg_id: u8, handler: BoxedHandler) -> Result<()> {
        // Update the existing entry if the id is already present.
        if let Some(slot) = self.slots.iter_mut().flatten().find(|s| s.msg_id == msg_id) {
            slot.handler = handler;
            return Ok(());
        }

        // Otherwise take the first free slot.
        match self.slots.iter_mut().find(|s| s.is_none()) {
            Some(free) => {
                *free = Some(HandlerSlot { msg_id, handler });
                Ok(())
            }
            None => Err(WireError::InvalidParameter),
        }
    }

    /// Parse a complete, CRC-validated frame and dispatch its payload.
    ///
    /// Validation order: header size, version byte, then the `len` field
    /// against the actual frame size. The payload and hash are handed to the
    /// handler registered for the frame's `msg_id`; the handler's own result
    /// is returned.
    pub fn on_packet(&mut self, frame: &[u8]) -> Result<()> {
        if frame.len() < FRAME_HEADER_SIZE {
            return Err(WireError::FrameHeaderSize);
        }
        if frame[0] != self.expected_version {
            return Err(WireError::MsgVersionMismatch);
        }

        let msg_id = frame[1];
        let msg_hash = u32::from_be_bytes(frame[2..6].try_into().unwrap());
        let payload_len = u16::from_be_bytes(frame[6..8].try_into().unwrap()) as usize;

        if frame.len() != FRAME_HEADER_SIZE + payload_len {
            return Err(WireError::MsgLengthMismatch);
        }
        let payload = &frame[FRAME_HEADER_SIZE..];

        let slot = self
            .slots
            .iter_mut()
            .flatten()
            .find(|s| s.msg_id == msg_id)
            .ok_or(WireError::MsgIdUnknown)?;
        (slot.handler)(payload, msg_hash)
    }
}

impl<const MAX_HANDLERS: usize> Default for Router<MAX_HANDLERS> {
    fn default() -> Self {
        Self::new(1)
    }
}
