//! Transport integration: one framer, one router, one transport.

use bytebus_frame::{create_packet, max_frame_size, max_packet_size, Framer, Result, WireError};
use bytebus_schema::Message;
use bytebus_transport::Transport;
use tracing::trace;

use crate::router::Router;

/// Binds a [`Router`] and a [`Framer`] to a byte transport.
///
/// The node owns every buffer the data path touches: the framer's receive
/// buffer plus frame, packet, and payload scratch for transmit, all sized
/// from `max_payload` at construction. Neither `poll` nor `publish`
/// allocates.
///
/// A node has a single owner; `poll` and `publish` take `&mut self` and are
/// not re-entrant. A handler running under `poll` must not call back into
/// `poll` on the same node (the borrow checker enforces this); it may
/// publish on a *different* node it has access to.
pub struct Node<T: Transport, const MAX_HANDLERS: usize> {
    transport: T,
    framer: Framer,
    router: Router<MAX_HANDLERS>,
    max_payload: usize,
    tx_frame: Box<[u8]>,
    tx_packet: Box<[u8]>,
    // Typed publish encodes here before framing; keeping this separate from
    // tx_packet means the payload is never read out of a buffer that is
    // being encoded into.
    tx_payload: Box<[u8]>,
}

impl<T: Transport, const MAX_HANDLERS: usize> Node<T, MAX_HANDLERS> {
    /// Create a node speaking protocol version 1.
    pub fn new(transport: T, max_payload: usize) -> Self {
        Self::with_version(transport, max_payload, 1)
    }

    /// Create a node with an explicit protocol version byte.
    pub fn with_version(transport: T, max_payload: usize, expected_version: u8) -> Self {
        let frame_cap = max_frame_size(max_payload);
        let packet_cap = max_packet_size(max_payload);
        Self {
            transport,
            framer: Framer::new(packet_cap),
            router: Router::new(expected_version),
            max_payload,
            tx_frame: vec![0; frame_cap].into_boxed_slice(),
            tx_packet: vec![0; packet_cap].into_boxed_slice(),
            tx_payload: vec![0; max_payload].into_boxed_slice(),
        }
    }

    /// Largest payload this node can publish or accept.
    pub fn max_payload(&self) -> usize {
        self.max_payload
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable access to the underlying transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// The dispatch router, for registration through a longer-lived borrow.
    pub fn router_mut(&mut self) -> &mut Router<MAX_HANDLERS> {
        &mut self.router
    }

    /// Register a raw handler for a message id. See [`Router::register`].
    pub fn register<F>(&mut self, msg_id: u8, handler: F) -> Result<()>
    where
        F: FnMut(&[u8], u32) -> Result<()> + 'static,
    {
        self.router.register(msg_id, handler)
    }

    /// Register a typed handler for a message id. See
    /// [`Router::register_typed`].
    pub fn register_typed<M, F>(&mut self, msg_id: u8, handler: F) -> Result<()>
    where
        M: Message + 'static,
        F: FnMut(&M) -> Result<()> + 'static,
    {
        self.router.register_typed::<M, F>(msg_id, handler)
    }

    /// Drain the transport and dispatch every complete frame.
    ///
    /// Returns the number of non-OK results encountered (framing failures
    /// and handler errors alike). One bad packet never stops the bytes
    /// queued behind it; the framer resynchronizes and polling continues.
    pub fn poll(&mut self) -> usize {
        let Self {
            transport,
            framer,
            router,
            ..
        } = self;

        let mut errors = 0;
        while let Some(byte) = transport.read_byte() {
            if let Err(err) = framer.process_byte(byte, |frame| router.on_packet(frame)) {
                trace!(?err, "dropped packet");
                errors += 1;
            }
        }
        errors
    }

    /// Build a frame around `payload` and write the resulting packet to the
    /// transport. All-or-nothing: the first failure is returned and nothing
    /// is retried.
    pub fn publish(&mut self, msg_id: u8, msg_hash: u32, payload: &[u8]) -> Result<()> {
        let Self {
            transport,
            router,
            tx_frame,
            tx_packet,
            ..
        } = self;
        Self::send_frame(transport, router, tx_frame, tx_packet, msg_id, msg_hash, payload)
    }

    /// Encode a typed message and publish it under `M::MSG_HASH`.
    pub fn publish_msg<M: Message>(&mut self, msg_id: u8, msg: &M) -> Result<()> {
        let Self {
            transport,
            router,
            tx_frame,
            tx_packet,
            tx_payload,
            ..
        } = self;

        let payload_len = msg
            .encode(tx_payload)
            .map_err(|_| WireError::InvalidParameter)?;
        Self::send_frame(
            transport,
            router,
            tx_frame,
            tx_packet,
            msg_id,
            M::MSG_HASH,
            &tx_payload[..payload_len],
        )
    }

    fn send_frame(
        transport: &mut T,
        router: &Router<MAX_HANDLERS>,
        tx_frame: &mut [u8],
        tx_packet: &mut [u8],
        msg_id: u8,
        msg_hash: u32,
        payload: &[u8],
    ) -> Result<()> {
        let frame_len = router.build_frame(msg_id, msg_hash, payload, tx_frame)?;
        let packet_len = create_packet(&tx_frame[..frame_len], tx_packet)?;

        if !transport.write(&tx_packet[..packet_len]) {
            trace!(msg_id, packet_len, "transport rejected write");
            return Err(WireError::TransportError);
        }
        Ok(())
    }
}
