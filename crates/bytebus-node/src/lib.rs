//! Frame routing and transport integration.
//!
//! This is the layer applications talk to. A [`Router`] builds and parses
//! protocol frames and dispatches payloads to registered handlers by message
//! id; a [`Node`] binds a router and a framer to a byte
//! [`Transport`](bytebus_transport::Transport), exposing `poll` on the
//! receive side and `publish` on the send side.
//!
//! Frame format, big-endian throughout:
//!
//! ```text
//! version(1) | msg_id(1) | msg_hash(4) | len(2) | payload(len)
//! ```

pub mod node;
pub mod router;

pub use bytebus_frame::{
    max_frame_size, max_packet_size, Result, WireError, FRAME_HEADER_SIZE,
};
pub use node::Node;
pub use router::Router;
