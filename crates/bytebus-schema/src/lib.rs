//! Canonical payload marshalling and message contracts.
//!
//! Payloads on the bus follow one set of rules: multi-byte scalars are
//! big-endian, `bool` is strictly 0x00/0x01, floats travel by IEEE-754 bit
//! pattern, arrays are element-by-element with no length prefix. The
//! [`Writer`]/[`Reader`] cursors implement those rules over fixed buffers;
//! the [`Message`] trait is the contract typed publish and dispatch build on.

pub mod error;
pub mod hash;
pub mod marshal;
pub mod message;

pub use error::{MarshalError, Result};
pub use hash::fnv1a_32;
pub use marshal::{Reader, Scalar, Writer};
pub use message::Message;
