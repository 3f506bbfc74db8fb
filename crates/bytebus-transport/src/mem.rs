//! In-memory duplex link for tests and demos.

use std::cell::RefCell;
use std::rc::Rc;

use bytes::{Buf, BytesMut};

/// One end of an in-memory bidirectional byte link.
///
/// Single-threaded by design: both ends live on the same thread and talk
/// through shared queues, which matches the bus's cooperative model. Writes
/// land in the peer's receive queue immediately; reads drain this end's
/// queue a byte at a time.
pub struct MemTransport {
    rx: Rc<RefCell<BytesMut>>,
    tx: Rc<RefCell<BytesMut>>,
}

/// Create a connected pair of in-memory transports.
///
/// Bytes written to one end become readable on the other, in FIFO order.
pub fn duplex() -> (MemTransport, MemTransport) {
    let a_to_b = Rc::new(RefCell::new(BytesMut::new()));
    let b_to_a = Rc::new(RefCell::new(BytesMut::new()));

    let a = MemTransport {
        rx: Rc::clone(&b_to_a),
        tx: Rc::clone(&a_to_b),
    };
    let b = MemTransport {
        rx: a_to_b,
        tx: b_to_a,
    };
    (a, b)
}

impl MemTransport {
    /// Bytes currently queued for this end to read.
    pub fn pending(&self) -> usize {
        self.rx.borrow().len()
    }
}

impl crate::Transport for MemTransport {
    fn read_byte(&mut self) -> Option<u8> {
        let mut rx = self.rx.borrow_mut();
        if rx.is_empty() {
            return None;
        }
        let byte = rx[0];
        rx.advance(1);
        Some(byte)
    }

    fn write(&mut self, data: &[u8]) -> bool {
        self.tx.borrow_mut().extend_from_slice(data);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Transport;

    #[test]
    fn bytes_cross_in_fifo_order() {
        let (mut a, mut b) = duplex();

        assert!(a.write(&[1, 2, 3]));
        assert_eq!(b.pending(), 3);
        assert_eq!(b.read_byte(), Some(1));
        assert_eq!(b.read_byte(), Some(2));
        assert_eq!(b.read_byte(), Some(3));
        assert_eq!(b.read_byte(), None);
    }

    #[test]
    fn directions_are_independent() {
        let (mut a, mut b) = duplex();

        assert!(a.write(&[0xAA]));
        assert!(b.write(&[0xBB]));

        assert_eq!(a.read_byte(), Some(0xBB));
        assert_eq!(a.read_byte(), None);
        assert_eq!(b.read_byte(), Some(0xAA));
        assert_eq!(b.read_byte(), None);
    }

    #[test]
    fn interleaved_writes_concatenate() {
        let (mut a, mut b) = duplex();

        assert!(a.write(&[1]));
        assert!(a.write(&[2, 3]));
        assert_eq!(b.read_byte(), Some(1));
        assert!(a.write(&[4]));
        assert_eq!(b.read_byte(), Some(2));
        assert_eq!(b.read_byte(), Some(3));
        assert_eq!(b.read_byte(), Some(4));
        assert_eq!(b.read_byte(), None);
    }
}
