//! Minimal UDP controller — toggles a remote LED once per second.
//!
//! Run with:
//!   cargo run --example udp-led-controller -- 10.0.0.5:7447
//!
//! On the receiving side:
//!   cargo run -p bytebus -- listen udp://0.0.0.0:7447 --ids 4

use std::time::Duration;

use bytebus_node::Node;
use bytebus_schema::{fnv1a_32, MarshalError, Message, Reader, Writer};
use bytebus_transport::UdpTransport;

const MSG_SET_LED: u8 = 4;

struct SetLed {
    state: bool,
}

impl Message for SetLed {
    const MSG_HASH: u32 = fnv1a_32(b"SetLed{state:bool}");

    fn encode(&self, out: &mut [u8]) -> Result<usize, MarshalError> {
        let mut w = Writer::new(out);
        w.write(self.state)?;
        Ok(w.bytes_written())
    }

    fn decode(payload: &[u8]) -> Result<Self, MarshalError> {
        let mut r = Reader::new(payload);
        Ok(Self { state: r.read()? })
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dest = std::env::args()
        .nth(1)
        .ok_or("usage: udp-led-controller <host:port>")?;

    let mut udp = UdpTransport::bind("0.0.0.0:0")?;
    udp.set_destination(dest.parse()?);
    eprintln!("Targeting {dest}");

    let mut node: Node<_, 4> = Node::new(udp, 256);
    let mut led_state = true;

    loop {
        node.poll();

        eprintln!("Sending SetLed: {}", if led_state { "ON" } else { "OFF" });
        node.publish_msg(MSG_SET_LED, &SetLed { state: led_state })?;

        led_state = !led_state;
        std::thread::sleep(Duration::from_secs(1));
    }
}
