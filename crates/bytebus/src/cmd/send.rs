use std::fs;

use bytebus_node::Node;
use tracing::debug;

use crate::cmd::{open_for_send, parse_endpoint, SendArgs};
use crate::exit::{io_error, wire_error, CliError, CliResult, SUCCESS, USAGE};

pub fn run(args: SendArgs) -> CliResult<i32> {
    let endpoint = parse_endpoint(&args.endpoint)?;
    let hash = parse_u32(&args.hash)?;
    let payload = resolve_payload(&args)?;

    let transport = open_for_send(&endpoint)?;
    let mut node: Node<_, 1> = Node::new(transport, args.max_payload);

    debug!(id = args.id, hash, size = payload.len(), "publishing");
    node.publish(args.id, hash, &payload)
        .map_err(|err| wire_error("publish failed", err))?;

    Ok(SUCCESS)
}

fn resolve_payload(args: &SendArgs) -> CliResult<Vec<u8>> {
    if let Some(data) = &args.data {
        return Ok(data.as_bytes().to_vec());
    }
    if let Some(hex) = &args.hex {
        return parse_hex(hex);
    }
    if let Some(path) = &args.file {
        return fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }
    Ok(Vec::new())
}

/// Accept `0x`-prefixed hex or plain decimal.
fn parse_u32(input: &str) -> CliResult<u32> {
    let parsed = match input.strip_prefix("0x").or_else(|| input.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => input.parse(),
    };
    parsed.map_err(|_| CliError::new(USAGE, format!("invalid 32-bit value: {input}")))
}

fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let cleaned: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.len() % 2 != 0 {
        return Err(CliError::new(USAGE, "--hex needs an even number of digits"));
    }
    (0..cleaned.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&cleaned[i..i + 2], 16)
                .map_err(|_| CliError::new(USAGE, format!("invalid hex payload: {input}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_u32_decimal_and_hex() {
        assert_eq!(parse_u32("0").unwrap(), 0);
        assert_eq!(parse_u32("4097").unwrap(), 4097);
        assert_eq!(parse_u32("0xAABBCCDD").unwrap(), 0xAABB_CCDD);
        assert_eq!(parse_u32("0Xff").unwrap(), 0xFF);
    }

    #[test]
    fn parse_u32_rejects_garbage() {
        assert!(parse_u32("").is_err());
        assert!(parse_u32("0x").is_err());
        assert!(parse_u32("twelve").is_err());
        assert!(parse_u32("4294967296").is_err());
    }

    #[test]
    fn parse_hex_payloads() {
        assert_eq!(parse_hex("0102ff").unwrap(), vec![0x01, 0x02, 0xFF]);
        assert_eq!(parse_hex("01 02 ff").unwrap(), vec![0x01, 0x02, 0xFF]);
        assert_eq!(parse_hex("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn parse_hex_rejects_odd_or_invalid() {
        assert!(parse_hex("012").is_err());
        assert!(parse_hex("zz").is_err());
    }
}
