use clap::ValueEnum;
use serde::Serialize;

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    msg_id: u8,
    msg_hash: u32,
    payload_size: usize,
    payload: &'a str,
}

/// Print one received frame to stdout.
pub fn print_frame(msg_id: u8, msg_hash: u32, payload: &[u8], format: OutputFormat) {
    let preview = payload_preview(payload);
    match format {
        OutputFormat::Text => {
            println!(
                "id={msg_id} hash={msg_hash:#010x} size={} payload={preview}",
                payload.len()
            );
        }
        OutputFormat::Json => {
            let out = FrameOutput {
                msg_id,
                msg_hash,
                payload_size: payload.len(),
                payload: &preview,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
    }
}

fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) if text.chars().all(|c| !c.is_control()) => text.to_string(),
        _ => hex_string(payload),
    }
}

fn hex_string(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2 + 2);
    out.push_str("0x");
    for byte in bytes {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn printable_payloads_stay_text() {
        assert_eq!(payload_preview(b"hello"), "hello");
    }

    #[test]
    fn binary_payloads_become_hex() {
        assert_eq!(payload_preview(&[0x00, 0xFF]), "0x00ff");
        assert_eq!(payload_preview(b"line\nbreak"), "0x6c696e650a627265616b");
    }
}
