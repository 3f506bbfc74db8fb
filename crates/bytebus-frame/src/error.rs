/// Errors surfaced by the wire pipeline and message dispatch.
///
/// One taxonomy end to end: framing errors, router errors, and handler
/// results all travel through this enum, which lets `Node::poll` tally
/// failures without aborting on the first bad packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    /// Incoming packet grew past the framer's receive capacity.
    #[error("packet exceeds receive capacity")]
    FrameTooLarge,

    /// Invalid COBS encoding (zero byte in the body or a truncated run).
    #[error("invalid COBS encoding")]
    CobsDecodeFailed,

    /// CRC32 check failed after a successful decode.
    #[error("CRC32 mismatch")]
    CrcMismatch,

    /// Decoded frame shorter than the fixed header.
    #[error("frame shorter than header")]
    FrameHeaderSize,

    /// Protocol version byte (or typed-handler schema hash) mismatch.
    #[error("message version mismatch")]
    MsgVersionMismatch,

    /// No handler registered for this message id.
    #[error("unknown message id")]
    MsgIdUnknown,

    /// Payload length header disagrees with the actual frame size.
    #[error("message length mismatch")]
    MsgLengthMismatch,

    /// Undersized buffer, oversized payload, rejected decode, or full
    /// handler table.
    #[error("invalid parameter")]
    InvalidParameter,

    /// The transport rejected a write.
    #[error("transport write failed")]
    TransportError,
}

pub type Result<T> = std::result::Result<T, WireError>;
