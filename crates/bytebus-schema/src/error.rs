/// Errors that can occur while marshalling payload bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MarshalError {
    /// A write ran past the output buffer's capacity.
    #[error("write past end of payload buffer")]
    BufferOverflow,

    /// A read ran past the end of the input.
    #[error("read past end of payload")]
    UnexpectedEnd,

    /// A bool field held a byte other than 0x00 or 0x01.
    #[error("invalid bool encoding")]
    InvalidBool,
}

pub type Result<T> = std::result::Result<T, MarshalError>;
