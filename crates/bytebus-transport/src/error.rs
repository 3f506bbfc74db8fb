use std::path::PathBuf;

/// Errors that can occur while setting up a transport.
///
/// Only setup operations (bind, connect, open) report rich errors. The data
/// path keeps the minimal [`Transport`](crate::Transport) contract: a read
/// either yields a byte or doesn't, a write either accepts every byte or
/// fails as a whole.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to bind to the specified address.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    /// Failed to connect to the specified address.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    /// Failed to accept an incoming connection.
    #[error("failed to accept connection: {0}")]
    Accept(std::io::Error),

    /// Failed to open or configure a serial device.
    #[error("failed to open serial device {path}: {source}")]
    Serial {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An I/O error occurred during transport setup.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
