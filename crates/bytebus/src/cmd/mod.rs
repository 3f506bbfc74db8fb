use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;

use clap::{Args, Subcommand};

use bytebus_transport::{TcpTransport, Transport, UdpTransport};

use crate::exit::{transport_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod listen;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Publish a single message.
    Send(SendArgs),
    /// Receive and print messages.
    Listen(ListenArgs),
    /// Show version information.
    Version,
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Send(args) => send::run(args),
        Command::Listen(args) => listen::run(args, format),
        Command::Version => version::run(),
    }
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Endpoint: udp://bind?dest=host:port | tcp://host:port | serial://path[?baud=N]
    pub endpoint: String,
    /// Message id to publish under.
    #[arg(long, short = 'i')]
    pub id: u8,
    /// Schema hash carried in the frame (decimal or 0x-prefixed hex).
    #[arg(long, default_value = "0")]
    pub hash: String,
    /// UTF-8 string payload.
    #[arg(long, conflicts_with_all = ["hex", "file"])]
    pub data: Option<String>,
    /// Hex-encoded payload.
    #[arg(long, conflicts_with_all = ["data", "file"])]
    pub hex: Option<String>,
    /// Read payload from file.
    #[arg(long, conflicts_with_all = ["data", "hex"])]
    pub file: Option<PathBuf>,
    /// Maximum payload size the node is built for.
    #[arg(long, default_value_t = 1024)]
    pub max_payload: usize,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Endpoint: udp://bind | tcp://bind | serial://path[?baud=N]
    pub endpoint: String,
    /// Only print these message ids (comma-separated). Default: all.
    #[arg(long, value_delimiter = ',')]
    pub ids: Option<Vec<u8>>,
    /// Exit after receiving N frames.
    #[arg(long)]
    pub count: Option<usize>,
    /// Maximum payload size the node is built for.
    #[arg(long, default_value_t = 1024)]
    pub max_payload: usize,
}

/// A parsed transport endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Udp {
        bind: String,
        dest: Option<String>,
    },
    Tcp {
        addr: String,
    },
    Serial {
        path: PathBuf,
        baud: u32,
    },
}

/// Parse `scheme://rest` endpoint syntax.
pub fn parse_endpoint(input: &str) -> CliResult<Endpoint> {
    let (scheme, rest) = input
        .split_once("://")
        .ok_or_else(|| CliError::new(USAGE, format!("missing scheme in endpoint: {input}")))?;

    match scheme {
        "udp" => {
            let (bind, query) = split_query(rest);
            if bind.is_empty() {
                return Err(CliError::new(USAGE, "udp endpoint needs a bind address"));
            }
            let dest = query
                .and_then(|q| q.strip_prefix("dest="))
                .map(str::to_string);
            Ok(Endpoint::Udp {
                bind: bind.to_string(),
                dest,
            })
        }
        "tcp" => {
            if rest.is_empty() {
                return Err(CliError::new(USAGE, "tcp endpoint needs an address"));
            }
            Ok(Endpoint::Tcp {
                addr: rest.to_string(),
            })
        }
        "serial" => {
            let (path, query) = split_query(rest);
            if path.is_empty() {
                return Err(CliError::new(USAGE, "serial endpoint needs a device path"));
            }
            let baud = match query.and_then(|q| q.strip_prefix("baud=")) {
                Some(value) => value.parse().map_err(|_| {
                    CliError::new(USAGE, format!("invalid baud rate: {value}"))
                })?,
                None => 115_200,
            };
            Ok(Endpoint::Serial {
                path: PathBuf::from(path),
                baud,
            })
        }
        other => Err(CliError::new(
            USAGE,
            format!("unsupported endpoint scheme: {other}"),
        )),
    }
}

fn split_query(rest: &str) -> (&str, Option<&str>) {
    match rest.split_once('?') {
        Some((head, query)) => (head, Some(query)),
        None => (rest, None),
    }
}

/// Transport selected at runtime from an endpoint.
pub enum AnyTransport {
    Udp(UdpTransport),
    Tcp(TcpTransport),
    #[cfg(unix)]
    Serial(bytebus_transport::SerialPort),
}

impl Transport for AnyTransport {
    fn read_byte(&mut self) -> Option<u8> {
        match self {
            AnyTransport::Udp(t) => t.read_byte(),
            AnyTransport::Tcp(t) => t.read_byte(),
            #[cfg(unix)]
            AnyTransport::Serial(t) => t.read_byte(),
        }
    }

    fn write(&mut self, data: &[u8]) -> bool {
        match self {
            AnyTransport::Udp(t) => t.write(data),
            AnyTransport::Tcp(t) => t.write(data),
            #[cfg(unix)]
            AnyTransport::Serial(t) => t.write(data),
        }
    }
}

/// Open an endpoint for publishing.
pub fn open_for_send(endpoint: &Endpoint) -> CliResult<AnyTransport> {
    match endpoint {
        Endpoint::Udp { bind, dest } => {
            let dest = dest
                .as_deref()
                .ok_or_else(|| CliError::new(USAGE, "udp send endpoint needs ?dest=host:port"))?;
            let dest = resolve(dest)?;
            let mut transport = UdpTransport::bind(bind.as_str())
                .map_err(|err| transport_error("udp bind failed", err))?;
            transport.set_destination(dest);
            Ok(AnyTransport::Udp(transport))
        }
        Endpoint::Tcp { addr } => TcpTransport::connect(addr.as_str())
            .map(AnyTransport::Tcp)
            .map_err(|err| transport_error("tcp connect failed", err)),
        Endpoint::Serial { path, baud } => open_serial(path, *baud),
    }
}

/// Open an endpoint for receiving.
pub fn open_for_listen(endpoint: &Endpoint) -> CliResult<AnyTransport> {
    match endpoint {
        Endpoint::Udp { bind, .. } => UdpTransport::bind(bind.as_str())
            .map(AnyTransport::Udp)
            .map_err(|err| transport_error("udp bind failed", err)),
        Endpoint::Tcp { addr } => TcpTransport::accept_one(addr.as_str())
            .map(AnyTransport::Tcp)
            .map_err(|err| transport_error("tcp accept failed", err)),
        Endpoint::Serial { path, baud } => open_serial(path, *baud),
    }
}

#[cfg(unix)]
fn open_serial(path: &std::path::Path, baud: u32) -> CliResult<AnyTransport> {
    use bytebus_transport::serial::BaudRate;

    let baud = match baud {
        9_600 => BaudRate::B9600,
        19_200 => BaudRate::B19200,
        38_400 => BaudRate::B38400,
        57_600 => BaudRate::B57600,
        115_200 => BaudRate::B115200,
        other => {
            return Err(CliError::new(
                USAGE,
                format!("unsupported baud rate: {other}"),
            ))
        }
    };

    bytebus_transport::SerialPort::open(path, baud)
        .map(AnyTransport::Serial)
        .map_err(|err| transport_error("serial open failed", err))
}

#[cfg(not(unix))]
fn open_serial(_path: &std::path::Path, _baud: u32) -> CliResult<AnyTransport> {
    Err(CliError::new(
        USAGE,
        "serial endpoints are only supported on unix",
    ))
}

fn resolve(addr: &str) -> CliResult<SocketAddr> {
    addr.to_socket_addrs()
        .map_err(|err| CliError::new(USAGE, format!("cannot resolve {addr}: {err}")))?
        .next()
        .ok_or_else(|| CliError::new(USAGE, format!("no address for {addr}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_udp_with_dest() {
        let ep = parse_endpoint("udp://0.0.0.0:7447?dest=10.0.0.5:7447").unwrap();
        assert_eq!(
            ep,
            Endpoint::Udp {
                bind: "0.0.0.0:7447".to_string(),
                dest: Some("10.0.0.5:7447".to_string()),
            }
        );
    }

    #[test]
    fn parses_udp_without_dest() {
        let ep = parse_endpoint("udp://0.0.0.0:7447").unwrap();
        assert_eq!(
            ep,
            Endpoint::Udp {
                bind: "0.0.0.0:7447".to_string(),
                dest: None,
            }
        );
    }

    #[test]
    fn parses_tcp() {
        let ep = parse_endpoint("tcp://192.168.1.20:7447").unwrap();
        assert_eq!(
            ep,
            Endpoint::Tcp {
                addr: "192.168.1.20:7447".to_string(),
            }
        );
    }

    #[test]
    fn parses_serial_with_default_baud() {
        let ep = parse_endpoint("serial:///dev/ttyUSB0").unwrap();
        assert_eq!(
            ep,
            Endpoint::Serial {
                path: PathBuf::from("/dev/ttyUSB0"),
                baud: 115_200,
            }
        );
    }

    #[test]
    fn parses_serial_with_baud() {
        let ep = parse_endpoint("serial:///dev/ttyACM0?baud=57600").unwrap();
        assert_eq!(
            ep,
            Endpoint::Serial {
                path: PathBuf::from("/dev/ttyACM0"),
                baud: 57_600,
            }
        );
    }

    #[test]
    fn rejects_unknown_scheme() {
        assert!(parse_endpoint("quic://host:1").is_err());
        assert!(parse_endpoint("no-scheme").is_err());
        assert!(parse_endpoint("udp://").is_err());
        assert!(parse_endpoint("serial://?baud=9600").is_err());
    }

    #[test]
    fn rejects_bad_baud() {
        assert!(parse_endpoint("serial:///dev/ttyUSB0?baud=fast").is_err());
    }
}
