//! Raw serial port transport (unix).

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::Transport;

/// Supported serial line rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaudRate {
    B9600,
    B19200,
    B38400,
    B57600,
    B115200,
}

impl BaudRate {
    fn to_termios(self) -> libc::speed_t {
        match self {
            BaudRate::B9600 => libc::B9600,
            BaudRate::B19200 => libc::B19200,
            BaudRate::B38400 => libc::B38400,
            BaudRate::B57600 => libc::B57600,
            BaudRate::B115200 => libc::B115200,
        }
    }
}

/// A tty configured for raw 8N1 communication.
///
/// Reads are non-blocking; writes retry on `EAGAIN` until the kernel buffer
/// drains, matching the "brief on write" transport expectation.
pub struct SerialPort {
    file: File,
    path: PathBuf,
}

impl SerialPort {
    /// Open `path` and configure it: 8 data bits, no parity, one stop bit,
    /// no flow control, raw input/output, non-blocking reads.
    pub fn open(path: impl AsRef<Path>, baud: BaudRate) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|source| TransportError::Serial {
                path: path.clone(),
                source,
            })?;

        configure_raw_8n1(&file, baud).map_err(|source| TransportError::Serial {
            path: path.clone(),
            source,
        })?;

        debug!(?path, ?baud, "opened serial port");
        Ok(Self { file, path })
    }

    /// The device path this port was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn configure_raw_8n1(file: &File, baud: BaudRate) -> std::io::Result<()> {
    let fd = file.as_raw_fd();

    // SAFETY: zeroed termios is a valid initial value; tcgetattr fills it in.
    let mut options: libc::termios = unsafe { std::mem::zeroed() };
    // SAFETY: `fd` is an open descriptor owned by `file`; `options` is a
    // valid writable pointer.
    if unsafe { libc::tcgetattr(fd, &mut options) } != 0 {
        return Err(std::io::Error::last_os_error());
    }

    // SAFETY: cfsetispeed/cfsetospeed only write into `options`.
    unsafe {
        libc::cfsetispeed(&mut options, baud.to_termios());
        libc::cfsetospeed(&mut options, baud.to_termios());
    }

    // 8N1, no flow control, receiver enabled, local line.
    options.c_cflag &= !(libc::PARENB | libc::CSTOPB | libc::CSIZE | libc::CRTSCTS);
    options.c_cflag |= libc::CS8 | libc::CLOCAL | libc::CREAD;
    // Raw input and output.
    options.c_lflag &= !(libc::ICANON | libc::ECHO | libc::ECHOE | libc::ISIG);
    options.c_iflag &= !(libc::IXON | libc::IXOFF | libc::IXANY);
    options.c_oflag &= !libc::OPOST;
    // Non-blocking reads: return immediately with whatever is available.
    options.c_cc[libc::VMIN] = 0;
    options.c_cc[libc::VTIME] = 0;

    // SAFETY: `fd` is open and `options` was initialized by tcgetattr above.
    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &options) } != 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

impl Transport for SerialPort {
    fn read_byte(&mut self) -> Option<u8> {
        let mut byte = [0u8; 1];
        loop {
            match self.file.read(&mut byte) {
                Ok(1) => return Some(byte[0]),
                Ok(_) => return None,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(_) => return None,
            }
        }
    }

    fn write(&mut self, data: &[u8]) -> bool {
        let mut offset = 0;
        while offset < data.len() {
            match self.file.write(&data[offset..]) {
                Ok(0) => return false,
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(_) => return false,
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_missing_device_fails() {
        let result = SerialPort::open("/dev/does-not-exist-bytebus", BaudRate::B115200);
        assert!(matches!(result, Err(TransportError::Serial { .. })));
    }

    #[test]
    fn baud_rates_map_to_termios() {
        assert_eq!(BaudRate::B9600.to_termios(), libc::B9600);
        assert_eq!(BaudRate::B115200.to_termios(), libc::B115200);
    }
}
