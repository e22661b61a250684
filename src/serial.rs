//! Serial device setup so the terminal link runs raw at the requested speed.

use std::ffi::CString;
use std::fs::File;
use std::io;
use std::os::unix::io::FromRawFd;
use std::path::PathBuf;

use crate::terminal::{TermResult, TransportError};

/// How to reach the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialSettings {
    pub port: PathBuf,
    pub baud: u32,
    /// Software (XON/XOFF) flow control.
    pub flow: bool,
}

pub(crate) fn baud_constant(baud: u32) -> Option<libc::speed_t> {
    let speed = match baud {
        300 => libc::B300,
        600 => libc::B600,
        1200 => libc::B1200,
        2400 => libc::B2400,
        4800 => libc::B4800,
        9600 => libc::B9600,
        19200 => libc::B19200,
        38400 => libc::B38400,
        57600 => libc::B57600,
        115200 => libc::B115200,
        _ => return None,
    };
    Some(speed)
}

/// Open and configure the serial device for raw 8N1 traffic.
///
/// Reads use a 100ms inter-byte timeout (`VMIN=0`, `VTIME=1`) so a reader
/// thread can notice shutdown without closing the descriptor under itself.
///
/// # Errors
///
/// Returns a transport error if the baud rate is unsupported or the device
/// cannot be opened or configured.
pub fn open_port(settings: &SerialSettings) -> TermResult<File> {
    let speed = baud_constant(settings.baud)
        .ok_or_else(|| TransportError::Unsupported(format!("baud rate {}", settings.baud)))?;
    let path = CString::new(settings.port.as_os_str().as_encoded_bytes())
        .map_err(|_| TransportError::Io("serial port path contains NUL byte".to_string()))?;

    // SAFETY: `path` is a valid NUL-terminated string for the duration of the call.
    let fd = unsafe { libc::open(path.as_ptr(), libc::O_RDWR | libc::O_NOCTTY) };
    if fd < 0 {
        return Err(io::Error::last_os_error().into());
    }
    // SAFETY: `fd` was just returned by `open` and is owned by nothing else; the
    // File closes it on every exit path below.
    let file = unsafe { File::from_raw_fd(fd) };

    // SAFETY: `termios` is plain data; tcgetattr fully initializes it before any
    // read, and every call gets the live fd and a valid pointer.
    unsafe {
        let mut tio: libc::termios = std::mem::zeroed();
        if libc::tcgetattr(fd, &mut tio) != 0 {
            return Err(io::Error::last_os_error().into());
        }
        libc::cfmakeraw(&mut tio);
        tio.c_cflag |= libc::CLOCAL | libc::CREAD;
        tio.c_cflag &= !(libc::CSTOPB | libc::PARENB);
        if settings.flow {
            tio.c_iflag |= libc::IXON | libc::IXOFF;
        } else {
            tio.c_iflag &= !(libc::IXON | libc::IXOFF | libc::IXANY);
        }
        tio.c_cc[libc::VMIN] = 0;
        tio.c_cc[libc::VTIME] = 1;
        if libc::cfsetispeed(&mut tio, speed) != 0 || libc::cfsetospeed(&mut tio, speed) != 0 {
            return Err(io::Error::last_os_error().into());
        }
        if libc::tcsetattr(fd, libc::TCSANOW, &tio) != 0 {
            return Err(io::Error::last_os_error().into());
        }
        libc::tcflush(fd, libc::TCIOFLUSH);
    }

    tracing::debug!(
        port = %settings.port.display(),
        baud = settings.baud,
        flow = settings.flow,
        "serial port configured"
    );
    Ok(file)
}
