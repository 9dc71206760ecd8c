//! `AF_PACKET`/`SOCK_RAW` transport: the concrete collaborator that
//! sends and receives whole frames directly on a named Linux network
//! interface, bypassing IP entirely.
//!
//! Opening and binding the socket is handled with `libc` directly
//! (there is no safe wrapper for `AF_PACKET` in `socket2`); the
//! per-call read timeout is set through [`socket2::Socket`] once the
//! raw file descriptor has been wrapped, since that part *is* portable
//! POSIX behavior `socket2` already knows how to express.

use crate::error::{Error, Result};
use crate::transport::Transport;
use socket2::Socket;
use std::io;
use std::mem;
use std::os::unix::io::{FromRawFd, RawFd};
use std::time::Duration;

const ETH_P_ALL: u16 = 0x0003;

/// A raw link-layer socket bound to one network interface.
pub struct RawSocketTransport {
    socket: Socket,
}

impl RawSocketTransport {
    /// Opens an `AF_PACKET` `SOCK_RAW` socket and binds it to the
    /// interface named `ifname` (e.g. `"eth0"`).
    pub fn bind(ifname: &str) -> Result<Self> {
        let fd = open_raw_socket().map_err(|_| Error::IoError)?;
        let socket = unsafe { Socket::from_raw_fd(fd) };

        let index = interface_index(ifname).map_err(|_| Error::IoError)?;
        bind_to_interface(fd, index).map_err(|_| Error::IoError)?;

        Ok(Self { socket })
    }
}

impl Transport for RawSocketTransport {
    fn send(&mut self, buf: &[u8]) -> Result<()> {
        use std::io::Write;
        (&self.socket).write_all(buf).map_err(|_| Error::IoError)
    }

    fn recv_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> Result<Option<usize>> {
        use std::io::Read;
        self.socket
            .set_read_timeout(Some(timeout))
            .map_err(|_| Error::IoError)?;

        match (&self.socket).read(buf) {
            Ok(n) => Ok(Some(n)),
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                Ok(None)
            }
            Err(_) => Err(Error::IoError),
        }
    }
}

fn open_raw_socket() -> io::Result<RawFd> {
    let proto = ETH_P_ALL.to_be() as i32;
    let fd = unsafe { libc::socket(libc::AF_PACKET, libc::SOCK_RAW, proto) };
    if fd < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(fd)
}

fn interface_index(ifname: &str) -> io::Result<i32> {
    let c_name = std::ffi::CString::new(ifname)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "interface name has a NUL byte"))?;
    let index = unsafe { libc::if_nametoindex(c_name.as_ptr()) };
    if index == 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(index as i32)
}

fn bind_to_interface(fd: RawFd, if_index: i32) -> io::Result<()> {
    let mut addr: libc::sockaddr_ll = unsafe { mem::zeroed() };
    addr.sll_family = libc::AF_PACKET as u16;
    addr.sll_protocol = ETH_P_ALL.to_be();
    addr.sll_ifindex = if_index;

    let ret = unsafe {
        libc::bind(
            fd,
            &addr as *const libc::sockaddr_ll as *const libc::sockaddr,
            mem::size_of::<libc::sockaddr_ll>() as u32,
        )
    };
    if ret < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
