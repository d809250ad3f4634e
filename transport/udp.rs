// UDP transport implementation
use crate::traits::DatagramTransport;
use std::io::Result;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;
use nix::sys::socket::{setsockopt, sockopt};

pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    // Bind a datagram socket; fails fast on address-in-use or
    // permission errors so callers can abort at startup.
    pub fn bind<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let socket = UdpSocket::bind(addr)?;
        Ok(UdpTransport { socket })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket.local_addr()
    }

    // A read timeout doubles as the poll interval for cooperative
    // shutdown: recv_from returns WouldBlock/TimedOut instead of
    // parking the thread forever.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.socket.set_read_timeout(timeout)
    }

    // Set socket receive buffer size (SO_RCVBUF)
    pub fn set_recv_buffer_size(&self, size: usize) -> Result<()> {
        setsockopt(&self.socket, sockopt::RcvBuf, &size)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }
}

impl DatagramTransport for UdpTransport {
    fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
        self.socket.recv_from(buf)
    }

    fn send_to(&self, data: &[u8], addr: SocketAddr) -> Result<usize> {
        self.socket.send_to(data, addr)
    }
}
