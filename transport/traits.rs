// Transport abstraction - allows pluggable communication backends
use std::io::Result;
use std::net::SocketAddr;

// Connection-oriented endpoint: ordered byte stream with write-back
pub trait Transport: Send {
    fn send(&mut self, data: &[u8]) -> Result<usize>;
    fn receive(&mut self, buf: &mut [u8]) -> Result<usize>;
    fn connect(&mut self) -> Result<()>;
    fn disconnect(&mut self) -> Result<()>;
}

// Connectionless endpoint: each message carries its own source address
// and replies go back to that address
pub trait DatagramTransport: Send {
    fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)>;
    fn send_to(&self, data: &[u8], addr: SocketAddr) -> Result<usize>;
}

pub trait TransportListener: Send {
    type Connection: Transport;

    fn bind(&mut self) -> Result<()>;
    fn accept(&mut self) -> Result<(Self::Connection, SocketAddr)>;
}
