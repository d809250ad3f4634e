// TCP transport implementation
use crate::traits::{Transport, TransportListener};
use std::io::{Read, Result, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::time::Duration;

// Client-side stream endpoint
pub struct TcpTransport {
    address: String,
    stream: Option<TcpStream>,
}

impl TcpTransport {
    pub fn new(address: &str) -> Self {
        TcpTransport {
            address: address.to_string(),
            stream: None,
        }
    }

    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        if let Some(ref stream) = self.stream {
            stream.set_read_timeout(timeout)?;
        }
        Ok(())
    }
}

impl Transport for TcpTransport {
    fn send(&mut self, data: &[u8]) -> Result<usize> {
        if let Some(ref mut stream) = self.stream {
            stream.write(data)
        } else {
            Err(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "Not connected",
            ))
        }
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<usize> {
        if let Some(ref mut stream) = self.stream {
            stream.read(buf)
        } else {
            Err(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "Not connected",
            ))
        }
    }

    fn connect(&mut self) -> Result<()> {
        let stream = TcpStream::connect(&self.address)?;
        self.stream = Some(stream);
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        self.stream = None;
        Ok(())
    }
}

// Server-side endpoint for one accepted connection
pub struct StreamConnection {
    stream: TcpStream,
    peer: SocketAddr,
}

impl StreamConnection {
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.stream.set_read_timeout(timeout)
    }
}

impl Transport for StreamConnection {
    fn send(&mut self, data: &[u8]) -> Result<usize> {
        self.stream.write_all(data)?;
        Ok(data.len())
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.stream.read(buf)
    }

    fn connect(&mut self) -> Result<()> {
        // Accepted connections are already established
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        let _ = self.stream.shutdown(Shutdown::Both);
        Ok(())
    }
}

// Listening socket for the stream channel
pub struct TcpChannelListener {
    address: String,
    listener: Option<TcpListener>,
}

impl TcpChannelListener {
    pub fn new(address: &str) -> Self {
        TcpChannelListener {
            address: address.to_string(),
            listener: None,
        }
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        match self.listener {
            Some(ref l) => l.local_addr(),
            None => Err(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "Not bound",
            )),
        }
    }

    // Non-blocking accept lets the accept loop poll a shutdown flag
    pub fn set_nonblocking(&self, nonblocking: bool) -> Result<()> {
        if let Some(ref listener) = self.listener {
            listener.set_nonblocking(nonblocking)?;
        }
        Ok(())
    }
}

impl TransportListener for TcpChannelListener {
    type Connection = StreamConnection;

    fn bind(&mut self) -> Result<()> {
        let addrs: Vec<SocketAddr> = self.address.to_socket_addrs()?.collect();
        let listener = TcpListener::bind(&addrs[..])?;
        self.listener = Some(listener);
        Ok(())
    }

    fn accept(&mut self) -> Result<(StreamConnection, SocketAddr)> {
        match self.listener {
            Some(ref listener) => {
                let (stream, peer) = listener.accept()?;
                Ok((StreamConnection { stream, peer }, peer))
            }
            None => Err(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "Not bound",
            )),
        }
    }
}
