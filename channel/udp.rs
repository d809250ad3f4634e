// Connectionless binding: one datagram is one command, acknowledged
// straight back to its source address. No buffering across datagrams.
use crate::console;
use crate::shutdown::ShutdownFlag;
use kria_core::{Command, CommandEvent, DecodeError};
use kria_transport::{DatagramTransport, UdpTransport};
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

const RECV_BUFFER_SIZE: usize = 65536;
const MAX_DATAGRAM: usize = 2048;

pub struct UdpCommandChannel {
    transport: UdpTransport,
    shutdown: ShutdownFlag,
}

impl UdpCommandChannel {
    // Bind failures (address in use, permission denied) surface here
    // so the caller can abort at startup.
    pub fn bind(addr: &str, shutdown: ShutdownFlag) -> io::Result<Self> {
        let transport = UdpTransport::bind(addr)?;
        transport.set_read_timeout(Some(crate::DEFAULT_POLL_INTERVAL))?;
        let _ = transport.set_recv_buffer_size(RECV_BUFFER_SIZE);
        Ok(UdpCommandChannel { transport, shutdown })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    pub fn set_poll_interval(&self, interval: Duration) -> io::Result<()> {
        self.transport.set_read_timeout(Some(interval))
    }

    // Receive loop; runs until the shutdown flag trips. Commands are
    // processed strictly in arrival order.
    pub fn run(&self) {
        let mut buf = [0u8; MAX_DATAGRAM];
        while !self.shutdown.is_triggered() {
            match self.transport.recv_from(&mut buf) {
                Ok((n, peer)) => self.handle_datagram(&buf[..n], peer),
                Err(e)
                    if e.kind() == io::ErrorKind::WouldBlock
                        || e.kind() == io::ErrorKind::TimedOut
                        || e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => console::log(format!("UDP receive error: {}", e)),
            }
        }
        console::log("UDP channel stopped");
    }

    fn handle_datagram(&self, raw: &[u8], peer: SocketAddr) {
        match Command::decode(raw) {
            Ok(cmd) => {
                console::log(format!("FROM {} -> {}", peer, cmd.text()));
                if let Some(event) = CommandEvent::from_command(&cmd) {
                    console::log(format!("  -> {}", event));
                }
                if let Err(e) = self.transport.send_to(cmd.ack().as_bytes(), peer) {
                    console::log(format!("failed to ack {}: {}", peer, e));
                }
            }
            // Empty datagrams are ignored; anything undecodable is
            // reported with enough context to debug the sender
            Err(DecodeError::EmptyCommand) => {}
            Err(e) => {
                console::log(format!("FROM {} -> {} undecodable bytes ({})", peer, raw.len(), e))
            }
        }
    }
}
