// client: library for building command senders and diagnostic tools
use kria_core::{Command, LineBuffer};
use kria_transport::{DatagramTransport, TcpTransport, Transport, UdpTransport};
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

// Read timeouts surface as WouldBlock or TimedOut depending on the
// platform
pub fn is_timeout(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::WouldBlock || e.kind() == io::ErrorKind::TimedOut
}

// Connectionless sender: one datagram per command, optional wait for
// the acknowledgment from the server.
pub struct CommandSender {
    transport: UdpTransport,
    target: SocketAddr,
}

impl CommandSender {
    pub fn new(host: &str, port: u16) -> io::Result<Self> {
        let target = (host, port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "could not resolve target address")
            })?;
        let transport = UdpTransport::bind("0.0.0.0:0")?;
        Ok(CommandSender { transport, target })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    pub fn send(&self, cmd: &Command) -> io::Result<()> {
        self.transport.send_to(&cmd.encode(), self.target)?;
        Ok(())
    }

    // Send and wait up to `timeout` for the ack. None means the server
    // did not answer in time (or dropped the datagram).
    pub fn send_and_wait(&self, cmd: &Command, timeout: Duration) -> io::Result<Option<String>> {
        self.send(cmd)?;
        self.transport.set_read_timeout(Some(timeout))?;

        let mut buf = [0u8; 2048];
        match self.transport.recv_from(&mut buf) {
            Ok((n, _)) => Ok(Some(String::from_utf8_lossy(&buf[..n]).to_string())),
            Err(e) if is_timeout(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

// Connection-oriented sender: persistent session, newline-delimited
// commands out, newline-delimited replies back.
pub struct StreamCommandClient {
    transport: Box<dyn Transport>,
    lines: LineBuffer,
    buf: Vec<u8>,
}

impl StreamCommandClient {
    // A read timeout bounds every reply wait; without one a server
    // that accepts and stays silent would block the caller forever.
    pub fn connect(host: &str, port: u16, read_timeout: Option<Duration>) -> io::Result<Self> {
        let addr = format!("{}:{}", host, port);
        let mut transport = TcpTransport::new(&addr);
        transport.connect()?;
        transport.set_read_timeout(read_timeout)?;

        Ok(StreamCommandClient {
            transport: Box::new(transport),
            lines: LineBuffer::new(),
            buf: vec![0u8; 4096],
        })
    }

    pub fn send_command(&mut self, cmd: &Command) -> io::Result<()> {
        let mut data = cmd.encode();
        data.push(b'\n');

        // Transport::send may write short; push until done
        let mut written = 0;
        while written < data.len() {
            written += self.transport.send(&data[written..])?;
        }
        Ok(())
    }

    // One read's worth of complete reply lines, in order. None means
    // the server closed the connection; an empty vector means the read
    // ended mid-line and the tail stays buffered.
    pub fn read_replies(&mut self) -> io::Result<Option<Vec<String>>> {
        match self.transport.receive(&mut self.buf) {
            Ok(0) => Ok(None), // Connection closed
            Ok(n) => {
                let chunk: Vec<u8> = self.buf[..n].to_vec();
                Ok(Some(
                    self.lines
                        .push(&chunk)
                        .into_iter()
                        .map(|line| String::from_utf8_lossy(&line).to_string())
                        .collect(),
                ))
            }
            Err(e) => Err(e),
        }
    }

    pub fn disconnect(&mut self) -> io::Result<()> {
        self.transport.disconnect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::net::{TcpListener, UdpSocket};
    use std::thread;

    const SHORT_TIMEOUT: Duration = Duration::from_millis(200);

    // Minimal ack server: answers one datagram and exits
    fn spawn_udp_acker() -> u16 {
        let sock = UdpSocket::bind("127.0.0.1:0").unwrap();
        let port = sock.local_addr().unwrap().port();
        thread::spawn(move || {
            let mut buf = [0u8; 2048];
            let (n, peer) = sock.recv_from(&mut buf).unwrap();
            let cmd = Command::decode(&buf[..n]).unwrap();
            sock.send_to(cmd.ack().as_bytes(), peer).unwrap();
        });
        port
    }

    #[test]
    fn udp_send_and_wait_returns_the_ack() {
        let port = spawn_udp_acker();
        let sender = CommandSender::new("127.0.0.1", port).unwrap();

        let reply = sender
            .send_and_wait(&Command::touch(100, 200), Duration::from_secs(2))
            .unwrap();
        assert_eq!(reply.as_deref(), Some("ACK:TOUCH:100:200"));
    }

    #[test]
    fn udp_send_and_wait_times_out_without_reply() {
        // Bound socket that never answers
        let silent = UdpSocket::bind("127.0.0.1:0").unwrap();
        let port = silent.local_addr().unwrap().port();
        let sender = CommandSender::new("127.0.0.1", port).unwrap();

        let reply = sender
            .send_and_wait(&Command::decode(b"UP").unwrap(), SHORT_TIMEOUT)
            .unwrap();
        assert_eq!(reply, None);
    }

    #[test]
    fn tcp_reply_wait_times_out_against_silent_server() {
        // Server accepts and never writes; the bounded read keeps the
        // caller from blocking forever
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            thread::sleep(Duration::from_secs(2));
            drop(stream);
        });

        let mut client =
            StreamCommandClient::connect("127.0.0.1", port, Some(SHORT_TIMEOUT)).unwrap();
        client.send_command(&Command::decode(b"UP").unwrap()).unwrap();

        let err = client.read_replies().unwrap_err();
        assert!(is_timeout(&err), "expected timeout, got {:?}", err);

        server.join().unwrap();
    }

    #[test]
    fn tcp_read_replies_reports_server_close() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            drop(stream);
        });

        let mut client =
            StreamCommandClient::connect("127.0.0.1", port, Some(Duration::from_secs(2))).unwrap();
        assert_eq!(client.read_replies().unwrap(), None);

        server.join().unwrap();
    }

    #[test]
    fn tcp_partial_reply_line_stays_buffered() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            stream.write_all(b"ACK:UP").unwrap();
            stream.flush().unwrap();
            thread::sleep(Duration::from_millis(100));
            stream.write_all(b"\nACK:DOWN\n").unwrap();
            thread::sleep(Duration::from_millis(100));
        });

        let mut client =
            StreamCommandClient::connect("127.0.0.1", port, Some(Duration::from_secs(2))).unwrap();

        // First read ends mid-line: no complete replies yet
        assert_eq!(client.read_replies().unwrap(), Some(Vec::new()));
        // Completion arrives together with the next reply
        assert_eq!(
            client.read_replies().unwrap(),
            Some(vec!["ACK:UP".to_string(), "ACK:DOWN".to_string()])
        );

        server.join().unwrap();
    }
}
