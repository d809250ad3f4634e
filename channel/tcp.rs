// Connection-oriented binding: accept loop plus one handler thread
// per connection. The registry is owned by the accept loop and only
// mutated there; handlers report closure over a channel.
use crate::console;
use crate::shutdown::ShutdownFlag;
use crossbeam::channel::{unbounded, Receiver, Sender};
use kria_core::{Command, CommandEvent, DecodeError, LineBuffer};
use kria_transport::{StreamConnection, TcpChannelListener, Transport, TransportListener};
use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub type ConnectionId = u64;

struct ConnectionEntry {
    peer: SocketAddr,
    handle: JoinHandle<()>,
}

// Live connections, keyed by id. Insert on accept, remove on close.
#[derive(Default)]
pub struct ConnectionRegistry {
    next_id: ConnectionId,
    entries: HashMap<ConnectionId, ConnectionEntry>,
}

impl ConnectionRegistry {
    fn new() -> Self {
        ConnectionRegistry {
            next_id: 0,
            entries: HashMap::new(),
        }
    }

    fn allocate_id(&mut self) -> ConnectionId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn insert(&mut self, id: ConnectionId, peer: SocketAddr, handle: JoinHandle<()>) {
        self.entries.insert(id, ConnectionEntry { peer, handle });
    }

    fn remove(&mut self, id: ConnectionId) -> Option<(SocketAddr, JoinHandle<()>)> {
        self.entries.remove(&id).map(|e| (e.peer, e.handle))
    }

    fn drain(&mut self) -> Vec<(SocketAddr, JoinHandle<()>)> {
        self.entries.drain().map(|(_, e)| (e.peer, e.handle)).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct TcpCommandChannel {
    listener: TcpChannelListener,
    shutdown: ShutdownFlag,
    poll_interval: Duration,
}

impl TcpCommandChannel {
    pub fn bind(addr: &str, shutdown: ShutdownFlag) -> io::Result<Self> {
        let mut listener = TcpChannelListener::new(addr);
        listener.bind()?;
        listener.set_nonblocking(true)?;
        Ok(TcpCommandChannel {
            listener,
            shutdown,
            poll_interval: crate::DEFAULT_POLL_INTERVAL,
        })
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    // Accept loop; runs until the shutdown flag trips, then waits for
    // every handler to finish so in-flight commands still get acks.
    pub fn run(&mut self) {
        let mut registry = ConnectionRegistry::new();
        let (closed_tx, closed_rx) = unbounded::<ConnectionId>();

        while !self.shutdown.is_triggered() {
            Self::reap_closed(&mut registry, &closed_rx);

            match self.listener.accept() {
                Ok((conn, peer)) => {
                    let id = registry.allocate_id();
                    console::log(format!("TCP client connected from {}", peer));

                    if conn.set_read_timeout(Some(self.poll_interval)).is_err() {
                        continue;
                    }
                    let shutdown = self.shutdown.clone();
                    let done = closed_tx.clone();
                    match thread::Builder::new()
                        .name(format!("kria-conn-{}", id))
                        .spawn(move || serve_connection(conn, id, shutdown, done))
                    {
                        Ok(handle) => registry.insert(id, peer, handle),
                        Err(e) => console::log(format!("failed to spawn handler: {}", e)),
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(self.poll_interval);
                }
                Err(e) => {
                    console::log(format!("accept error: {}", e));
                    thread::sleep(self.poll_interval);
                }
            }
        }

        // Stopped accepting; handlers observe the same flag and wind
        // down within one poll interval
        for (peer, handle) in registry.drain() {
            let _ = handle.join();
            console::log(format!("TCP client {} disconnected", peer));
        }
        console::log("TCP channel stopped");
    }

    fn reap_closed(registry: &mut ConnectionRegistry, closed_rx: &Receiver<ConnectionId>) {
        while let Ok(id) = closed_rx.try_recv() {
            if let Some((peer, handle)) = registry.remove(id) {
                let _ = handle.join();
                console::log(format!("TCP client {} disconnected", peer));
            }
        }
    }
}

// Per-connection loop: reassemble newline-delimited commands and write
// each acknowledgment back on the same connection. A zero-byte read or
// a write failure closes this connection only.
fn serve_connection(
    mut conn: StreamConnection,
    id: ConnectionId,
    shutdown: ShutdownFlag,
    done: Sender<ConnectionId>,
) {
    let peer = conn.peer();
    let greeting = format!("{}\n", crate::WELCOME_LINE);
    if conn.send(greeting.as_bytes()).is_err() {
        let _ = done.send(id);
        return;
    }

    let mut lines = LineBuffer::new();
    let mut buf = [0u8; 1024];

    'serve: while !shutdown.is_triggered() {
        match conn.receive(&mut buf) {
            Ok(0) => break, // peer closed
            Ok(n) => {
                for line in lines.push(&buf[..n]) {
                    match Command::decode(&line) {
                        Ok(cmd) => {
                            console::log(format!("TCP FROM {} -> {}", peer, cmd.text()));
                            if let Some(event) = CommandEvent::from_command(&cmd) {
                                console::log(format!("  -> {}", event));
                            }
                            let reply = format!("{}\n", cmd.ack());
                            if let Err(e) = conn.send(reply.as_bytes()) {
                                console::log(format!("write to {} failed: {}", peer, e));
                                break 'serve;
                            }
                        }
                        Err(DecodeError::EmptyCommand) => {}
                        Err(e) => console::log(format!(
                            "TCP FROM {} -> {} undecodable bytes ({})",
                            peer,
                            line.len(),
                            e
                        )),
                    }
                }
            }
            Err(e)
                if e.kind() == io::ErrorKind::WouldBlock
                    || e.kind() == io::ErrorKind::TimedOut
                    || e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => {
                console::log(format!("read from {} failed: {}", peer, e));
                break;
            }
        }
    }

    let _ = conn.disconnect();
    let _ = done.send(id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpStream;

    fn start_channel() -> (SocketAddr, ShutdownFlag, thread::JoinHandle<()>) {
        let shutdown = ShutdownFlag::new();
        let mut channel = TcpCommandChannel::bind("127.0.0.1:0", shutdown.clone())
            .unwrap()
            .with_poll_interval(Duration::from_millis(10));
        let addr = channel.local_addr().unwrap();
        let handle = thread::spawn(move || channel.run());
        (addr, shutdown, handle)
    }

    fn connect(addr: SocketAddr) -> (TcpStream, BufReader<TcpStream>) {
        let stream = TcpStream::connect(addr).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let reader = BufReader::new(stream.try_clone().unwrap());
        (stream, reader)
    }

    fn read_line(reader: &mut BufReader<TcpStream>) -> String {
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        line.trim_end().to_string()
    }

    #[test]
    fn greets_then_acks_each_line_in_order() {
        let (addr, shutdown, handle) = start_channel();
        let (mut stream, mut reader) = connect(addr);

        assert_eq!(read_line(&mut reader), crate::WELCOME_LINE);

        stream.write_all(b"BUTTON:UP\nBUTTON:DOWN\n").unwrap();
        assert_eq!(read_line(&mut reader), "ACK:BUTTON:UP");
        assert_eq!(read_line(&mut reader), "ACK:BUTTON:DOWN");

        shutdown.trigger();
        handle.join().unwrap();
    }

    #[test]
    fn partial_lines_are_reassembled_across_reads() {
        let (addr, shutdown, handle) = start_channel();
        let (mut stream, mut reader) = connect(addr);
        read_line(&mut reader); // welcome

        stream.write_all(b"TOUCH:1").unwrap();
        stream.flush().unwrap();
        thread::sleep(Duration::from_millis(50));
        stream.write_all(b"00:200\n").unwrap();

        assert_eq!(read_line(&mut reader), "ACK:TOUCH:100:200");

        shutdown.trigger();
        handle.join().unwrap();
    }

    #[test]
    fn closing_one_connection_leaves_others_serving() {
        let (addr, shutdown, handle) = start_channel();
        let (first_stream, mut first_reader) = connect(addr);
        let (mut second_stream, mut second_reader) = connect(addr);
        read_line(&mut first_reader);
        read_line(&mut second_reader);

        drop(first_stream);
        drop(first_reader);
        thread::sleep(Duration::from_millis(50));

        // Survivor still gets served
        second_stream.write_all(b"MODE:MANUAL\n").unwrap();
        assert_eq!(read_line(&mut second_reader), "ACK:MODE:MANUAL");

        // And the listener still accepts new connections
        let (mut third_stream, mut third_reader) = connect(addr);
        read_line(&mut third_reader);
        third_stream.write_all(b"UP\n").unwrap();
        assert_eq!(read_line(&mut third_reader), "ACK:UP");

        shutdown.trigger();
        handle.join().unwrap();
    }

    #[test]
    fn empty_lines_are_skipped() {
        let (addr, shutdown, handle) = start_channel();
        let (mut stream, mut reader) = connect(addr);
        read_line(&mut reader); // welcome

        stream.write_all(b"\n\nTOGGLE\n").unwrap();
        assert_eq!(read_line(&mut reader), "ACK:TOGGLE");

        shutdown.trigger();
        handle.join().unwrap();
    }
}
