// channel: command channel engine bound to UDP and TCP transports
// One thread serves the datagram loop; one thread per accepted stream
// connection. All console output is serialized through a printer thread.

// Re-export protocol types and transport abstractions
pub use kria_core::*;
pub use kria_transport::*;

pub mod console;
pub mod shutdown;
pub mod udp;
pub mod tcp;

pub use shutdown::ShutdownFlag;
pub use udp::UdpCommandChannel;
pub use tcp::{ConnectionRegistry, TcpCommandChannel};

use std::time::Duration;

// Poll interval shared by the receive loops; short enough that a
// shutdown request is observed promptly.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

// Greeting sent to every accepted stream connection
pub const WELCOME_LINE: &str = "WELCOME:Kria Command Server";
