// kria-server: combined UDP/TCP acknowledgment server for the Kria
// command channel. Binds both transports, acks every command back to
// its sender, and shuts down cleanly on SIGINT/SIGTERM.
use clap::Parser;
use kria_channel::{console, shutdown, ShutdownFlag, TcpCommandChannel, UdpCommandChannel};
use std::process;
use std::thread;

const DEFAULT_UDP_PORT: u16 = 8556;
const DEFAULT_TCP_PORT: u16 = 8555;

#[derive(Parser)]
#[command(name = "kria-server")]
#[command(about = "Kria command channel server (UDP + TCP)", long_about = None)]
#[command(version = "0.1.0")]
struct Cli {
    /// Address to bind both listeners on
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    /// UDP command port
    #[arg(long, default_value_t = DEFAULT_UDP_PORT)]
    udp_port: u16,

    /// TCP command port
    #[arg(long, default_value_t = DEFAULT_TCP_PORT)]
    tcp_port: u16,

    /// Serve only the UDP channel
    #[arg(long, conflicts_with = "tcp_only")]
    udp_only: bool,

    /// Serve only the TCP channel
    #[arg(long, conflicts_with = "udp_only")]
    tcp_only: bool,
}

fn main() {
    let cli = Cli::parse();
    let shutdown = ShutdownFlag::new();

    // Block signals before any worker thread exists so the waiter
    // thread is the only receiver
    if let Err(e) = shutdown::install_signal_handler(&shutdown) {
        eprintln!("Failed to install signal handler: {}", e);
        process::exit(1);
    }

    // Bind everything up front: a bad port or missing permission is a
    // startup failure, not something to discover mid-serve
    let udp_channel = if cli.tcp_only {
        None
    } else {
        let addr = format!("{}:{}", cli.bind, cli.udp_port);
        match UdpCommandChannel::bind(&addr, shutdown.clone()) {
            Ok(channel) => {
                println!("UDP channel listening on {}", addr);
                Some(channel)
            }
            Err(e) => {
                eprintln!("Failed to bind UDP {}: {}", addr, e);
                process::exit(1);
            }
        }
    };

    let tcp_channel = if cli.udp_only {
        None
    } else {
        let addr = format!("{}:{}", cli.bind, cli.tcp_port);
        match TcpCommandChannel::bind(&addr, shutdown.clone()) {
            Ok(channel) => {
                println!("TCP channel listening on {}", addr);
                Some(channel)
            }
            Err(e) => {
                eprintln!("Failed to bind TCP {}: {}", addr, e);
                process::exit(1);
            }
        }
    };

    println!("Waiting for commands from Kria controller (Ctrl+C to stop)");

    let mut workers = Vec::new();
    if let Some(channel) = udp_channel {
        workers.push(
            thread::Builder::new()
                .name("kria-udp".to_string())
                .spawn(move || channel.run())
                .expect("Failed to spawn UDP worker"),
        );
    }
    if let Some(mut channel) = tcp_channel {
        workers.push(
            thread::Builder::new()
                .name("kria-tcp".to_string())
                .spawn(move || channel.run())
                .expect("Failed to spawn TCP worker"),
        );
    }

    for worker in workers {
        let _ = worker.join();
    }

    // Make sure every queued log line reaches the terminal
    console::flush();
    println!("Server stopped");
}
