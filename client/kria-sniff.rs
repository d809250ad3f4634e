// kria-sniff: raw UDP listener for debugging the Kria command channel.
// Prints every datagram that arrives on the command port and acks the
// ones that decode, so a misconfigured controller can be diagnosed
// without the full server running.
use kria_core::{Command, DecodeError};
use kria_transport::{DatagramTransport, UdpTransport};
use std::env;
use std::io;
use std::time::Duration;

const DEFAULT_PORT: u16 = 8556;

fn main() {
    let mut port = DEFAULT_PORT;
    if let Some(arg) = env::args().nth(1) {
        if arg == "-h" || arg == "--help" {
            println!("Usage: kria-sniff [port]");
            println!("Listen for raw UDP command traffic (Default port: {})", DEFAULT_PORT);
            return;
        }
        match arg.parse() {
            Ok(p) => port = p,
            Err(_) => {
                eprintln!("Usage: kria-sniff [port]");
                std::process::exit(1);
            }
        }
    }

    let addr = format!("0.0.0.0:{}", port);
    println!("Kria UDP debug listener on {}", addr);
    println!("This shows ALL UDP traffic received on this port");
    println!("{}", "=".repeat(60));

    let transport = match UdpTransport::bind(&addr) {
        Ok(t) => t,
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            eprintln!("Permission denied binding {}. Try a port > 1024 or run as root.", addr);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Socket error binding {}: {}", addr, e);
            eprintln!("Make sure no other process is using this port");
            std::process::exit(1);
        }
    };

    // Short timeout keeps the loop interruptible
    if let Err(e) = transport.set_read_timeout(Some(Duration::from_secs(1))) {
        eprintln!("Failed to set read timeout: {}", e);
        std::process::exit(1);
    }

    println!("Waiting for UDP packets...");
    println!();

    let mut buf = [0u8; 2048];
    loop {
        match transport.recv_from(&mut buf) {
            Ok((n, peer)) => {
                let raw = &buf[..n];
                println!("FROM {}", peer);
                println!("  Raw bytes: {:?}", raw);

                match Command::decode(raw) {
                    Ok(cmd) => {
                        println!("  Decoded  : '{}'", cmd.text());
                        println!("  Length   : {} bytes", n);

                        let ack = cmd.ack();
                        match transport.send_to(ack.as_bytes(), peer) {
                            Ok(_) => println!("  Sent ACK : {}", ack),
                            Err(e) => println!("  ACK failed: {}", e),
                        }
                    }
                    Err(DecodeError::EmptyCommand) => {
                        println!("  (empty datagram)");
                    }
                    Err(DecodeError::InvalidEncoding) => {
                        println!("  (binary data, not acknowledged)");
                        println!("  Length   : {} bytes", n);
                    }
                }
                println!("{}", "-".repeat(40));
            }
            Err(e)
                if e.kind() == io::ErrorKind::WouldBlock
                    || e.kind() == io::ErrorKind::TimedOut => {}
            Err(e) => {
                eprintln!("Receive error: {}", e);
            }
        }
    }
}
