// kria-send: command-sender test harness for the Kria command channel
use kria_client::{CommandSender, StreamCommandClient};
use kria_core::Command;
use std::env;
use std::time::Duration;

const ACK_TIMEOUT: Duration = Duration::from_secs(5);

fn usage() {
    println!("Usage: kria-send [options] [command...]");
    println!("Send commands to a Kria command channel server and print the acks.");
    println!("Options:");
    println!("  -a address    Server address (Default: 127.0.0.1)");
    println!("  -p port       Server port (Default: 8556 UDP, 8555 TCP)");
    println!("  -t            Use TCP instead of UDP");
    println!("  -d delay      Milliseconds to wait between commands (Default: 500)");
    println!();
    println!("Commands use the VERB[:ARG...] grammar, e.g. BUTTON:UP or TOUCH:100:200.");
    println!("Without arguments the standard exercise script is sent:");
    println!("  UP DOWN LEFT RIGHT TOGGLE TOUCH:100:200 MODE");
}

fn timestamp() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

fn default_script() -> Vec<String> {
    ["UP", "DOWN", "LEFT", "RIGHT", "TOGGLE", "TOUCH:100:200", "MODE"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn main() {
    let args: Vec<String> = env::args().collect();

    let mut host = "127.0.0.1".to_string();
    let mut port: Option<u16> = None;
    let mut use_tcp = false;
    let mut delay: u64 = 500;
    let mut commands: Vec<String> = Vec::new();

    // Parse arguments
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-a" => {
                if i + 1 < args.len() {
                    host = args[i + 1].clone();
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "-p" => {
                if i + 1 < args.len() {
                    port = args[i + 1].parse().ok();
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "-t" => {
                use_tcp = true;
                i += 1;
            }
            "-d" => {
                if i + 1 < args.len() {
                    delay = args[i + 1].parse().unwrap_or(500);
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "-h" | "--help" => {
                usage();
                return;
            }
            _ => {
                commands.push(args[i].clone());
                i += 1;
            }
        }
    }

    if commands.is_empty() {
        commands = default_script();
    }

    let port = port.unwrap_or(if use_tcp { 8555 } else { 8556 });
    let parsed: Vec<Command> = commands
        .iter()
        .filter_map(|text| match Command::decode(text.as_bytes()) {
            Ok(cmd) => Some(cmd),
            Err(e) => {
                eprintln!("Skipping '{}': {}", text, e);
                None
            }
        })
        .collect();

    if parsed.is_empty() {
        eprintln!("ERROR: No valid commands to send");
        std::process::exit(1);
    }

    let transport = if use_tcp { "TCP" } else { "UDP" };
    println!("Sending to {}:{} over {}", host, port, transport);

    let result = if use_tcp {
        run_tcp(&host, port, &parsed, delay)
    } else {
        run_udp(&host, port, &parsed, delay)
    };

    if let Err(e) = result {
        eprintln!("ERROR: {}", e);
        std::process::exit(1);
    }
}

fn run_udp(host: &str, port: u16, commands: &[Command], delay: u64) -> std::io::Result<()> {
    let sender = CommandSender::new(host, port)?;

    for cmd in commands {
        println!("[{}] send {}", timestamp(), cmd.text());
        match sender.send_and_wait(cmd, ACK_TIMEOUT)? {
            Some(reply) => println!("[{}]   -> {}", timestamp(), reply),
            None => println!("[{}]   -> no response (timeout)", timestamp()),
        }
        std::thread::sleep(Duration::from_millis(delay));
    }
    Ok(())
}

fn run_tcp(host: &str, port: u16, commands: &[Command], delay: u64) -> std::io::Result<()> {
    let mut client = StreamCommandClient::connect(host, port, Some(ACK_TIMEOUT))?;

    // First line is the server greeting
    match client.read_replies() {
        Ok(Some(lines)) => {
            for line in lines {
                println!("[{}] {}", timestamp(), line);
            }
        }
        Ok(None) => {
            println!("[{}] connection closed by server", timestamp());
            return Ok(());
        }
        Err(e) if kria_client::is_timeout(&e) => {
            println!("[{}] no greeting (timeout)", timestamp());
        }
        Err(e) => return Err(e),
    }

    for cmd in commands {
        println!("[{}] send {}", timestamp(), cmd.text());
        client.send_command(cmd)?;

        loop {
            match client.read_replies() {
                Ok(None) => {
                    println!("[{}] connection closed by server", timestamp());
                    return Ok(());
                }
                Ok(Some(replies)) if replies.is_empty() => continue,
                Ok(Some(replies)) => {
                    for reply in &replies {
                        println!("[{}]   -> {}", timestamp(), reply);
                    }
                    break;
                }
                Err(e) if kria_client::is_timeout(&e) => {
                    println!("[{}]   -> no response (timeout)", timestamp());
                    break;
                }
                Err(e) => return Err(e),
            }
        }
        std::thread::sleep(Duration::from_millis(delay));
    }

    client.disconnect()
}
