// Serialized console output. Both channel loops and every connection
// handler log through a single printer thread, so a log line is never
// torn by a concurrent writer.
use crossbeam::channel::{unbounded, Sender};
use once_cell::sync::Lazy;
use std::thread::{self, JoinHandle};

enum ConsoleMsg {
    Line(String),
    // Carries a rendezvous sender so flush() can wait until every
    // line queued before it has been printed
    Flush(Sender<()>),
}

struct Console {
    sender: Sender<ConsoleMsg>,
    #[allow(dead_code)]
    printer_handle: JoinHandle<()>,
}

impl Console {
    fn new() -> Self {
        let (tx, rx) = unbounded::<ConsoleMsg>();
        let printer_handle = thread::Builder::new()
            .name("kria-console".to_string())
            .spawn(move || {
                for msg in rx.iter() {
                    match msg {
                        ConsoleMsg::Line(line) => println!("{}", line),
                        ConsoleMsg::Flush(done) => {
                            let _ = done.send(());
                        }
                    }
                }
            })
            .expect("Failed to spawn console printer");

        Console { sender: tx, printer_handle }
    }
}

static CONSOLE: Lazy<Console> = Lazy::new(Console::new);

/// Queue a timestamped log line for printing.
pub fn log<S: Into<String>>(line: S) {
    let stamped = format!(
        "[{}] {}",
        chrono::Local::now().format("%H:%M:%S"),
        line.into()
    );
    if CONSOLE.sender.send(ConsoleMsg::Line(stamped.clone())).is_err() {
        // Printer gone; fall back to direct output
        println!("{}", stamped);
    }
}

/// Block until all previously queued lines have been printed.
pub fn flush() {
    let (tx, rx) = crossbeam::channel::bounded(1);
    if CONSOLE.sender.send(ConsoleMsg::Flush(tx)).is_ok() {
        let _ = rx.recv();
    }
}
