// Cooperative shutdown. The flag is polled by the receive loops at
// their poll interval; tripping it stops new input while in-flight
// commands still get their acknowledgments.
use nix::sys::signal::{SigSet, Signal};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

#[derive(Clone, Default)]
pub struct ShutdownFlag {
    inner: Arc<AtomicBool>,
}

impl ShutdownFlag {
    pub fn new() -> Self {
        ShutdownFlag {
            inner: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn trigger(&self) {
        self.inner.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.inner.load(Ordering::SeqCst)
    }
}

// Block SIGINT/SIGTERM in the calling thread and hand the set to a
// waiter thread. Must run before any worker threads are spawned so
// they inherit the mask and the waiter is the only receiver.
pub fn install_signal_handler(flag: &ShutdownFlag) -> io::Result<()> {
    let mut sigset = SigSet::empty();
    sigset.add(Signal::SIGINT);
    sigset.add(Signal::SIGTERM);
    sigset
        .thread_block()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    let flag = flag.clone();
    thread::Builder::new()
        .name("kria-signal".to_string())
        .spawn(move || {
            if let Ok(signal) = sigset.wait() {
                crate::console::log(format!("{} received, shutting down", signal));
                flag.trigger();
            }
        })?;

    Ok(())
}
