// Core module: command grammar and framing (NO I/O dependencies)
pub mod types;
pub mod protocol;

pub use types::*;
pub use protocol::*;
