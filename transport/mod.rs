// Transport module: socket abstractions for the command channel
pub mod traits;
pub mod tcp;
pub mod udp;

pub use traits::*;
pub use tcp::*;
pub use udp::*;
