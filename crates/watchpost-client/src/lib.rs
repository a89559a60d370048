//! watchpost console client library.
//!
//! Wires the TCP transport, the budgeted dispatch queue and the command
//! router into a console runtime. Consumed by the binary (`main.rs`) and by
//! integration tests.

pub mod clock;
pub mod config;
pub mod console;
pub mod dispatch;
pub mod obs;
pub mod router;
pub mod sink;
pub mod surface;
pub mod transport;

pub use console::Console;
pub use surface::ConsoleSurface;
