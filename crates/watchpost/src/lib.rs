//! watchpost: control-console client for a line-delimited JSON/TCP server.
//!
//! Depend on this crate alone; `prelude` carries what an embedding UI needs
//! to run a console: the transport handle, the runtime and the surface trait.

pub use watchpost_client as client;
pub use watchpost_core as core;

pub mod prelude {
    pub use watchpost_client::config::{load_from_file, load_from_str, ConsoleConfig};
    pub use watchpost_client::obs::ConsoleMetrics;
    pub use watchpost_client::sink::AlertLog;
    pub use watchpost_client::transport::{ClientEvent, ClientOptions, ConnectionState, NetworkClient};
    pub use watchpost_client::{Console, ConsoleSurface};
    pub use watchpost_core::protocol::requests;
    pub use watchpost_core::{Message, Result, WatchpostError};
}
