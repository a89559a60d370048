//! The console's outward-facing collaborators.
//!
//! The router and the console runtime call into a `ConsoleSurface`; what it
//! does with the calls (a table, a toast, a status light) is up to the
//! embedding UI. Only `append_json` is mandatory.

use watchpost_core::Message;

use crate::transport::ConnectionState;

pub trait ConsoleSurface {
    /// Generic log sink: receives every message the router forwards.
    fn append_json(&mut self, msg: &Message);

    fn set_emergency_stop(&mut self, _engaged: bool) {}

    /// Called only when `run` or `door` actually changed.
    fn set_factory_state(&mut self, _run: i32, _door: i32) {}

    fn notify(&mut self, _title: &str, _message: &str) {}

    fn set_connection_state(&mut self, _state: ConnectionState) {}

    fn set_network_error(&mut self, _error: &str) {}
}

impl<T: ConsoleSurface + ?Sized> ConsoleSurface for Box<T> {
    fn append_json(&mut self, msg: &Message) {
        (**self).append_json(msg)
    }
    fn set_emergency_stop(&mut self, engaged: bool) {
        (**self).set_emergency_stop(engaged)
    }
    fn set_factory_state(&mut self, run: i32, door: i32) {
        (**self).set_factory_state(run, door)
    }
    fn notify(&mut self, title: &str, message: &str) {
        (**self).notify(title, message)
    }
    fn set_connection_state(&mut self, state: ConnectionState) {
        (**self).set_connection_state(state)
    }
    fn set_network_error(&mut self, error: &str) {
        (**self).set_network_error(error)
    }
}
