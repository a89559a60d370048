//! Inbound dispatch queue.
//!
//! Re-exports the queue and its wake-up plumbing so the console can depend
//! on this module directly.

pub mod queue;
pub mod wake;

pub use queue::{DispatchQueue, DrainPhase, WakeOutcome, WakeScheduler, DEFAULT_BUDGET};
pub use wake::NotifyScheduler;
