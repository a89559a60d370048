pub mod alert_log;

pub use alert_log::{AlertLog, AlertRow};
