//! Log entry and log id.

pub mod entry;
pub mod log_id;
