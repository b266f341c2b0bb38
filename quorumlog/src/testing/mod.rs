//! Testing utilities for quorumlog.

use crate::storage::log::log_id::LogId;

crate::declare_raft_types!(
    /// Type config used in unit tests.
    pub UTConfig
);

/// Builds a log id, for testing purposes.
pub fn log_id(term: u64, index: u64) -> LogId {
    LogId { term, index }
}
