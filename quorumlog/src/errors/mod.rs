//! Error types exposed by this crate.

use std::error::Error;
use std::fmt;
use std::io;

use anyerror::AnyError;
use tracing::error;

use crate::storage::log::log_id::LogId;
use crate::storage::membership::NodeId;

pub(crate) fn to_any_error<E: fmt::Display + 'static>(e: E) -> AnyError {
    error!("error: {}", e);
    AnyError::error(e)
}

/// Fatal is unrecoverable and shuts down raft at once.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[derive(serde::Deserialize, serde::Serialize)]
pub enum Fatal {
    #[error(transparent)]
    StorageError(#[from] AnyError),

    #[error("panicked")]
    Panicked,

    /// Raft stopped normally.
    #[error("Stopped normally")]
    Stopped,
}

impl From<io::Error> for Fatal {
    fn from(value: io::Error) -> Self {
        Fatal::StorageError(AnyError::new(&value))
    }
}

/// Error returned by a [`Connection`](crate::network::connection::Connection) when an RPC
/// could not be delivered or its reply could not be received.
///
/// The RPC is dropped; the next heartbeat or election retries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("NetworkError: {source}")]
pub struct NetworkError {
    #[from]
    source: AnyError,
}

impl NetworkError {
    pub fn new<E: Error + 'static>(e: &E) -> Self {
        Self {
            source: AnyError::new(e),
        }
    }
}

/// A write was submitted to a node that is not the leader.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[derive(serde::Deserialize, serde::Serialize)]
#[error("has to forward request to: {leader_id:?}")]
pub struct ForwardToLeader {
    pub leader_id: Option<NodeId>,
}

impl ForwardToLeader {
    pub const fn empty() -> Self {
        Self { leader_id: None }
    }

    pub fn new(leader_id: NodeId) -> Self {
        Self {
            leader_id: Some(leader_id),
        }
    }
}

/// The reason a request to compact the log is refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[derive(serde::Deserialize, serde::Serialize)]
pub enum RejectSnapshot {
    /// The log is already compacted to or beyond the requested index.
    #[error("already compacted upto {snapshot_last}, requested: {upto}")]
    AlreadyCompacted { upto: u64, snapshot_last: LogId },

    /// The requested index has not been delivered to the state machine.
    #[error("index {upto} is not applied yet; last applied: {last_applied}")]
    NotApplied { upto: u64, last_applied: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub(crate) enum RejectVoteRequest {
    #[error("reject vote request by a greater term: {0}")]
    ByTerm(u64),

    #[error("reject vote request: already voted for {0} in this term")]
    AlreadyVoted(NodeId),

    #[error("reject vote request by a greater last-log-id: {0:?}")]
    ByLastLogId(Option<LogId>),
}
