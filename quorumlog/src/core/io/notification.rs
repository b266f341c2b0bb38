use std::fmt;

use tokio::time::Instant;

use crate::raft::AppendEntriesReply;
use crate::raft::InstallSnapshotReply;
use crate::raft::VoteReply;
use crate::storage::log::log_id::LogId;
use crate::storage::membership::NodeId;

/// A message coming from the internal components.
///
/// Every RPC reply carries the term it was sent in; Core discards replies
/// sent in a term it has left.
pub(crate) enum Notification {
    VoteReply {
        target: NodeId,
        reply: VoteReply,

        /// The term of the candidate that sent the vote request.
        sender_term: u64,
    },

    AppendEntriesReply {
        target: NodeId,
        reply: AppendEntriesReply,
        sender_term: u64,

        /// The last index the follower has if the request is accepted.
        last_index: u64,
    },

    InstallSnapshotReply {
        target: NodeId,
        reply: InstallSnapshotReply,
        sender_term: u64,
        snapshot_last: LogId,
    },

    /// The election timer has reached `deadline`.
    ElectionTimeout { deadline: Instant },

    /// An [`ApplyMessage`](crate::ApplyMessage) has been handed to the
    /// application.
    Applied { log_id: LogId },

    /// A tick event to wake up Core to send heartbeat.
    Tick {
        /// ith tick
        i: u64,
    },
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VoteReply {
                target,
                reply,
                sender_term,
            } => {
                write!(
                    f,
                    "VoteReply: from target={}, sender_term: {}, {}",
                    target, sender_term, reply
                )
            }
            Self::AppendEntriesReply {
                target,
                reply,
                sender_term,
                last_index,
            } => {
                write!(
                    f,
                    "AppendEntriesReply: from target={}, sender_term: {}, last_index: {}, {}",
                    target, sender_term, last_index, reply
                )
            }
            Self::InstallSnapshotReply {
                target,
                reply,
                sender_term,
                snapshot_last,
            } => {
                write!(
                    f,
                    "InstallSnapshotReply: from target={}, sender_term: {}, snapshot_last: {}, {}",
                    target, sender_term, snapshot_last, reply
                )
            }
            Self::ElectionTimeout { deadline } => {
                write!(f, "ElectionTimeout: {:?}", deadline)
            }
            Self::Applied { log_id } => {
                write!(f, "Applied: {}", log_id)
            }
            Self::Tick { i } => {
                write!(f, "Tick {}", i)
            }
        }
    }
}
