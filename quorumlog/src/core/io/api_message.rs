use std::fmt;

use tokio::sync::oneshot;

use crate::errors::ForwardToLeader;
use crate::errors::RejectSnapshot;
use crate::raft::AppendEntries;
use crate::raft::AppendEntriesReply;
use crate::raft::InstallSnapshot;
use crate::raft::InstallSnapshotReply;
use crate::raft::RequestVote;
use crate::raft::VoteReply;
use crate::storage::log::log_id::LogId;
use crate::TypeConfig;

/// A message sent by application to the [`Core`].
///
/// [`Core`]: crate::core::core::Core
pub(crate) enum APIMessage<C>
where C: TypeConfig
{
    RequestVote {
        rpc: RequestVote,
        tx: oneshot::Sender<VoteReply>,
    },

    AppendEntries {
        rpc: AppendEntries<C>,
        tx: oneshot::Sender<AppendEntriesReply>,
    },

    InstallSnapshot {
        rpc: InstallSnapshot,
        tx: oneshot::Sender<InstallSnapshotReply>,
    },

    Submit {
        command: C::AppData,
        tx: oneshot::Sender<Result<LogId, ForwardToLeader>>,
    },

    GetState {
        tx: oneshot::Sender<(u64, bool)>,
    },

    RequestSnapshot {
        upto: u64,
        data: Vec<u8>,
        tx: oneshot::Sender<Result<(), RejectSnapshot>>,
    },

    Elect,

    BroadcastHeartbeat,
}

impl<C> fmt::Display for APIMessage<C>
where C: TypeConfig
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            APIMessage::RequestVote { rpc, .. } => {
                write!(f, "RequestVote: {}", rpc)
            }
            APIMessage::AppendEntries { rpc, .. } => {
                write!(f, "AppendEntries: {}", rpc)
            }
            APIMessage::InstallSnapshot { rpc, .. } => {
                write!(f, "InstallSnapshot: {}", rpc)
            }
            APIMessage::Submit { command, .. } => {
                write!(f, "Submit: {:?}", command)
            }
            APIMessage::GetState { .. } => {
                write!(f, "GetState")
            }
            APIMessage::RequestSnapshot { upto, data, .. } => {
                write!(f, "RequestSnapshot: upto {}, size: {}", upto, data.len())
            }
            APIMessage::Elect => {
                write!(f, "Elect")
            }
            APIMessage::BroadcastHeartbeat => {
                write!(f, "BroadcastHeartbeat")
            }
        }
    }
}
