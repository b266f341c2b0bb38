use openraft_macros::add_async_trait;

use crate::errors::NetworkError;
use crate::raft::AppendEntries;
use crate::raft::AppendEntriesReply;
use crate::raft::InstallSnapshot;
use crate::raft::InstallSnapshotReply;
use crate::raft::RequestVote;
use crate::raft::VoteReply;
use crate::TypeConfig;

/// A client that sends RPCs to a single target node.
///
/// Each call is tried once: a lost request or reply is reported as a
/// [`NetworkError`] and never retried by the connection. A call must not
/// deliver a request twice or corrupt it.
#[add_async_trait]
pub trait Connection<C>: Send + Sync + 'static
where C: TypeConfig
{
    /// Send a RequestVote RPC to the target.
    async fn request_vote(
        &mut self,
        rpc: RequestVote,
    ) -> Result<VoteReply, NetworkError>;

    /// Send an AppendEntries RPC to the target.
    async fn append_entries(
        &mut self,
        rpc: AppendEntries<C>,
    ) -> Result<AppendEntriesReply, NetworkError>;

    /// Send an InstallSnapshot RPC to the target.
    async fn install_snapshot(
        &mut self,
        rpc: InstallSnapshot,
    ) -> Result<InstallSnapshotReply, NetworkError>;
}
