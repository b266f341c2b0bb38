use std::fmt;

use crate::storage::membership::NodeId;
use crate::storage::snapshot::SnapshotMeta;

/// An RPC sent by the leader to a follower whose next entry has been
/// compacted (§7).
///
/// The whole snapshot is sent in one request.
#[derive(Debug, Clone, PartialEq, Eq)]
#[derive(serde::Deserialize, serde::Serialize)]
pub struct InstallSnapshot {
    pub term: u64,
    pub leader_id: NodeId,

    /// Carries `last_included_index` and `last_included_term`.
    pub meta: SnapshotMeta,

    pub data: Vec<u8>,
}

impl fmt::Display for InstallSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{term:{}, leader:{}, meta:{}, size:{}}}",
            self.term,
            self.leader_id,
            self.meta,
            self.data.len()
        )
    }
}

/// The response to an [`InstallSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[derive(serde::Deserialize, serde::Serialize)]
pub struct InstallSnapshotReply {
    pub term: u64,
}

impl fmt::Display for InstallSnapshotReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{term:{}}}", self.term)
    }
}
