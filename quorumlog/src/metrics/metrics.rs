use std::collections::BTreeMap;
use std::fmt;

use crate::base::display_ext::DisplayOptionExt;
use crate::errors::Fatal;
use crate::metrics::ServerState;
use crate::storage::log::log_id::LogId;
use crate::storage::membership::NodeId;
use crate::storage::vote::Vote;

/// The match index of every follower, as known by the leader.
pub type ReplicationMetrics = BTreeMap<NodeId, u64>;

/// A set of metrics describing the current state of a Raft node.
#[derive(Clone, Debug, PartialEq, Eq)]
#[derive(serde::Deserialize, serde::Serialize)]
pub struct Metrics {
    pub running_state: Result<(), Fatal>,

    /// The ID of the Raft node.
    pub id: NodeId,

    pub current_term: u64,

    /// The last persisted vote.
    pub vote: Vote,

    /// The state of the Raft node.
    pub server_state: ServerState,

    /// The current cluster leader, as known by this node.
    pub current_leader: Option<NodeId>,

    /// The index of the last entry in the log, or of the snapshot watermark.
    pub last_log_index: u64,

    pub commit_index: u64,

    /// The index of the last entry handed to the apply channel.
    pub last_applied: u64,

    /// The last log id included in the latest snapshot.
    pub snapshot: Option<LogId>,

    /// It is Some() only when this node is leader.
    pub replication: Option<ReplicationMetrics>,
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Metrics{{")?;

        write!(
            f,
            "id:{}, {}, term:{}, vote:{}, last_log:{}, commit:{}, applied:{}, leader:{}, snapshot:{}",
            self.id,
            self.server_state,
            self.current_term,
            self.vote,
            self.last_log_index,
            self.commit_index,
            self.last_applied,
            self.current_leader.display(),
            self.snapshot.display(),
        )?;

        if let Some(replication) = &self.replication {
            write!(f, ", replication:{{")?;
            for (i, (id, matched)) in replication.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{}:{}", id, matched)?;
            }
            write!(f, "}}")?;
        }

        write!(f, "}}")?;
        Ok(())
    }
}

impl Metrics {
    pub fn new_initial(id: NodeId) -> Self {
        Self {
            running_state: Ok(()),
            id,

            current_term: 0,
            vote: Vote::default(),
            server_state: ServerState::Follower,
            current_leader: None,

            last_log_index: 0,
            commit_index: 0,
            last_applied: 0,
            snapshot: None,

            replication: None,
        }
    }
}
