use std::fmt;

use crate::base::display_ext::DisplayOptionExt;
use crate::base::display_ext::DisplaySliceExt;
use crate::storage::log::entry::Entry;
use crate::storage::log::log_id::LogId;
use crate::storage::log::log_id::LogIdOptionExt;
use crate::storage::membership::NodeId;
use crate::TypeConfig;

/// An RPC sent by the leader to replicate log entries (§5.3), and as a
/// heartbeat when `entries` is empty (§5.2).
#[derive(serde::Deserialize, serde::Serialize)]
#[serde(bound = "")]
pub struct AppendEntries<C>
where C: TypeConfig
{
    pub term: u64,
    pub leader_id: NodeId,

    /// The log id right before `entries`; `None` if `entries` start at
    /// index 1.
    pub prev_log_id: Option<LogId>,

    pub entries: Vec<Entry<C>>,

    /// The commit index of the leader.
    pub leader_commit: u64,
}

impl<C> Clone for AppendEntries<C>
where C: TypeConfig
{
    fn clone(&self) -> Self {
        Self {
            term: self.term,
            leader_id: self.leader_id,
            prev_log_id: self.prev_log_id,
            entries: self.entries.clone(),
            leader_commit: self.leader_commit,
        }
    }
}

impl<C> fmt::Debug for AppendEntries<C>
where C: TypeConfig
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppendEntries")
            .field("term", &self.term)
            .field("leader_id", &self.leader_id)
            .field("prev_log_id", &self.prev_log_id)
            .field("entries", &self.entries)
            .field("leader_commit", &self.leader_commit)
            .finish()
    }
}

impl<C> fmt::Display for AppendEntries<C>
where C: TypeConfig
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{term:{}, leader:{}, prev:{}, entries:{}, commit:{}}}",
            self.term,
            self.leader_id,
            self.prev_log_id.display(),
            self.entries.display(),
            self.leader_commit
        )
    }
}

impl<C> AppendEntries<C>
where C: TypeConfig
{
    /// The index of the last entry this request proves the follower has, if
    /// it is accepted.
    pub fn last_index(&self) -> u64 {
        self.prev_log_id.index_or_zero() + self.entries.len() as u64
    }
}

/// Tells the leader where the follower's log diverges from `prev_log_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(serde::Deserialize, serde::Serialize)]
pub struct ConflictHint {
    /// If `term` is `None`, the follower's log is shorter than
    /// `prev_log_id` and this is its last index + 1. Otherwise it is the
    /// first index of `term` in the follower's log.
    pub index: u64,

    /// The term of the follower's entry at `prev_log_id.index`.
    pub term: Option<u64>,
}

impl fmt::Display for ConflictHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{index:{}, term:{}}}", self.index, self.term.display())
    }
}

/// The response to an [`AppendEntries`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[derive(serde::Deserialize, serde::Serialize)]
pub struct AppendEntriesReply {
    pub term: u64,
    pub success: bool,

    /// Set when the request is rejected because `prev_log_id` is not found.
    pub conflict: Option<ConflictHint>,
}

impl AppendEntriesReply {
    pub fn success(term: u64) -> Self {
        Self {
            term,
            success: true,
            conflict: None,
        }
    }

    /// The request carries a stale term.
    pub fn stale(term: u64) -> Self {
        Self {
            term,
            success: false,
            conflict: None,
        }
    }

    pub fn conflict(term: u64, hint: ConflictHint) -> Self {
        Self {
            term,
            success: false,
            conflict: Some(hint),
        }
    }
}

impl fmt::Display for AppendEntriesReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{term:{}, success:{}, conflict:{}}}",
            self.term,
            self.success,
            self.conflict.display()
        )
    }
}
