use std::collections::BTreeMap;

use crate::base::display_ext::DisplayOptionExt;
use crate::metrics::ReplicationMetrics;
use crate::quorum::VecProgress;
use crate::raft::ConflictHint;
use crate::storage::membership::Membership;
use crate::storage::membership::NodeId;
use crate::storage::raft_log::RaftLog;
use crate::TypeConfig;

/// Leading state data.
///
/// It exists only while this node is the leader of `term`, and is dropped
/// as soon as a greater term is seen.
pub(crate) struct Leader {
    pub(crate) id: NodeId,

    /// The term this leader works in.
    pub(crate) term: u64,

    pub(crate) membership: Membership,

    /// The index of the next entry to send to each follower.
    pub(crate) next_index: BTreeMap<NodeId, u64>,

    /// The highest index known to be replicated on each node, the leader
    /// itself included. Its quorum-accepted value is the commit candidate.
    pub(crate) match_progress: VecProgress<NodeId, u64, Membership>,
}

impl Leader {
    /// Create a new Leader.
    ///
    /// `last_index` is the last log index of the leader when elected.
    pub(crate) fn new(
        id: NodeId,
        term: u64,
        membership: Membership,
        last_index: u64,
    ) -> Self {
        let next_index = membership
            .node_ids()
            .filter(|x| *x != id)
            .map(|x| (x, last_index + 1))
            .collect();

        let mut match_progress = VecProgress::new(membership.clone(), 0);
        let _ = match_progress.update(&id, last_index);

        Self {
            id,
            term,
            membership,
            next_index,
            match_progress,
        }
    }

    pub(crate) fn next_index(&self, target: &NodeId) -> u64 {
        self.next_index.get(target).copied().unwrap_or(1)
    }

    pub(crate) fn match_index(&self, target: &NodeId) -> u64 {
        self.match_progress.get(target).unwrap_or_default()
    }

    /// Record that `target` has the log up to `matched`.
    ///
    /// Returns the index that is replicated on a quorum.
    pub(crate) fn update_matching(&mut self, target: NodeId, matched: u64) -> u64 {
        let accepted = match self.match_progress.increase_to(&target, matched) {
            Ok(x) => *x,
            Err(_) => {
                panic!("replication reply from {} not in membership", target);
            }
        };

        let m = self.match_index(&target);
        if target != self.id {
            self.next_index.insert(target, m + 1);
        }

        tracing::debug!(
            "leader T{}: {} matched {}, quorum accepted: {}",
            self.term,
            target,
            m,
            accepted
        );

        accepted
    }

    /// Move `next_index` of `target` back after a rejected AppendEntries.
    ///
    /// With a conflicting term, jump to right after the leader's last entry
    /// of that term, or to the follower's first index of that term if the
    /// leader has none. Never go below `match_index + 1`.
    pub(crate) fn back_off<C>(
        &mut self,
        target: NodeId,
        hint: Option<ConflictHint>,
        log: &RaftLog<C>,
    ) where
        C: TypeConfig,
    {
        let current = self.next_index(&target);

        let next = match hint {
            None => current.saturating_sub(1),
            Some(ConflictHint { index, term: None }) => index,
            Some(ConflictHint {
                index,
                term: Some(t),
            }) => match log.last_index_of_term(t) {
                Some(last) => last + 1,
                None => index,
            },
        };

        let floor = self.match_index(&target) + 1;
        let next = std::cmp::max(next, floor);
        let next = std::cmp::min(next, log.last_index() + 1);

        tracing::debug!(
            "leader T{}: {} rejected, hint: {}, next_index: {} -> {}",
            self.term,
            target,
            hint.display(),
            current,
            next
        );

        self.next_index.insert(target, next);
    }

    pub(crate) fn replication_metrics(&self) -> ReplicationMetrics {
        self.match_progress.iter().cloned().collect()
    }
}
