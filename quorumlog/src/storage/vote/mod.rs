use std::fmt::Formatter;

use crate::base::display_ext::DisplayOptionExt;
use crate::storage::membership::NodeId;

/// `Vote` is the persistent part of a node's term/role state: the current
/// term and the candidate this node voted for in that term.
///
/// `voted_for` is only meaningful within `term`: whenever the term moves
/// forward, the vote is reset to `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[derive(serde::Deserialize, serde::Serialize)]
pub struct Vote {
    pub term: u64,
    pub voted_for: Option<NodeId>,
}

impl std::fmt::Display for Vote {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "<T{}-N{}>", self.term, self.voted_for.display())
    }
}

impl Vote {
    /// A vote in `term` that has been granted to `node_id`.
    pub fn new(term: u64, node_id: NodeId) -> Self {
        Self {
            term,
            voted_for: Some(node_id),
        }
    }

    /// A vote in `term` that has not been granted to anyone yet.
    pub fn new_unvoted(term: u64) -> Self {
        Self {
            term,
            voted_for: None,
        }
    }

    pub fn term(&self) -> u64 {
        self.term
    }

    pub fn voted_for(&self) -> Option<NodeId> {
        self.voted_for
    }

    /// Returns `true` if this vote can be granted to `candidate` without
    /// changing the term: nobody or the same candidate has been voted for.
    pub fn can_grant(&self, candidate: NodeId) -> bool {
        match self.voted_for {
            None => true,
            Some(id) => id == candidate,
        }
    }
}
