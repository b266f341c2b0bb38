use std::fmt;

use tracing::info;

use crate::quorum::VecProgress;
use crate::storage::membership::Membership;
use crate::storage::membership::NodeId;

/// Candidate: voting state.
#[derive(Clone, Debug)]
#[derive(PartialEq, Eq)]
pub(crate) struct Candidate {
    /// The term this candidate is campaigning in.
    pub(crate) term: u64,

    /// Which nodes have granted the vote in `term`.
    progress: VecProgress<NodeId, bool, Membership>,
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{T{}, progress:{}}}", self.term, self.progress)
    }
}

impl Candidate {
    pub(crate) fn new(term: u64, membership: Membership) -> Self {
        let progress = VecProgress::new(membership, false);

        let c = Self { term, progress };
        info!("new candidate: {}", c);
        c
    }

    /// Grant the vote by a node. Returns `true` if a quorum has granted.
    ///
    /// A grant from a node out of the membership is an invariant violation.
    pub(crate) fn grant_by(&mut self, target: &NodeId) -> bool {
        let granted = match self.progress.update(target, true) {
            Ok(granted) => *granted,
            Err(_) => {
                panic!("vote granted by {} not in membership", target);
            }
        };

        info!(
            "candidate T{} is granted by {}, quorum granted: {}",
            self.term, target, granted
        );

        granted
    }
}
