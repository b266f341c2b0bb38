use tracing::debug;
use tracing::info;

use crate::base::display_ext::DisplayOptionExt;
use crate::core::CandidateState;
use crate::core::LeaderState;
use crate::errors::RejectVoteRequest;
use crate::raft::RequestVote;
use crate::storage::log::log_id::LogId;
use crate::storage::membership::NodeId;
use crate::storage::vote::Vote;

/// Handle term and vote related operations.
///
/// The `vote` of a node decides its role: a node leaves Leader or Candidate
/// state as soon as it sees a greater term.
pub(crate) struct VoteHandler<'st> {
    pub(crate) id: NodeId,
    pub(crate) vote: &'st mut Vote,
    pub(crate) current_leader: &'st mut Option<NodeId>,
    pub(crate) leader: &'st mut LeaderState,
    pub(crate) candidate: &'st mut CandidateState,
}

impl<'st> VoteHandler<'st> {
    /// Move to `term` if it is greater than the local term.
    ///
    /// This is used by every incoming request and reply. On a greater term
    /// the vote is reset and this node becomes a follower.
    ///
    /// Returns `true` if the vote is changed and has to be persisted.
    #[tracing::instrument(level = "debug", skip_all)]
    pub(crate) fn update_term(&mut self, term: u64) -> bool {
        if term <= self.vote.term {
            return false;
        }

        info!(
            "id={} term is changing from {} to {}",
            self.id, self.vote.term, term
        );

        *self.vote = Vote::new_unvoted(term);
        *self.current_leader = None;
        self.step_down();
        true
    }

    /// Decide whether to grant a vote request, after the request term has
    /// been applied with [`update_term`](Self::update_term).
    ///
    /// The vote is granted if the request is in the current term, this node
    /// has not voted for another candidate in this term, and the candidate's
    /// log is at least as up-to-date as `my_last_log_id`.
    pub(crate) fn grant_vote(
        &mut self,
        req: &RequestVote,
        my_last_log_id: Option<LogId>,
    ) -> Result<(), RejectVoteRequest> {
        if req.term < self.vote.term {
            return Err(RejectVoteRequest::ByTerm(self.vote.term));
        }

        if !self.vote.can_grant(req.candidate_id) {
            // can_grant() returns false only if voted.
            let voted_for = self.vote.voted_for.unwrap_or_default();
            return Err(RejectVoteRequest::AlreadyVoted(voted_for));
        }

        if req.last_log_id < my_last_log_id {
            info!(
                "reject vote-request: by last_log_id: !(req.last_log_id({}) >= my_last_log_id({})",
                req.last_log_id.display(),
                my_last_log_id.display(),
            );
            return Err(RejectVoteRequest::ByLastLogId(my_last_log_id));
        }

        debug!(
            "id={} grant vote in T{} to {}",
            self.id, self.vote.term, req.candidate_id
        );

        self.vote.voted_for = Some(req.candidate_id);
        Ok(())
    }

    /// Leave Leader and Candidate state.
    pub(crate) fn step_down(&mut self) {
        if self.candidate.is_some() {
            info!("{} is no longer a candidate", self.id);
        }
        if self.leader.is_some() {
            info!("{} is no longer a leader", self.id);
        }
        *self.candidate = None;
        *self.leader = None;
    }
}
