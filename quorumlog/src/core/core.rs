use std::convert::Infallible;
use std::io;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use anyerror::AnyError;
use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::Instrument;
use tracing::Level;
use tracing::Span;

use crate::base::display_ext::DisplayOptionExt;
use crate::config::Config;
use crate::config::RuntimeConfig;
use crate::core::io::api_message::APIMessage;
use crate::core::io::notification::Notification;
use crate::core::roles::candidate::Candidate;
use crate::core::roles::leader::Leader;
use crate::core::roles::leader_handler::LeaderHandler;
use crate::core::roles::vote_handler::VoteHandler;
use crate::core::CandidateState;
use crate::core::LeaderState;
use crate::errors::to_any_error;
use crate::errors::Fatal;
use crate::errors::ForwardToLeader;
use crate::errors::RejectSnapshot;
use crate::metrics::Metrics;
use crate::metrics::ServerState;
use crate::network::connection::Connection;
use crate::network::Network;
use crate::raft::AppendEntries;
use crate::raft::AppendEntriesReply;
use crate::raft::ApplyMessage;
use crate::raft::InstallSnapshot;
use crate::raft::InstallSnapshotReply;
use crate::raft::RequestVote;
use crate::raft::VoteReply;
use crate::storage::log::entry::Entry;
use crate::storage::log::log_id::LogId;
use crate::storage::membership::Membership;
use crate::storage::membership::NodeId;
use crate::storage::raft_log::RaftLog;
use crate::storage::vote::Vote;
use crate::storage::PersistentState;
use crate::storage::PersistentStateRef;
use crate::storage::Persister;
use crate::storage::Snapshot;
use crate::TypeConfig;

/// The core type implementing the Raft protocol.
///
/// All the state of a node lives here and is only touched by the Core task.
pub(crate) struct Core<C, Net, P>
where
    C: TypeConfig,
    Net: Network<C>,
    P: Persister,
{
    /// This node's ID.
    pub(crate) id: NodeId,

    /// This node's runtime config.
    pub(crate) config: Arc<Config>,

    pub(crate) runtime_config: Arc<RuntimeConfig>,

    pub(crate) membership: Membership,

    /// The [`Network`] implementation.
    pub(crate) network: Net,

    /// The [`Persister`] implementation.
    pub(crate) persister: P,

    /// The current term and the candidate voted for in it.
    pub(crate) vote: Vote,

    pub(crate) log: RaftLog<C>,

    /// The latest snapshot; its last log id is `log.snapshot_last()`.
    pub(crate) snapshot: Option<Snapshot>,

    pub(crate) commit_index: u64,

    /// The last index handed to the apply task.
    pub(crate) apply_queued: u64,

    /// The last index the apply task delivered to the application.
    pub(crate) last_applied: u64,

    /// The leader of the current term, if known.
    pub(crate) current_leader: Option<NodeId>,

    /// Represents the Leader state.
    pub(crate) leader: LeaderState,

    /// Represents the Candidate state.
    pub(crate) candidate: CandidateState,

    /// When the election timer expires.
    pub(crate) tx_election_deadline: watch::Sender<Instant>,

    /// Set once the node is shut down; every background task quits on it.
    pub(crate) killed: Arc<AtomicBool>,

    pub(crate) rx_api: mpsc::UnboundedReceiver<APIMessage<C>>,

    pub(crate) rx_shutdown: oneshot::Receiver<()>,

    /// A Sender to send callback by other components to [`Core`], when an
    /// RPC returns, a timer expires, or an entry is applied.
    pub(crate) tx_notification: mpsc::UnboundedSender<Notification>,

    /// A Receiver to receive callback from other components.
    pub(crate) rx_notification: mpsc::UnboundedReceiver<Notification>,

    /// Queue of messages to the apply task.
    pub(crate) tx_apply: mpsc::UnboundedSender<ApplyMessage<C>>,

    pub(crate) tx_metrics: watch::Sender<Metrics>,

    pub(crate) span: Span,
}

impl<C, Net, P> Core<C, Net, P>
where
    C: TypeConfig,
    Net: Network<C>,
    P: Persister,
{
    /// The main loop of the Raft protocol.
    pub(crate) async fn main(mut self) -> Result<Infallible, Fatal> {
        debug!("raft node started");

        let span = tracing::span!(parent: &self.span, Level::DEBUG, "main");
        let res = self.run().instrument(span).await;

        let err = match res {
            Ok(x) => match x {},
            Err(err) => err,
        };

        // Whatever the reason is, the node is gone.
        self.killed.store(true, Ordering::Relaxed);

        match err {
            Fatal::Stopped => { /* Normal quit */ }
            _ => {
                error!(error = display(&err), "quit Core::main on error");
            }
        }

        debug!("update the metrics for shutdown");
        {
            let mut curr = self.tx_metrics.borrow().clone();
            curr.running_state = Err(err.clone());
            curr.server_state = ServerState::Shutdown;
            curr.current_leader = None;
            curr.replication = None;

            self.tx_metrics.send_replace(curr);
        }

        info!("Core shutdown complete");

        Err(err)
    }

    async fn run(&mut self) -> Result<Infallible, Fatal> {
        self.load().await?;
        self.runtime_loop().await
    }

    /// Load the persisted state, or start from scratch if there is none.
    ///
    /// A persisted snapshot is handed to the apply task first, so that the
    /// application can rebuild its state from the apply channel alone.
    async fn load(&mut self) -> Result<(), Fatal> {
        assert!(
            self.membership.contains(&self.id),
            "node {} is not a member of {}",
            self.id,
            self.membership
        );

        let state = self.persister.read_state().await?;

        if let Some(buf) = state {
            let st = PersistentState::<C>::decode(&buf)?;

            self.vote = st.vote;
            self.log = RaftLog::new(st.snapshot_last, st.entries);

            if let Some(last) = st.snapshot_last {
                let data = self.persister.read_snapshot().await?;
                let Some(data) = data else {
                    let err = io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("snapshot upto {} is not found", last),
                    );
                    return Err(Fatal::from(err));
                };

                self.snapshot = Some(Snapshot::new(last, data.clone()));
                self.commit_index = last.index;
                self.apply_queued = last.index;
                self.queue_apply(ApplyMessage::Snapshot {
                    last_log_id: last,
                    data,
                });
            }

            info!(
                "id={} loaded state: vote: {}, log: {}",
                self.id, self.vote, self.log
            );
        } else {
            info!("id={} no persisted state, start from term 0", self.id);
        }

        self.reset_election_timer();
        Ok(())
    }

    /// Run an event handling loop
    ///
    /// It always returns a [`Fatal`] error upon returning.
    #[tracing::instrument(level = "debug", skip_all, fields(id=display(&self.id)))]
    async fn runtime_loop(&mut self) -> Result<Infallible, Fatal> {
        loop {
            if self.killed.load(Ordering::Relaxed) {
                info!("id={} killed, quit runtime_loop", self.id);
                return Err(Fatal::Stopped);
            }

            self.report_metrics();

            debug!("id={} runtime_loop: wait for next event", self.id);

            futures::select_biased! {
                _ = (&mut self.rx_shutdown).fuse() => {
                    info!("id={} received shutdown signal", self.id);
                    return Err(Fatal::Stopped);
                }

                notify_res = self.rx_notification.recv().fuse() => {
                    match notify_res {
                        Some(notify) => self.handle_notification(notify).await?,
                        None => {
                            tracing::error!("all rx_notify senders are dropped");
                            return Err(Fatal::Stopped);
                        }
                    };
                }

                msg_res = self.rx_api.recv().fuse() => {
                    match msg_res {
                        Some(msg) => self.handle_api_msg(msg).await?,
                        None => {
                            tracing::info!("all rx_api senders are dropped");
                            return Err(Fatal::Stopped);
                        }
                    };
                }
            }
        }
    }

    #[tracing::instrument(level = "debug", skip(self, msg), fields(id=display(&self.id)))]
    pub(crate) async fn handle_api_msg(
        &mut self,
        msg: APIMessage<C>,
    ) -> Result<(), Fatal> {
        debug!("RAFT_event id={:<2}  input: {}", self.id, msg);

        match msg {
            APIMessage::RequestVote { rpc, tx } => {
                let reply = self.handle_request_vote(rpc).await?;
                let _ = tx.send(reply);
            }
            APIMessage::AppendEntries { rpc, tx } => {
                let reply = self.handle_append_entries(rpc).await?;
                let _ = tx.send(reply);
            }
            APIMessage::InstallSnapshot { rpc, tx } => {
                let reply = self.handle_install_snapshot(rpc).await?;
                let _ = tx.send(reply);
            }
            APIMessage::Submit { command, tx } => {
                let res = self.submit(command).await?;
                let _ = tx.send(res);
            }
            APIMessage::GetState { tx } => {
                let _ = tx.send((self.vote.term, self.leader.is_some()));
            }
            APIMessage::RequestSnapshot { upto, data, tx } => {
                let res = self.request_snapshot(upto, data).await?;
                let _ = tx.send(res);
            }
            APIMessage::Elect => {
                if self.leader.is_some() {
                    info!("ExternalCommand: already a Leader");
                } else {
                    self.elect().await?;
                }
            }
            APIMessage::BroadcastHeartbeat => {
                if let Some(mut lh) = self.leader_handler() {
                    lh.broadcast_replication().await;
                }
            }
        };

        Ok(())
    }

    pub(crate) async fn handle_notification(
        &mut self,
        notify: Notification,
    ) -> Result<(), Fatal> {
        debug!("RAFT_event id={:<2} notify: {}", self.id, notify);

        match notify {
            Notification::VoteReply {
                target,
                reply,
                sender_term,
            } => {
                self.handle_vote_reply(target, reply, sender_term).await?;
            }

            Notification::AppendEntriesReply {
                target,
                reply,
                sender_term,
                last_index,
            } => {
                self.handle_append_entries_reply(
                    target,
                    reply,
                    sender_term,
                    last_index,
                )
                .await?;
            }

            Notification::InstallSnapshotReply {
                target,
                reply,
                sender_term,
                snapshot_last,
            } => {
                self.handle_install_snapshot_reply(
                    target,
                    reply,
                    sender_term,
                    snapshot_last,
                )
                .await?;
            }

            Notification::ElectionTimeout { deadline } => {
                self.handle_election_timeout(deadline).await?;
            }

            Notification::Applied { log_id } => {
                self.last_applied =
                    std::cmp::max(self.last_applied, log_id.index);
                self.apply_committed();
            }

            Notification::Tick { i } => {
                debug!("received tick: {}", i);

                if !self.runtime_config.enable_heartbeat.load(Ordering::Relaxed)
                {
                    return Ok(());
                }

                if let Some(mut lh) = self.leader_handler() {
                    lh.broadcast_replication().await;
                }
            }
        };
        Ok(())
    }

    async fn handle_election_timeout(
        &mut self,
        deadline: Instant,
    ) -> Result<(), Fatal> {
        if deadline != *self.tx_election_deadline.borrow() {
            debug!("id={} stale election timeout, ignore", self.id);
            return Ok(());
        }

        if self.leader.is_some() {
            debug!("id={} already a leader, do not elect", self.id);
            self.reset_election_timer();
            return Ok(());
        }

        if !self.runtime_config.enable_tick.load(Ordering::Relaxed)
            || !self.runtime_config.enable_elect.load(Ordering::Relaxed)
        {
            debug!("id={} election is disabled", self.id);
            self.reset_election_timer();
            return Ok(());
        }

        info!("id={} election timeout passed, about to elect", self.id);
        self.elect().await
    }

    /// Start an election in the next term.
    async fn elect(&mut self) -> Result<(), Fatal> {
        let term = self.vote.term + 1;

        self.vote = Vote::new(term, self.id);
        self.current_leader = None;
        self.vote_handler().step_down();
        self.candidate = Some(Candidate::new(term, self.membership.clone()));

        self.save_state().await?;
        self.reset_election_timer();

        info!("id={} start election in T{}", self.id, term);

        let granted = match self.candidate.as_mut() {
            Some(candidate) => candidate.grant_by(&self.id),
            None => false,
        };

        if granted {
            self.establish_leader().await;
            return Ok(());
        }

        self.broadcast_request_vote(term).await;
        Ok(())
    }

    /// Spawn parallel vote requests to all cluster members.
    async fn broadcast_request_vote(&mut self, term: u64) {
        let req = RequestVote::new(term, self.id, self.log.last_log_id());

        for (target, target_node) in self.membership.clone().nodes() {
            if target == &self.id {
                continue;
            }

            let mut client =
                self.network.new_connection(*target, target_node).await;

            let req = req.clone();
            let target = *target;
            let ttl = Duration::from_millis(self.config.election_timeout_min);
            let tx = self.tx_notification.clone();

            let fu = async move {
                let res =
                    tokio::time::timeout(ttl, client.request_vote(req)).await;
                let reply = res.map_err(to_any_error)?.map_err(to_any_error)?;

                let notification = Notification::VoteReply {
                    target,
                    reply,
                    sender_term: term,
                };

                let _ = tx.send(notification);
                Ok::<(), AnyError>(())
            };

            // False positive lint warning(`non-binding `let` on a future`): https://github.com/rust-lang/rust-clippy/issues/9932
            #[allow(clippy::let_underscore_future)]
            let _ = tokio::spawn(fu);
        }
    }

    pub(crate) async fn handle_vote_reply(
        &mut self,
        target: NodeId,
        reply: VoteReply,
        sender_term: u64,
    ) -> Result<(), Fatal> {
        if self.vote_handler().update_term(reply.term) {
            self.save_state().await?;
            return Ok(());
        }

        let Some(candidate) = self.candidate.as_mut() else {
            // If the voting process has finished or canceled,
            // just ignore the delayed vote_resp.
            return Ok(());
        };

        if sender_term != candidate.term || reply.term != candidate.term {
            debug!(
                "id={} vote reply from {} for T{} is stale, candidate: {}",
                self.id, target, sender_term, candidate
            );
            return Ok(());
        }

        if !reply.vote_granted {
            return Ok(());
        }

        if candidate.grant_by(&target) {
            info!("id={} a quorum granted my vote", self.id);
            self.establish_leader().await;
        }

        Ok(())
    }

    /// Candidate vote is granted by a quorum, leader established.
    async fn establish_leader(&mut self) {
        let Some(candidate) = self.candidate.take() else {
            return;
        };

        debug_assert_eq!(candidate.term, self.vote.term);

        let leader = Leader::new(
            self.id,
            candidate.term,
            self.membership.clone(),
            self.log.last_index(),
        );
        self.leader = Some(Box::new(leader));
        self.current_leader = Some(self.id);

        info!(
            "id={} became leader in T{}, last log: {}",
            self.id,
            self.vote.term,
            self.log.last_log_id().display()
        );

        if let Some(mut lh) = self.leader_handler() {
            lh.broadcast_replication().await;
        }
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub(crate) async fn handle_request_vote(
        &mut self,
        req: RequestVote,
    ) -> Result<VoteReply, Fatal> {
        info!(req = display(&req), "handle_request_vote");

        assert!(
            self.membership.contains(&req.candidate_id),
            "vote request from unknown node {}",
            req.candidate_id
        );

        let before = self.vote;
        let my_last_log_id = self.log.last_log_id();

        self.vote_handler().update_term(req.term);
        let res = self.vote_handler().grant_vote(&req, my_last_log_id);

        info!(
            req = display(&req),
            result = debug(&res),
            "handle vote request result"
        );

        if self.vote != before {
            self.save_state().await?;
        }

        if res.is_ok() {
            self.reset_election_timer();
        }

        Ok(VoteReply::new(self.vote.term, res.is_ok()))
    }

    /// Accept the sender of an AppendEntries or InstallSnapshot with a term not
    /// less than the local one as the leader.
    fn accept_leader(&mut self, term: u64, leader_id: NodeId) {
        assert!(
            self.membership.contains(&leader_id),
            "request from unknown leader {}",
            leader_id
        );

        self.vote_handler().update_term(term);

        if let Some(l) = self.leader.as_ref() {
            assert_ne!(
                l.term, term,
                "two leaders in T{}: {} and {}",
                term, self.id, leader_id
            );
        }

        if self.candidate.is_some() {
            info!(
                "id={} sees leader {} in T{}, quit candidate",
                self.id, leader_id, term
            );
            self.candidate = None;
        }

        self.current_leader = Some(leader_id);
        self.reset_election_timer();
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub(crate) async fn handle_append_entries(
        &mut self,
        rpc: AppendEntries<C>,
    ) -> Result<AppendEntriesReply, Fatal> {
        debug!(rpc = display(&rpc), "handle_append_entries");

        if rpc.term < self.vote.term {
            debug!(
                "id={} reject AppendEntries of stale T{}, my term: {}",
                self.id, rpc.term, self.vote.term
            );
            return Ok(AppendEntriesReply::stale(self.vote.term));
        }

        let before = self.vote;
        self.accept_leader(rpc.term, rpc.leader_id);

        if let Some(prev) = rpc.prev_log_id.as_ref() {
            if !self.log.has_log_id(Some(prev)) {
                let hint = self.log.conflict_hint(prev);
                debug!(
                    "id={} prev_log_id {} not found, conflict: {}",
                    self.id, prev, hint
                );

                if self.vote != before {
                    self.save_state().await?;
                }
                return Ok(AppendEntriesReply::conflict(self.vote.term, hint));
            }
        }

        let last_index = rpc.last_index();
        let log_changed = self.log.merge(rpc.entries);

        if log_changed || self.vote != before {
            self.save_state().await?;
        }

        let new_commit = std::cmp::min(rpc.leader_commit, last_index);
        if new_commit > self.commit_index {
            debug!(
                "id={} commit index: {} -> {}",
                self.id, self.commit_index, new_commit
            );
            self.commit_index = new_commit;
            self.apply_committed();
        }

        Ok(AppendEntriesReply::success(self.vote.term))
    }

    async fn handle_append_entries_reply(
        &mut self,
        target: NodeId,
        reply: AppendEntriesReply,
        sender_term: u64,
        last_index: u64,
    ) -> Result<(), Fatal> {
        if self.vote_handler().update_term(reply.term) {
            self.save_state().await?;
            return Ok(());
        }

        let Some(leader) = self.leader.as_mut() else {
            return Ok(());
        };

        if sender_term != leader.term {
            debug!(
                "id={} AppendEntries reply from {} for T{} is stale",
                self.id, target, sender_term
            );
            return Ok(());
        }

        if reply.success {
            let accepted = leader.update_matching(target, last_index);
            self.try_commit(accepted);
        } else {
            // Retried on the next heartbeat.
            leader.back_off(target, reply.conflict, &self.log);
        }

        Ok(())
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub(crate) async fn handle_install_snapshot(
        &mut self,
        rpc: InstallSnapshot,
    ) -> Result<InstallSnapshotReply, Fatal> {
        info!(rpc = display(&rpc), "handle_install_snapshot");

        if rpc.term < self.vote.term {
            return Ok(InstallSnapshotReply {
                term: self.vote.term,
            });
        }

        let before = self.vote;
        self.accept_leader(rpc.term, rpc.leader_id);

        let last = match rpc.meta.last_log_id {
            Some(last) if last.index > self.commit_index => last,
            _ => {
                debug!(
                    "id={} snapshot {} is not newer than commit index {}, ignore",
                    self.id, rpc.meta, self.commit_index
                );
                if self.vote != before {
                    self.save_state().await?;
                }
                return Ok(InstallSnapshotReply {
                    term: self.vote.term,
                });
            }
        };

        self.log.install_snapshot(last);
        self.snapshot = Some(Snapshot {
            meta: rpc.meta,
            data: rpc.data.clone(),
        });
        self.commit_index = last.index;

        self.save_state_with_snapshot().await?;

        info!("id={} installed snapshot: {}", self.id, rpc.meta);

        self.apply_queued = last.index;
        self.queue_apply(ApplyMessage::Snapshot {
            last_log_id: last,
            data: rpc.data,
        });

        Ok(InstallSnapshotReply {
            term: self.vote.term,
        })
    }

    async fn handle_install_snapshot_reply(
        &mut self,
        target: NodeId,
        reply: InstallSnapshotReply,
        sender_term: u64,
        snapshot_last: LogId,
    ) -> Result<(), Fatal> {
        if self.vote_handler().update_term(reply.term) {
            self.save_state().await?;
            return Ok(());
        }

        let Some(leader) = self.leader.as_mut() else {
            return Ok(());
        };

        if sender_term != leader.term {
            return Ok(());
        }

        let accepted = leader.update_matching(target, snapshot_last.index);
        self.try_commit(accepted);
        Ok(())
    }

    /// Append a command to the leader's log and replicate it at once.
    #[tracing::instrument(level = "debug", skip_all)]
    async fn submit(
        &mut self,
        command: C::AppData,
    ) -> Result<Result<LogId, ForwardToLeader>, Fatal> {
        if self.leader.is_none() {
            return Ok(Err(ForwardToLeader {
                leader_id: self.current_leader,
            }));
        }

        let log_id = LogId::new(self.vote.term, self.log.last_index() + 1);
        self.log.append(Entry::new(log_id, command));
        self.save_state().await?;

        debug!("id={} appended: {}", self.id, log_id);

        let accepted = match self.leader.as_mut() {
            Some(leader) => leader.update_matching(self.id, log_id.index),
            None => 0,
        };
        self.try_commit(accepted);

        if let Some(mut lh) = self.leader_handler() {
            lh.broadcast_replication().await;
        }

        Ok(Ok(log_id))
    }

    /// Compact the log up to `upto` with the application provided snapshot.
    #[tracing::instrument(level = "debug", skip(self, data))]
    async fn request_snapshot(
        &mut self,
        upto: u64,
        data: Vec<u8>,
    ) -> Result<Result<(), RejectSnapshot>, Fatal> {
        if let Some(last) = self.log.snapshot_last() {
            if upto <= last.index {
                return Ok(Err(RejectSnapshot::AlreadyCompacted {
                    upto,
                    snapshot_last: last,
                }));
            }
        }

        let not_applied = RejectSnapshot::NotApplied {
            upto,
            last_applied: self.apply_queued,
        };

        if upto > self.apply_queued {
            return Ok(Err(not_applied));
        }

        let Some(log_id) = self.log.log_id_at(upto) else {
            return Ok(Err(not_applied));
        };

        self.log.purge_upto(log_id);
        self.snapshot = Some(Snapshot::new(log_id, data));
        self.save_state_with_snapshot().await?;

        info!("id={} log compacted upto {}", self.id, log_id);
        Ok(Ok(()))
    }

    /// Commit upto the index replicated on a quorum, if the entry there is
    /// proposed in the current term.
    fn try_commit(&mut self, accepted: u64) {
        if accepted <= self.commit_index {
            return;
        }

        let term = self.log.log_id_at(accepted).map(|x| x.term);
        if term != Some(self.vote.term) {
            debug!(
                "id={} quorum accepted {} is not in current term, do not commit",
                self.id, accepted
            );
            return;
        }

        debug!(
            "id={} leader commit index: {} -> {}",
            self.id, self.commit_index, accepted
        );
        self.commit_index = accepted;
        self.apply_committed();
    }

    /// Hand committed entries that are not yet queued to the apply task.
    ///
    /// At most `max_apply_backlog` entries are queued beyond what the
    /// application has received; the rest is queued on `Applied`.
    fn apply_committed(&mut self) {
        let limit = self.last_applied + self.config.max_apply_backlog;

        while self.apply_queued < self.commit_index && self.apply_queued < limit {
            let index = self.apply_queued + 1;

            let Some(entry) = self.log.get(index) else {
                error!(
                    "id={} committed entry {} is not in log: {}",
                    self.id, index, self.log
                );
                break;
            };

            let msg = ApplyMessage::Entry {
                log_id: entry.log_id,
                command: entry.payload.clone(),
            };
            self.queue_apply(msg);
            self.apply_queued = index;
        }
    }

    fn queue_apply(&self, msg: ApplyMessage<C>) {
        if self.tx_apply.send(msg).is_err() {
            tracing::warn!("id={} apply task terminated", self.id);
        }
    }

    async fn save_state(&mut self) -> Result<(), Fatal> {
        self.persist(false).await
    }

    async fn save_state_with_snapshot(&mut self) -> Result<(), Fatal> {
        self.persist(true).await
    }

    /// Write vote and log, and the snapshot if `with_snapshot`, in one atomic
    /// save.
    async fn persist(&mut self, with_snapshot: bool) -> Result<(), Fatal> {
        let buf = PersistentStateRef::<C> {
            vote: &self.vote,
            snapshot_last: self.log.snapshot_last(),
            entries: self.log.entries(),
        }
        .encode()?;

        let snapshot = if with_snapshot {
            self.snapshot.as_ref().map(|s| s.data.clone())
        } else {
            None
        };

        self.persister.save(buf, snapshot).await?;
        Ok(())
    }

    fn reset_election_timer(&mut self) {
        let deadline = Instant::now() + self.config.new_rand_election_timeout();
        self.tx_election_deadline.send_replace(deadline);
    }

    /// Report a metrics payload on the current state of the Raft node.
    pub(crate) fn report_metrics(&mut self) {
        let server_state = if self.leader.is_some() {
            ServerState::Leader
        } else if self.candidate.is_some() {
            ServerState::Candidate
        } else {
            ServerState::Follower
        };

        let m = Metrics {
            running_state: Ok(()),
            id: self.id,

            current_term: self.vote.term,
            vote: self.vote,
            server_state,
            current_leader: self.current_leader,

            last_log_index: self.log.last_index(),
            commit_index: self.commit_index,
            last_applied: self.last_applied,
            snapshot: self.log.snapshot_last(),

            replication: self.leader.as_ref().map(|l| l.replication_metrics()),
        };

        self.tx_metrics.send_if_modified(|curr| {
            if *curr == m {
                return false;
            }
            debug!("id={} report_metrics: {}", m.id, m);
            *curr = m;
            true
        });
    }

    pub(crate) fn vote_handler(&mut self) -> VoteHandler<'_> {
        VoteHandler {
            id: self.id,
            vote: &mut self.vote,
            current_leader: &mut self.current_leader,
            leader: &mut self.leader,
            candidate: &mut self.candidate,
        }
    }

    /// Get a LeaderHandler for handling leader's operation, `None` if it is
    /// not a leader.
    pub(crate) fn leader_handler(
        &mut self,
    ) -> Option<LeaderHandler<'_, C, Net>> {
        let leader = self.leader.as_mut()?;

        Some(LeaderHandler {
            config: &self.config,
            network: &mut self.network,
            tx_notification: self.tx_notification.clone(),
            leader: &mut **leader,
            log: &self.log,
            snapshot: self.snapshot.as_ref(),
            commit_index: self.commit_index,
        })
    }
}
