//! Public interface and data types.
//!
//! [`Raft`] serves as the primary interface to a Raft node,
//! facilitating all interactions with the underlying Core.
//!
//! While `Core` operates as a singleton task per node, [`Raft`]
//! instances are designed to be cheaply cloneable.
//! This allows multiple components within the application that require
//! interaction with `Core` to efficiently share access.

mod append_entries;
mod apply_message;
mod inner;
mod install_snapshot;
mod request_vote;
mod runtime_config_handle;

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::trace_span;
use tracing::Instrument;
use tracing::Level;

pub use self::append_entries::AppendEntries;
pub use self::append_entries::AppendEntriesReply;
pub use self::append_entries::ConflictHint;
pub use self::apply_message::ApplyMessage;
pub use self::install_snapshot::InstallSnapshot;
pub use self::install_snapshot::InstallSnapshotReply;
pub use self::request_vote::RequestVote;
pub use self::request_vote::VoteReply;
pub use self::runtime_config_handle::RuntimeConfigHandle;
use crate::config::Config;
use crate::config::RuntimeConfig;
use crate::core::apply::Applier;
use crate::core::core::Core;
use crate::core::core_state::CoreState;
use crate::core::election_timer::ElectionTimer;
use crate::core::io::api_message::APIMessage;
use crate::core::Tick;
use crate::errors::Fatal;
use crate::errors::ForwardToLeader;
use crate::errors::RejectSnapshot;
use crate::metrics::Metrics;
use crate::metrics::Wait;
use crate::raft::inner::RaftInner;
use crate::storage::log::log_id::LogId;
use crate::storage::membership::Membership;
use crate::storage::membership::NodeId;
use crate::storage::raft_log::RaftLog;
use crate::storage::vote::Vote;
use crate::storage::Persister;
use crate::Network;
use crate::TypeConfig;

/// The Raft API.
///
/// ### Clone
///
/// This type implements `Clone`, and cloning itself is very cheap and helps to
/// facilitate use with async workflows.
///
/// ### Shutting down
///
/// If any of the interfaces returns a [`Fatal`], this indicates that
/// the Raft node is shutting down. If the parent application needs to
/// shutdown the Raft node for any reason, calling `shutdown` will do the
/// trick.
#[derive(Clone)]
pub struct Raft<C>
where C: TypeConfig
{
    inner: Arc<RaftInner<C>>,
}

impl<C> Raft<C>
where C: TypeConfig
{
    /// Create and spawn a new Raft node.
    ///
    /// It returns at once; the persisted state is loaded by the spawned Core
    /// task before it handles any message.
    ///
    /// ### `id`
    /// The ID which the spawned Raft task will use to identify itself within
    /// the cluster. It must be a member of `membership`.
    ///
    /// ### `config`
    /// Raft's runtime config. See the docs on the `Config` object for more
    /// details.
    ///
    /// ### `network`
    /// An implementation of the [`Network`] trait which will be used
    /// by Raft for sending RPCs to peer nodes within the cluster.
    ///
    /// ### `persister`
    /// The durable store of vote, log and snapshot. A node restarted with the
    /// same persister resumes from the saved state.
    ///
    /// ### `tx_apply`
    /// Every committed entry, and every installed snapshot, is sent to this
    /// channel exactly once and in log order.
    #[tracing::instrument(level = "debug", skip_all, fields(id=display(id)))]
    pub fn new<Net, P>(
        id: NodeId,
        config: Arc<Config>,
        membership: Membership,
        network: Net,
        persister: P,
        tx_apply: mpsc::Sender<ApplyMessage<C>>,
    ) -> Self
    where
        Net: Network<C>,
        P: Persister,
    {
        let (tx_api, rx_api) = mpsc::unbounded_channel();
        let (tx_notify, rx_notify) = mpsc::unbounded_channel();
        let (tx_metrics, rx_metrics) =
            watch::channel(Metrics::new_initial(id));
        let (tx_shutdown, rx_shutdown) = oneshot::channel();
        let (tx_deadline, rx_deadline) = watch::channel(
            Instant::now() + config.new_rand_election_timeout(),
        );
        let (tx_apply_queue, rx_apply_queue) = mpsc::unbounded_channel();

        let killed = Arc::new(AtomicBool::new(false));
        let runtime_config = Arc::new(RuntimeConfig::new(&config));

        let tick_handle = Tick::spawn(
            config.heartbeat_interval(),
            tx_notify.clone(),
            runtime_config.clone(),
            killed.clone(),
        );

        let _ = ElectionTimer::spawn(
            rx_deadline,
            tx_notify.clone(),
            killed.clone(),
        );

        let _ = Applier::<C>::spawn(
            id,
            rx_apply_queue,
            tx_apply,
            tx_notify.clone(),
            killed.clone(),
        );

        let core_span = tracing::span!(
            parent: tracing::Span::current(),
            Level::DEBUG,
            "Core",
            id = display(&id),
        );

        let core: Core<C, Net, P> = Core {
            id,
            config: config.clone(),
            runtime_config: runtime_config.clone(),
            membership,
            network,
            persister,

            vote: Vote::default(),
            log: RaftLog::default(),
            snapshot: None,

            commit_index: 0,
            apply_queued: 0,
            last_applied: 0,

            current_leader: None,
            leader: None,
            candidate: None,

            tx_election_deadline: tx_deadline,
            killed: killed.clone(),

            rx_api,
            rx_shutdown,

            tx_notification: tx_notify,
            rx_notification: rx_notify,

            tx_apply: tx_apply_queue,

            tx_metrics,

            span: core_span,
        };

        let core_handle = tokio::spawn(
            core.main().instrument(trace_span!("spawn").or_current()),
        );

        let inner = RaftInner {
            id,
            config,
            runtime_config,
            tick_handle,
            killed,
            tx_api,
            tx_shutdown: Mutex::new(Some(tx_shutdown)),
            rx_metrics,
            core_state: Mutex::new(CoreState::Running(core_handle)),
        };

        Self {
            inner: Arc::new(inner),
        }
    }

    /// Return a handle to update runtime config.
    ///
    /// Such enabling/disabling heartbeat, election, etc.
    ///
    /// Example:
    /// ```ignore
    /// let raft = Raft::new(...);
    /// raft.runtime_config().heartbeat(true);
    /// raft.runtime_config().tick(true);
    /// raft.runtime_config().elect(true);
    /// ```
    pub fn runtime_config(&self) -> RuntimeConfigHandle<C> {
        RuntimeConfigHandle::new(self.inner.as_ref())
    }

    /// Return the config of this Raft node.
    pub fn config(&self) -> &Arc<Config> {
        &self.inner.config
    }

    /// Trigger election at once and return at once.
    ///
    /// Returns error when Core has [`Fatal`] error, e.g. shut down or
    /// having storage error. It is not affected by
    /// `RuntimeConfigHandle::elect(false)`.
    pub async fn trigger_elect(&self) -> Result<(), Fatal> {
        self.inner.send_msg(APIMessage::Elect).await
    }

    /// Trigger a heartbeat at once and return at once.
    ///
    /// Returns error when Core has [`Fatal`] error, e.g. shut down or
    /// having storage error. It is not affected by
    /// `RuntimeConfigHandle::heartbeat(false)`.
    pub async fn trigger_heartbeat(&self) -> Result<(), Fatal> {
        self.inner.send_msg(APIMessage::BroadcastHeartbeat).await
    }

    /// Submit a RequestVote RPC to this Raft node.
    ///
    /// These RPCs are sent by cluster peers which are in candidate state
    /// attempting to gather votes (§5.2).
    pub async fn handle_request_vote(
        &self,
        rpc: RequestVote,
    ) -> Result<VoteReply, Fatal> {
        tracing::debug!(rpc = display(&rpc), "Raft::handle_request_vote()");

        let (tx, rx) = oneshot::channel();
        self.inner.call_core(APIMessage::RequestVote { rpc, tx }, rx).await
    }

    /// Submit an AppendEntries RPC to this Raft node.
    ///
    /// These RPCs are sent by the cluster leader to replicate log entries
    /// (§5.3), and are also used as heartbeats (§5.2).
    pub async fn handle_append_entries(
        &self,
        rpc: AppendEntries<C>,
    ) -> Result<AppendEntriesReply, Fatal> {
        tracing::debug!(rpc = display(&rpc), "Raft::handle_append_entries()");

        let (tx, rx) = oneshot::channel();
        self.inner.call_core(APIMessage::AppendEntries { rpc, tx }, rx).await
    }

    /// Submit an InstallSnapshot RPC to this Raft node.
    ///
    /// These RPCs are sent by the cluster leader to bring a new node or a slow
    /// node up-to-speed when the entries it needs are already compacted
    /// (§7).
    pub async fn handle_install_snapshot(
        &self,
        rpc: InstallSnapshot,
    ) -> Result<InstallSnapshotReply, Fatal> {
        tracing::debug!(rpc = display(&rpc), "Raft::handle_install_snapshot()");

        let (tx, rx) = oneshot::channel();
        self.inner.call_core(APIMessage::InstallSnapshot { rpc, tx }, rx).await
    }

    /// Submit a command to be appended to the replicated log (§5.1).
    ///
    /// On a leader, the command is appended to the local log and replicated at
    /// once, and the returned [`LogId`] tells the term and index it is
    /// expected to be committed at. There is no guarantee it will ever be
    /// committed: the leader may lose leadership before that. The
    /// application learns the outcome from the apply channel.
    ///
    /// A non-leader returns [`ForwardToLeader`] without any side effect.
    #[tracing::instrument(level = "debug", skip(self, command))]
    pub async fn submit(
        &self,
        command: C::AppData,
    ) -> Result<Result<LogId, ForwardToLeader>, Fatal> {
        let (tx, rx) = oneshot::channel();
        self.inner.call_core(APIMessage::Submit { command, tx }, rx).await
    }

    /// Return the current term and whether this node believes it is the
    /// leader.
    pub async fn get_state(&self) -> Result<(u64, bool), Fatal> {
        let (tx, rx) = oneshot::channel();
        self.inner.call_core(APIMessage::GetState { tx }, rx).await
    }

    /// Replace the log upto and including `upto` with an application built
    /// snapshot `data`.
    ///
    /// `data` must reflect the state after applying every entry upto `upto`.
    #[tracing::instrument(level = "debug", skip(self, data))]
    pub async fn request_snapshot(
        &self,
        upto: u64,
        data: Vec<u8>,
    ) -> Result<Result<(), RejectSnapshot>, Fatal> {
        let (tx, rx) = oneshot::channel();
        self.inner
            .call_core(APIMessage::RequestSnapshot { upto, data, tx }, rx)
            .await
    }

    /// Get the ID of the current leader from this Raft node.
    ///
    /// This method is based on the Raft metrics system which does a good job
    /// at staying up-to-date; however, [`Self::get_state`] must still be
    /// used to guard against stale reads. This method is perfect for making
    /// decisions on where to route client requests.
    pub fn current_leader(&self) -> Option<NodeId> {
        self.inner.rx_metrics.borrow().current_leader
    }

    /// Get a handle to the metrics channel.
    pub fn metrics(&self) -> watch::Receiver<Metrics> {
        self.inner.rx_metrics.clone()
    }

    /// Get a handle to wait for the metrics to satisfy some condition.
    ///
    /// If `timeout` is `None`, then it will wait forever(10 years).
    /// If `timeout` is `Some`, then it will wait for the specified duration.
    ///
    /// ```ignore
    /// # use std::time::Duration;
    /// # use quorumlog::{ServerState, Raft};
    ///
    /// let timeout = Duration::from_millis(200);
    ///
    /// // wait for raft log-3 to be received and applied:
    /// r.wait(Some(timeout)).applied_index(3, "log").await?;
    ///
    /// // wait for ever for raft node's current leader to become 3:
    /// r.wait(None).current_leader(3, "wait for leader").await?;
    ///
    /// // wait for raft state to become a follower
    /// r.wait(None).state(ServerState::Follower, "state").await?;
    /// ```
    pub fn wait(&self, timeout: Option<Duration>) -> Wait {
        let timeout = match timeout {
            Some(t) => t,
            None => Duration::from_secs(86400 * 365 * 10),
        };
        Wait {
            timeout,
            rx: self.inner.rx_metrics.clone(),
        }
    }

    /// Whether this node is shut down, or is shutting down.
    pub fn is_killed(&self) -> bool {
        self.inner.killed.load(Ordering::Relaxed)
    }

    /// Shutdown this Raft node and every task it spawned.
    ///
    /// It returns once the Core task quits. It can be called more than once:
    /// a normal shutdown returns `Ok(())`, otherwise the error that stopped
    /// Core is returned.
    pub async fn shutdown(&self) -> Result<(), Fatal> {
        self.inner.killed.store(true, Ordering::Relaxed);

        let tx = self.inner.tx_shutdown.lock().unwrap().take();
        if let Some(tx) = tx {
            let send_res = tx.send(());
            tracing::info!("sending shutdown signal to Core: {:?}", send_res);
        }

        if let Some(join_handle) = self.inner.tick_handle.shutdown() {
            let _ = join_handle.await;
        }

        self.inner.join_core_task().await;

        let core_res = {
            let state = self.inner.core_state.lock().unwrap();
            match &*state {
                CoreState::Done(res) => res.clone(),
                _ => Err(Fatal::Stopped),
            }
        };

        match core_res {
            Ok(x) => match x {},
            Err(Fatal::Stopped) => Ok(()),
            Err(fatal) => Err(fatal),
        }
    }
}
