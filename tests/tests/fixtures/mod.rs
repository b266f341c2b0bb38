#![allow(dead_code)]

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::Once;
use std::time::Duration;

use anyhow::bail;
use anyhow::Context;
use memstore::MemPersister;
use pseudonet::PseudoNet;
use quorumlog::ApplyMessage;
use quorumlog::Config;
use quorumlog::Membership;
use quorumlog::NodeId;
use quorumlog::Raft;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio::time::Instant;
use tracing_subscriber::EnvFilter;

quorumlog::declare_raft_types!(
    /// Commands in integration tests are plain strings.
    pub TypeConfig: AppData = String
);

/// Build the tokio runtime for a test and install the tracing subscriber once.
pub fn ut_harness<F, Fut>(f: F) -> anyhow::Result<()>
where
    F: FnOnce() -> Fut + 'static,
    Fut: Future<Output = anyhow::Result<()>> + 'static,
{
    init_ut_tracing();

    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(8)
        .enable_all()
        .build()?;

    let res = rt.block_on(f());
    if let Err(e) = &res {
        tracing::error!("test error: {:?}", e);
    }
    res
}

fn init_ut_tracing() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_ansi(false)
            .try_init();
    });
}

/// Timeouts scaled for tests: elections take a few hundred milliseconds.
pub fn test_config() -> anyhow::Result<Arc<Config>> {
    let config = Config {
        election_timeout_min: 150,
        election_timeout_max: 300,
        heartbeat_interval: 50,
        ..Default::default()
    }
    .validate()?;

    Ok(Arc::new(config))
}

pub fn timeout() -> Option<Duration> {
    Some(Duration::from_millis(5_000))
}

/// What the state machine of every node has applied.
///
/// Every delivery is checked against what the other nodes applied at the same
/// index, and against the order of deliveries to the same node.
#[derive(Debug, Default)]
pub struct Applied {
    /// Commands applied by each node, by log index.
    logs: BTreeMap<NodeId, BTreeMap<u64, String>>,

    last_applied: BTreeMap<NodeId, u64>,

    /// The last index of every snapshot each node has installed.
    snapshots: BTreeMap<NodeId, Vec<u64>>,

    errors: Vec<String>,
}

impl Applied {
    /// A restarted service starts empty and rebuilds from the apply channel.
    fn reset(&mut self, id: NodeId) {
        self.logs.insert(id, BTreeMap::new());
        self.last_applied.insert(id, 0);
    }

    fn last_applied(&self, id: NodeId) -> u64 {
        self.last_applied.get(&id).copied().unwrap_or_default()
    }

    fn check_agreement(&mut self, id: NodeId, index: u64, cmd: &str) {
        for (other, log) in self.logs.iter() {
            if let Some(prev) = log.get(&index) {
                if prev != cmd {
                    self.errors.push(format!(
                        "n{} applied {:?} at {}, but n{} applied {:?}",
                        id, cmd, index, other, prev
                    ));
                }
            }
        }
    }

    fn apply_entry(&mut self, id: NodeId, index: u64, cmd: String) {
        let last = self.last_applied(id);
        if index != last + 1 {
            self.errors.push(format!(
                "n{} applied {} out of order, last applied: {}",
                id, index, last
            ));
        }

        self.check_agreement(id, index, &cmd);
        self.logs.entry(id).or_default().insert(index, cmd);
        self.last_applied.insert(id, index);
    }

    fn apply_snapshot(
        &mut self,
        id: NodeId,
        last_index: u64,
        log: BTreeMap<u64, String>,
    ) {
        let last = self.last_applied(id);
        if last_index <= last {
            self.errors.push(format!(
                "n{} installed snapshot upto {}, not after last applied: {}",
                id, last_index, last
            ));
        }

        for (index, cmd) in log.iter() {
            self.check_agreement(id, *index, cmd);
        }

        self.logs.insert(id, log);
        self.last_applied.insert(id, last_index);
        self.snapshots.entry(id).or_default().push(last_index);
    }

    fn build_snapshot(&self, id: NodeId) -> Vec<u8> {
        let log = self.logs.get(&id).cloned().unwrap_or_default();
        serde_json::to_vec(&log).unwrap()
    }
}

/// A cluster of [`Raft`] nodes on a [`PseudoNet`], each with a [`MemPersister`]
/// and a state machine that records what is applied.
pub struct Cluster {
    pub config: Arc<Config>,
    pub membership: Membership,
    pub net: PseudoNet<TypeConfig>,

    /// Running nodes.
    nodes: BTreeMap<NodeId, Raft<TypeConfig>>,

    /// Persisters survive crashes.
    persisters: BTreeMap<NodeId, MemPersister>,

    /// Nodes that can not talk to the others.
    isolated: BTreeSet<NodeId>,

    /// A state machine compacts the log every this many applied entries.
    snapshot_every: Option<u64>,

    applied: Arc<Mutex<Applied>>,
}

impl Cluster {
    /// Start a cluster of `n` nodes with ids `0..n`.
    pub fn new(n: u64, snapshot_every: Option<u64>) -> anyhow::Result<Self> {
        let config = test_config()?;
        Self::with_config(n, config, snapshot_every)
    }

    pub fn with_config(
        n: u64,
        config: Arc<Config>,
        snapshot_every: Option<u64>,
    ) -> anyhow::Result<Self> {
        let ids = (0..n).collect::<BTreeSet<NodeId>>();

        let mut cluster = Self {
            config,
            membership: Membership::new(ids.clone()),
            net: PseudoNet::new(),
            nodes: BTreeMap::new(),
            persisters: BTreeMap::new(),
            isolated: BTreeSet::new(),
            snapshot_every,
            applied: Arc::new(Mutex::new(Applied::default())),
        };

        for id in ids {
            cluster.start(id);
        }

        Ok(cluster)
    }

    pub fn ids(&self) -> Vec<NodeId> {
        self.membership.node_ids().collect()
    }

    /// Start, or restart, a node with what its persister saved.
    pub fn start(&mut self, id: NodeId) {
        let persister = self.persisters.entry(id).or_default().clone();

        let (tx_apply, rx_apply) = mpsc::channel(1024);

        let raft = Raft::new(
            id,
            self.config.clone(),
            self.membership.clone(),
            self.net.network_for(id),
            persister,
            tx_apply,
        );

        self.applied.lock().unwrap().reset(id);

        self.net.add_peer(id, raft.clone());
        if self.isolated.contains(&id) {
            self.net.isolate(id);
        }

        tokio::spawn(run_state_machine(
            id,
            raft.clone(),
            rx_apply,
            self.applied.clone(),
            self.snapshot_every,
        ));

        self.nodes.insert(id, raft);
    }

    /// Stop a node. What it has persisted is kept for a restart; anything
    /// it writes after this point is not.
    pub async fn crash(&mut self, id: NodeId) -> anyhow::Result<()> {
        tracing::info!("--- crash n{}", id);

        self.net.remove_peer(id);

        if let Some(raft) = self.nodes.remove(&id) {
            let res = raft.shutdown().await;
            tracing::info!("n{} shutdown: {:?}", id, res);
        }

        if let Some(p) = self.persisters.get(&id) {
            let copied = p.deep_copy();
            self.persisters.insert(id, copied);
        }
        Ok(())
    }

    pub fn isolate(&mut self, id: NodeId) {
        tracing::info!("--- isolate n{}", id);
        self.isolated.insert(id);
        self.net.isolate(id);
    }

    pub fn restore(&mut self, id: NodeId) {
        tracing::info!("--- restore n{}", id);
        self.isolated.remove(&id);
        self.net.restore(id);
    }

    pub fn set_unreliable(&self, unreliable: bool) {
        self.net.set_unreliable(unreliable);
    }

    pub fn raft(&self, id: NodeId) -> anyhow::Result<&Raft<TypeConfig>> {
        self.nodes.get(&id).with_context(|| format!("n{} is not running", id))
    }

    pub fn persister(&self, id: NodeId) -> anyhow::Result<&MemPersister> {
        self.persisters.get(&id).with_context(|| format!("n{} has no persister", id))
    }

    /// Running and connected nodes.
    pub fn connected(&self) -> Vec<NodeId> {
        self.nodes
            .keys()
            .filter(|id| !self.isolated.contains(id))
            .copied()
            .collect()
    }

    /// Return the first error the state machines detected.
    pub fn check_applied(&self) -> anyhow::Result<()> {
        let applied = self.applied.lock().unwrap();
        if let Some(e) = applied.errors.first() {
            bail!("apply error: {}", e);
        }
        Ok(())
    }

    pub fn last_applied(&self, id: NodeId) -> u64 {
        self.applied.lock().unwrap().last_applied(id)
    }

    pub fn applied_at(&self, id: NodeId, index: u64) -> Option<String> {
        let applied = self.applied.lock().unwrap();
        applied.logs.get(&id).and_then(|log| log.get(&index).cloned())
    }

    pub fn snapshots_installed(&self, id: NodeId) -> Vec<u64> {
        let applied = self.applied.lock().unwrap();
        applied.snapshots.get(&id).cloned().unwrap_or_default()
    }

    /// How many running nodes applied `index`, and what they applied.
    pub fn n_committed(&self, index: u64) -> anyhow::Result<(usize, Option<String>)> {
        self.check_applied()?;

        let applied = self.applied.lock().unwrap();
        let mut count = 0;
        let mut cmd: Option<String> = None;

        for id in self.nodes.keys() {
            let Some(got) = applied.logs.get(id).and_then(|l| l.get(&index)) else {
                continue;
            };

            if let Some(c) = &cmd {
                if c != got {
                    bail!("committed values do not match: index {}, {:?}, {:?}", index, c, got);
                }
            }
            count += 1;
            cmd = Some(got.clone());
        }

        Ok((count, cmd))
    }

    /// Check that exactly one connected node believes it is the leader of the
    /// latest term, and return it.
    ///
    /// Retry for a while: an election may be in progress.
    pub async fn check_one_leader(&self) -> anyhow::Result<NodeId> {
        for _ in 0..10 {
            sleep(Duration::from_millis(450 + rand_ms(100))).await;

            let mut leaders: BTreeMap<u64, Vec<NodeId>> = BTreeMap::new();

            for id in self.connected() {
                let (term, is_leader) = self.raft(id)?.get_state().await?;
                if is_leader {
                    leaders.entry(term).or_default().push(id);
                }
            }

            for (term, ids) in leaders.iter() {
                if ids.len() > 1 {
                    bail!("term {} has {} leaders: {:?}", term, ids.len(), ids);
                }
            }

            if let Some((_term, ids)) = leaders.last_key_value() {
                return Ok(ids[0]);
            }
        }

        bail!("expected one leader, got none")
    }

    /// Check that no connected node believes it is the leader.
    pub async fn check_no_leader(&self) -> anyhow::Result<()> {
        for id in self.connected() {
            let (_term, is_leader) = self.raft(id)?.get_state().await?;
            if is_leader {
                bail!("expected no leader among connected nodes, but n{} claims to be", id);
            }
        }
        Ok(())
    }

    /// Check that every connected node is in the same term, and return it.
    pub async fn check_terms(&self) -> anyhow::Result<u64> {
        let mut term = None;

        for id in self.connected() {
            let (t, _) = self.raft(id)?.get_state().await?;
            match term {
                None => term = Some(t),
                Some(prev) if prev != t => {
                    bail!("nodes disagree on term: {} and {}", prev, t);
                }
                _ => {}
            }
        }

        term.context("no connected node")
    }

    /// Submit `cmd` and wait for it to be applied by at least `expected`
    /// nodes, return its index.
    ///
    /// The command is submitted to every connected node in turn until a leader
    /// accepts it. If `retry` is false the command is not submitted again when
    /// it is not committed in time; a retried command may be committed twice.
    pub async fn one(
        &self,
        cmd: impl ToString,
        expected: usize,
        retry: bool,
    ) -> anyhow::Result<u64> {
        let cmd = cmd.to_string();
        let deadline = Instant::now() + Duration::from_secs(10);

        while Instant::now() < deadline {
            let mut index = None;

            for id in self.connected() {
                // A node shut down by the test itself replies `Fatal`.
                let res = self.raft(id)?.submit(cmd.clone()).await;
                if let Ok(Ok(log_id)) = res {
                    index = Some(log_id.index);
                    break;
                }
            }

            if let Some(index) = index {
                let wait_until = Instant::now() + Duration::from_secs(2);

                while Instant::now() < wait_until {
                    let (n, got) = self.n_committed(index)?;
                    if n >= expected && got.as_ref() == Some(&cmd) {
                        return Ok(index);
                    }
                    sleep(Duration::from_millis(20)).await;
                }

                if !retry {
                    bail!("one({:?}) failed to reach agreement", cmd);
                }
            } else {
                sleep(Duration::from_millis(50)).await;
            }
        }

        bail!("one({:?}) failed to reach agreement in 10 seconds", cmd)
    }

    /// Wait for at least `n` nodes to apply `index`, return what is applied.
    ///
    /// Give up with `None` if a node moves to a term after `start_term`: the
    /// entry may never be committed.
    pub async fn wait_committed(
        &self,
        index: u64,
        n: usize,
        start_term: Option<u64>,
    ) -> anyhow::Result<Option<String>> {
        let mut to = Duration::from_millis(10);

        for _ in 0..30 {
            let (count, _) = self.n_committed(index)?;
            if count >= n {
                break;
            }

            sleep(to).await;
            if to < Duration::from_secs(1) {
                to *= 2;
            }

            if let Some(start_term) = start_term {
                for id in self.nodes.keys() {
                    let (t, _) = self.raft(*id)?.get_state().await?;
                    if t > start_term {
                        return Ok(None);
                    }
                }
            }
        }

        let (count, cmd) = self.n_committed(index)?;
        if count < n {
            bail!("only {} nodes applied {}, wanted {}", count, index, n);
        }
        Ok(cmd)
    }

    /// Shutdown every running node and check the apply history.
    pub async fn shutdown(&mut self) -> anyhow::Result<()> {
        for id in self.nodes.keys().copied().collect::<Vec<_>>() {
            self.crash(id).await?;
        }
        self.check_applied()
    }
}

/// The state machine of a node: record what is applied and compact the log
/// every `snapshot_every` entries.
async fn run_state_machine(
    id: NodeId,
    raft: Raft<TypeConfig>,
    mut rx: mpsc::Receiver<ApplyMessage<TypeConfig>>,
    applied: Arc<Mutex<Applied>>,
    snapshot_every: Option<u64>,
) {
    while let Some(msg) = rx.recv().await {
        tracing::debug!("n{} apply: {}", id, msg);

        let snapshot = {
            let mut a = applied.lock().unwrap();

            match msg {
                ApplyMessage::Entry { log_id, command } => {
                    a.apply_entry(id, log_id.index, command);

                    let last = a.last_applied(id);
                    match snapshot_every {
                        Some(n) if last % n == 0 => Some((last, a.build_snapshot(id))),
                        _ => None,
                    }
                }
                ApplyMessage::Snapshot { last_log_id, data } => {
                    match serde_json::from_slice::<BTreeMap<u64, String>>(&data) {
                        Ok(log) => a.apply_snapshot(id, last_log_id.index, log),
                        Err(e) => a.errors.push(format!("n{} bad snapshot: {}", id, e)),
                    }
                    None
                }
            }
        };

        if let Some((upto, data)) = snapshot {
            match raft.request_snapshot(upto, data).await {
                Ok(res) => {
                    tracing::info!("n{} compact log upto {}: {:?}", id, upto, res);
                }
                Err(fatal) => {
                    tracing::info!("n{} stopped: {}", id, fatal);
                    break;
                }
            }
        }
    }
}

pub fn rand_ms(max: u64) -> u64 {
    use rand::Rng;
    rand::thread_rng().gen_range(0..max)
}
