//! An in-process network connecting [`Raft`] nodes by direct calls.
//!
//! Nodes can be isolated from the others, crashed by removing them, and the
//! whole network can be made unreliable: requests and replies are delayed and
//! randomly dropped.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use quorumlog::errors::Fatal;
use quorumlog::errors::NetworkError;
use quorumlog::network::connection::Connection;
use quorumlog::raft::AppendEntries;
use quorumlog::raft::AppendEntriesReply;
use quorumlog::raft::InstallSnapshot;
use quorumlog::raft::InstallSnapshotReply;
use quorumlog::raft::RequestVote;
use quorumlog::raft::VoteReply;
use quorumlog::Network;
use quorumlog::Node;
use quorumlog::NodeId;
use quorumlog::Raft;
use quorumlog::TypeConfig;
use rand::Rng;
use tracing::debug;

/// Why a message is not delivered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PseudoNetError {
    #[error("node {0} is not reachable")]
    Unreachable(NodeId),

    #[error("node {0} is isolated")]
    Isolated(NodeId),

    #[error("message {from}->{to} is dropped")]
    Dropped { from: NodeId, to: NodeId },
}

struct Router<C>
where C: TypeConfig
{
    peers: BTreeMap<NodeId, Raft<C>>,
    isolated: BTreeSet<NodeId>,
    unreliable: bool,
}

impl<C> Default for Router<C>
where C: TypeConfig
{
    fn default() -> Self {
        Self {
            peers: BTreeMap::new(),
            isolated: BTreeSet::new(),
            unreliable: false,
        }
    }
}

/// The shared routing table of all nodes in a test cluster.
#[derive(Clone)]
pub struct PseudoNet<C>
where C: TypeConfig
{
    router: Arc<Mutex<Router<C>>>,
}

impl<C> Default for PseudoNet<C>
where C: TypeConfig
{
    fn default() -> Self {
        Self {
            router: Arc::new(Mutex::new(Router::default())),
        }
    }
}

impl<C> PseudoNet<C>
where C: TypeConfig
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the [`Network`] a node uses to send RPCs.
    pub fn network_for(&self, id: NodeId) -> DirectNetwork<C> {
        DirectNetwork {
            id,
            net: self.clone(),
        }
    }

    /// Make a node reachable, replacing the previous instance of it.
    pub fn add_peer(&self, id: NodeId, raft: Raft<C>) {
        let mut router = self.router.lock().unwrap();
        router.peers.insert(id, raft);
    }

    /// Make a node unreachable, e.g., when it is crashed.
    pub fn remove_peer(&self, id: NodeId) -> Option<Raft<C>> {
        let mut router = self.router.lock().unwrap();
        router.peers.remove(&id)
    }

    pub fn get_peer(&self, id: NodeId) -> Option<Raft<C>> {
        let router = self.router.lock().unwrap();
        router.peers.get(&id).cloned()
    }

    /// Drop every message from or to a node.
    pub fn isolate(&self, id: NodeId) {
        debug!("isolate node {}", id);
        let mut router = self.router.lock().unwrap();
        router.isolated.insert(id);
    }

    /// Connect an isolated node back.
    pub fn restore(&self, id: NodeId) {
        debug!("restore node {}", id);
        let mut router = self.router.lock().unwrap();
        router.isolated.remove(&id);
    }

    pub fn is_isolated(&self, id: NodeId) -> bool {
        let router = self.router.lock().unwrap();
        router.isolated.contains(&id)
    }

    /// Delay every message and drop some of them at random.
    pub fn set_unreliable(&self, unreliable: bool) {
        let mut router = self.router.lock().unwrap();
        router.unreliable = unreliable;
    }

    fn route(
        &self,
        from: NodeId,
        to: NodeId,
    ) -> Result<(Raft<C>, bool), PseudoNetError> {
        let router = self.router.lock().unwrap();

        for id in [from, to] {
            if router.isolated.contains(&id) {
                return Err(PseudoNetError::Isolated(id));
            }
        }

        // A crashed sender can not send anything.
        if !router.peers.contains_key(&from) {
            return Err(PseudoNetError::Unreachable(from));
        }

        let raft = router
            .peers
            .get(&to)
            .cloned()
            .ok_or(PseudoNetError::Unreachable(to))?;

        Ok((raft, router.unreliable))
    }

    /// Deliver a request to `to` and bring back the reply.
    ///
    /// The reply is lost too if either end is disconnected while the request
    /// is being handled.
    async fn send<T, F, Fu>(
        &self,
        from: NodeId,
        to: NodeId,
        f: F,
    ) -> Result<T, NetworkError>
    where
        F: FnOnce(Raft<C>) -> Fu,
        Fu: Future<Output = Result<T, Fatal>>,
    {
        let (raft, unreliable) =
            self.route(from, to).map_err(|e| NetworkError::new(&e))?;

        if unreliable {
            let (delay, drop_it) = {
                let mut rng = rand::thread_rng();
                (rng.gen_range(0..27), rng.gen_bool(0.1))
            };
            tokio::time::sleep(Duration::from_millis(delay)).await;

            if drop_it {
                let e = PseudoNetError::Dropped { from, to };
                return Err(NetworkError::new(&e));
            }
        }

        let reply = f(raft).await.map_err(|e| NetworkError::new(&e))?;

        let (_, unreliable) =
            self.route(from, to).map_err(|e| NetworkError::new(&e))?;

        if unreliable && rand::thread_rng().gen_bool(0.1) {
            let e = PseudoNetError::Dropped { from: to, to: from };
            return Err(NetworkError::new(&e));
        }

        Ok(reply)
    }
}

/// The [`Network`] of a single node in a [`PseudoNet`].
#[derive(Clone)]
pub struct DirectNetwork<C>
where C: TypeConfig
{
    id: NodeId,
    net: PseudoNet<C>,
}

impl<C> Network<C> for DirectNetwork<C>
where C: TypeConfig
{
    type Connection = Conn<C>;

    async fn new_connection(
        &mut self,
        target: NodeId,
        _node: &Node,
    ) -> Self::Connection {
        Conn {
            from: self.id,
            target,
            net: self.net.clone(),
        }
    }
}

pub struct Conn<C>
where C: TypeConfig
{
    from: NodeId,
    target: NodeId,
    net: PseudoNet<C>,
}

impl<C> Connection<C> for Conn<C>
where C: TypeConfig
{
    async fn request_vote(
        &mut self,
        rpc: RequestVote,
    ) -> Result<VoteReply, NetworkError> {
        self.net
            .send(self.from, self.target, |raft| async move {
                raft.handle_request_vote(rpc).await
            })
            .await
    }

    async fn append_entries(
        &mut self,
        rpc: AppendEntries<C>,
    ) -> Result<AppendEntriesReply, NetworkError> {
        self.net
            .send(self.from, self.target, |raft| async move {
                raft.handle_append_entries(rpc).await
            })
            .await
    }

    async fn install_snapshot(
        &mut self,
        rpc: InstallSnapshot,
    ) -> Result<InstallSnapshotReply, NetworkError> {
        self.net
            .send(self.from, self.target, |raft| async move {
                raft.handle_install_snapshot(rpc).await
            })
            .await
    }
}
