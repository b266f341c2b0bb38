use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use crate::core::io::notification::Notification;
use crate::core::roles::leader::Leader;
use crate::network::connection::Connection;
use crate::raft::AppendEntries;
use crate::raft::InstallSnapshot;
use crate::storage::membership::NodeId;
use crate::storage::raft_log::RaftLog;
use crate::storage::snapshot::Snapshot;
use crate::Config;
use crate::Network;
use crate::Node;
use crate::TypeConfig;

/// Handle leader operations: replicate log entries or the snapshot to every
/// follower.
///
/// Each RPC runs in its own task; the reply comes back to Core as a
/// [`Notification`].
pub(crate) struct LeaderHandler<'x, C, Net>
where
    C: TypeConfig,
    Net: Network<C>,
{
    pub(crate) config: &'x Config,
    pub(crate) network: &'x mut Net,
    pub(crate) tx_notification: mpsc::UnboundedSender<Notification>,
    pub(crate) leader: &'x mut Leader,
    pub(crate) log: &'x RaftLog<C>,
    pub(crate) snapshot: Option<&'x Snapshot>,
    pub(crate) commit_index: u64,
}

impl<C, Net> LeaderHandler<'_, C, Net>
where
    C: TypeConfig,
    Net: Network<C>,
{
    /// Send AppendEntries, or InstallSnapshot to a lagging follower, to every
    /// other node.
    ///
    /// With nothing new to send, the AppendEntries is a heartbeat.
    #[tracing::instrument(level = "debug", skip_all)]
    pub(crate) async fn broadcast_replication(&mut self) {
        for (target, node) in self.leader.membership.clone().nodes() {
            if *target == self.leader.id {
                continue;
            }
            self.replicate_to(*target, node).await;
        }
    }

    pub(crate) async fn replicate_to(&mut self, target: NodeId, node: &Node) {
        let next_index = self.leader.next_index(&target);

        if next_index < self.log.first_index() {
            self.send_snapshot(target, node).await;
        } else {
            self.send_append_entries(target, node, next_index).await;
        }
    }

    async fn send_append_entries(
        &mut self,
        target: NodeId,
        node: &Node,
        next_index: u64,
    ) {
        let leader_id = self.leader.id;
        let sender_term = self.leader.term;

        let prev_log_id = self.log.log_id_at(next_index - 1);
        let entries =
            self.log.slice(next_index, self.config.max_payload_entries);

        let rpc = AppendEntries::<C> {
            term: sender_term,
            leader_id,
            prev_log_id,
            entries,
            leader_commit: self.commit_index,
        };
        let last_index = rpc.last_index();

        let timeout = Duration::from_millis(self.config.election_timeout_min);

        let mut connection = self.network.new_connection(target, node).await;
        let tx = self.tx_notification.clone();

        let fu = async move {
            let summary = rpc.to_string();
            let res =
                tokio::time::timeout(timeout, connection.append_entries(rpc))
                    .await;

            debug!(
                "id={} sent AppendEntries to {}: {}, result: {:?}",
                leader_id, target, summary, res
            );

            let reply = match res {
                Ok(Ok(reply)) => reply,
                Ok(Err(e)) => {
                    tracing::warn!(
                        "id={} failed to send AppendEntries to {}: {}",
                        leader_id,
                        target,
                        e
                    );
                    return;
                }
                Err(_elapsed) => {
                    tracing::warn!(
                        "id={} timeout sending AppendEntries to {}",
                        leader_id,
                        target
                    );
                    return;
                }
            };

            let _ = tx.send(Notification::AppendEntriesReply {
                target,
                reply,
                sender_term,
                last_index,
            });
        };

        // False positive lint warning(`non-binding `let` on a future`): https://github.com/rust-lang/rust-clippy/issues/9932
        #[allow(clippy::let_underscore_future)]
        let _ = tokio::spawn(fu);
    }

    async fn send_snapshot(&mut self, target: NodeId, node: &Node) {
        let Some(snapshot) = self.snapshot else {
            tracing::error!(
                "id={} no snapshot to send to {}, while the log is compacted upto {}",
                self.leader.id,
                target,
                self.log.first_index() - 1
            );
            return;
        };

        let Some(snapshot_last) = snapshot.last_log_id() else {
            return;
        };

        let leader_id = self.leader.id;
        let sender_term = self.leader.term;

        let rpc = InstallSnapshot {
            term: sender_term,
            leader_id,
            meta: snapshot.meta,
            data: snapshot.data.clone(),
        };

        let timeout = self.config.install_snapshot_timeout();

        let mut connection = self.network.new_connection(target, node).await;
        let tx = self.tx_notification.clone();

        let fu = async move {
            let res =
                tokio::time::timeout(timeout, connection.install_snapshot(rpc))
                    .await;

            debug!(
                "id={} sent InstallSnapshot {} to {}, result: {:?}",
                leader_id, snapshot_last, target, res
            );

            let Ok(Ok(reply)) = res else {
                tracing::warn!(
                    "id={} failed to send InstallSnapshot to {}: {:?}",
                    leader_id,
                    target,
                    res
                );
                return;
            };

            let _ = tx.send(Notification::InstallSnapshotReply {
                target,
                reply,
                sender_term,
                snapshot_last,
            });
        };

        #[allow(clippy::let_underscore_future)]
        let _ = tokio::spawn(fu);
    }
}
