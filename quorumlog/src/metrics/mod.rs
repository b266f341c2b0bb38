//! quorumlog metrics for observability.
//!
//! Metrics are observed on a running Raft node via the [`Raft::metrics() ->
//! watch::Receiver<Metrics>`](`crate::Raft::metrics`) method, which will
//! return a stream of metrics.
//!
//! [`Metrics`] contains useful information such as:
//!
//! - Server state(leader/follower/candidate) of this raft node,
//! - The current term and leader,
//! - Last log, committed and applied log index,
//! - Replication state, if this node is a Leader,
//! - Snapshot state.
//!
//! Metrics is not a stream thus it only guarantees to provide the latest state
//! but not every change of the state.
//! Because internally, `watch::channel()` only stores one last state.

mod metric;
#[allow(clippy::module_inception)]
mod metrics;
mod wait;

mod server_state;
mod wait_condition;

pub use metric::Metric;
pub use metrics::Metrics;
pub use metrics::ReplicationMetrics;
pub use server_state::ServerState;
pub use wait::Wait;
pub use wait::WaitError;
pub(crate) use wait_condition::Condition;
