//! The quorumlog storage interface and data types.

pub mod log;
pub mod membership;
mod persistent_state;
mod persister;
pub(crate) mod raft_log;
pub mod snapshot;
pub mod vote;

pub use self::persistent_state::PersistentState;
pub(crate) use self::persistent_state::PersistentStateRef;
pub use self::persister::Persister;
pub use self::snapshot::Snapshot;
pub use self::snapshot::SnapshotMeta;
