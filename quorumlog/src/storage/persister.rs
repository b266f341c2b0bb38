//! Defines the [`Persister`] trait: the durable byte store of a node.

use std::io;

use openraft_macros::add_async_trait;

/// API for the durable store of a Raft node.
///
/// A `Persister` keeps two opaque blobs: the Raft state (vote and log) and
/// the latest snapshot. `quorumlog` decides what is inside the blobs; the
/// persister only has to keep them durable.
///
/// ### To ensure correctness:
///
/// - [`save`](Self::save) must be atomic: after a crash, a reader sees either
///   the previous pair of blobs or the new pair, never a mix of both.
/// - A `save()` must be durable when it returns: Raft replies to other peers
///   right after it.
#[add_async_trait]
pub trait Persister: Send + Sync + 'static {
    /// Atomically replace the Raft state, and the snapshot if one is given.
    ///
    /// `snapshot == None` leaves the stored snapshot untouched.
    async fn save(
        &mut self,
        state: Vec<u8>,
        snapshot: Option<Vec<u8>>,
    ) -> Result<(), io::Error>;

    /// Read the last saved Raft state, `None` if nothing has been saved.
    async fn read_state(&mut self) -> Result<Option<Vec<u8>>, io::Error>;

    /// Read the last saved snapshot, `None` if no snapshot has been saved.
    async fn read_snapshot(&mut self) -> Result<Option<Vec<u8>>, io::Error>;
}
