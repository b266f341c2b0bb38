use std::io::Error;
use std::sync::Arc;
use std::sync::Mutex;

use quorumlog::storage::Persister;
use tracing::debug;

#[derive(Debug, Clone, Default)]
struct Stored {
    state: Option<Vec<u8>>,
    snapshot: Option<Vec<u8>>,
}

/// An in-memory persister implementing the [`Persister`] trait.
///
/// Clones share the same storage, so a node can be restarted with a clone of
/// the persister it was shut down with.
#[derive(Debug, Clone, Default)]
pub struct MemPersister {
    stored: Arc<Mutex<Stored>>,
}

impl MemPersister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return an independent copy of the stored data.
    ///
    /// Writes to the returned persister are not seen by `self`, nor the other
    /// way around.
    pub fn deep_copy(&self) -> Self {
        let stored = self.stored.lock().unwrap().clone();
        Self {
            stored: Arc::new(Mutex::new(stored)),
        }
    }

    /// Size in bytes of the persisted state blob.
    pub fn state_size(&self) -> usize {
        let stored = self.stored.lock().unwrap();
        stored.state.as_ref().map(|x| x.len()).unwrap_or_default()
    }

    /// Size in bytes of the persisted snapshot.
    pub fn snapshot_size(&self) -> usize {
        let stored = self.stored.lock().unwrap();
        stored.snapshot.as_ref().map(|x| x.len()).unwrap_or_default()
    }
}

impl Persister for MemPersister {
    async fn save(
        &mut self,
        state: Vec<u8>,
        snapshot: Option<Vec<u8>>,
    ) -> Result<(), Error> {
        debug!(
            "MemPersister::save: state: {} bytes, snapshot: {:?} bytes",
            state.len(),
            snapshot.as_ref().map(|x| x.len())
        );

        let mut stored = self.stored.lock().unwrap();
        stored.state = Some(state);
        if let Some(snapshot) = snapshot {
            stored.snapshot = Some(snapshot);
        }
        Ok(())
    }

    async fn read_state(&mut self) -> Result<Option<Vec<u8>>, Error> {
        let stored = self.stored.lock().unwrap();
        let got = stored.state.clone();

        debug!(
            "MemPersister::read_state: got {:?} bytes",
            got.as_ref().map(|x| x.len())
        );
        Ok(got)
    }

    async fn read_snapshot(&mut self) -> Result<Option<Vec<u8>>, Error> {
        let stored = self.stored.lock().unwrap();
        let got = stored.snapshot.clone();

        debug!(
            "MemPersister::read_snapshot: got {:?} bytes",
            got.as_ref().map(|x| x.len())
        );
        Ok(got)
    }
}
