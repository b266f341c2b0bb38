use std::io;

use crate::storage::log::entry::Entry;
use crate::storage::log::log_id::LogId;
use crate::storage::vote::Vote;
use crate::TypeConfig;

/// The Raft state blob a [`Persister`](crate::Persister) stores: the vote,
/// the snapshot watermark and the entries after it.
#[derive(Debug, Clone)]
#[derive(serde::Deserialize, serde::Serialize)]
#[serde(bound = "")]
pub struct PersistentState<C>
where C: TypeConfig
{
    pub vote: Vote,
    pub snapshot_last: Option<LogId>,
    pub entries: Vec<Entry<C>>,
}

impl<C> Default for PersistentState<C>
where C: TypeConfig
{
    fn default() -> Self {
        Self {
            vote: Vote::default(),
            snapshot_last: None,
            entries: vec![],
        }
    }
}

impl<C> PersistentState<C>
where C: TypeConfig
{
    /// Decode the state blob written by [`PersistentStateRef::encode`].
    pub fn decode(buf: &[u8]) -> Result<Self, io::Error> {
        serde_json::from_slice(buf)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

/// A borrowed view of the persistent state, so that saving does not clone the
/// log.
#[derive(serde::Serialize)]
#[serde(bound = "")]
pub(crate) struct PersistentStateRef<'a, C>
where C: TypeConfig
{
    pub(crate) vote: &'a Vote,
    pub(crate) snapshot_last: Option<LogId>,
    pub(crate) entries: &'a [Entry<C>],
}

impl<C> PersistentStateRef<'_, C>
where C: TypeConfig
{
    pub(crate) fn encode(&self) -> Result<Vec<u8>, io::Error> {
        serde_json::to_vec(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}
