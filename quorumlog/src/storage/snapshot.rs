use std::fmt;

use crate::base::display_ext::DisplayOptionExt;
use crate::storage::log::log_id::LogId;

/// The metadata of a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[derive(serde::Deserialize, serde::Serialize)]
pub struct SnapshotMeta {
    /// The last log id included in the snapshot, i.e., the snapshot
    /// watermark.
    pub last_log_id: Option<LogId>,
}

impl fmt::Display for SnapshotMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{last_log_id:{}}}", self.last_log_id.display())
    }
}

/// A compacted prefix of the log: the application state up to and including
/// `meta.last_log_id`, as opaque bytes produced by the application.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub meta: SnapshotMeta,
    pub data: Vec<u8>,
}

impl Snapshot {
    pub fn new(last_log_id: LogId, data: Vec<u8>) -> Self {
        Self {
            meta: SnapshotMeta {
                last_log_id: Some(last_log_id),
            },
            data,
        }
    }

    pub fn last_log_id(&self) -> Option<LogId> {
        self.meta.last_log_id
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Snapshot{{meta:{}, size:{}}}", self.meta, self.data.len())
    }
}
