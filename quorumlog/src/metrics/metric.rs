use std::cmp::Ordering;

use crate::storage::log::log_id::LogId;
use crate::Metrics;

/// A metric entry of a Raft node.
///
/// This is used to specify which metric to observe.
#[derive(Debug)]
pub enum Metric {
    Term(u64),
    LastLogIndex(u64),
    CommitIndex(u64),
    AppliedIndex(u64),
    Snapshot(Option<LogId>),
}

impl Metric {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Metric::Term(_) => "term",
            Metric::LastLogIndex(_) => "last_log_index",
            Metric::CommitIndex(_) => "commit_index",
            Metric::AppliedIndex(_) => "last_applied",
            Metric::Snapshot(_) => "snapshot",
        }
    }
}

/// Metric can be compared with Metrics by comparing the corresponding field
/// of Metrics.
impl PartialEq<Metric> for Metrics {
    fn eq(&self, other: &Metric) -> bool {
        match other {
            Metric::Term(v) => self.current_term == *v,
            Metric::LastLogIndex(v) => self.last_log_index == *v,
            Metric::CommitIndex(v) => self.commit_index == *v,
            Metric::AppliedIndex(v) => self.last_applied == *v,
            Metric::Snapshot(v) => &self.snapshot == v,
        }
    }
}

/// Metric can be compared with Metrics by comparing the corresponding field
/// of Metrics.
impl PartialOrd<Metric> for Metrics {
    fn partial_cmp(&self, other: &Metric) -> Option<Ordering> {
        match other {
            Metric::Term(v) => Some(self.current_term.cmp(v)),
            Metric::LastLogIndex(v) => Some(self.last_log_index.cmp(v)),
            Metric::CommitIndex(v) => Some(self.commit_index.cmp(v)),
            Metric::AppliedIndex(v) => Some(self.last_applied.cmp(v)),
            Metric::Snapshot(v) => Some(self.snapshot.cmp(v)),
        }
    }
}
