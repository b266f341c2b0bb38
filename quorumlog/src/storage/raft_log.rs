//! The in-memory log of a node: the snapshot watermark followed by the
//! entries that have not been compacted.

use std::fmt;

use crate::base::display_ext::DisplayOptionExt;
use crate::raft::ConflictHint;
use crate::storage::log::entry::Entry;
use crate::storage::log::log_id::LogId;
use crate::storage::log::log_id::LogIdOptionExt;
use crate::TypeConfig;

/// The log of a Raft node.
///
/// The logical log is `snapshot_last` (the last log id covered by the
/// snapshot, if any) followed by `entries`. Entry indexes are 1-based and
/// contiguous: `entries[i].log_id.index == snapshot_last.next_index() + i`.
pub(crate) struct RaftLog<C>
where C: TypeConfig
{
    snapshot_last: Option<LogId>,
    entries: Vec<Entry<C>>,
}

impl<C> Default for RaftLog<C>
where C: TypeConfig
{
    fn default() -> Self {
        Self {
            snapshot_last: None,
            entries: vec![],
        }
    }
}

impl<C> fmt::Display for RaftLog<C>
where C: TypeConfig
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RaftLog{{snapshot_last:{}, entries:[{}, {}]}}",
            self.snapshot_last.display(),
            self.first_index(),
            self.last_index()
        )
    }
}

impl<C> RaftLog<C>
where C: TypeConfig
{
    pub(crate) fn new(
        snapshot_last: Option<LogId>,
        entries: Vec<Entry<C>>,
    ) -> Self {
        let log = Self {
            snapshot_last,
            entries,
        };
        log.assert_contiguous();
        log
    }

    pub(crate) fn snapshot_last(&self) -> Option<LogId> {
        self.snapshot_last
    }

    pub(crate) fn entries(&self) -> &[Entry<C>] {
        &self.entries
    }

    pub(crate) fn last_log_id(&self) -> Option<LogId> {
        match self.entries.last() {
            Some(ent) => Some(ent.log_id),
            None => self.snapshot_last,
        }
    }

    /// The index of the last entry, or of the watermark; 0 for an empty log.
    pub(crate) fn last_index(&self) -> u64 {
        self.last_log_id().index_or_zero()
    }

    /// The index of the first entry that is not compacted.
    pub(crate) fn first_index(&self) -> u64 {
        self.snapshot_last.next_index()
    }

    /// Get the entry at `index`, `None` if it is compacted or absent.
    pub(crate) fn get(&self, index: u64) -> Option<&Entry<C>> {
        let first = self.first_index();
        if index < first {
            return None;
        }
        self.entries.get((index - first) as usize)
    }

    /// Get the log id at `index`, including the watermark itself.
    pub(crate) fn log_id_at(&self, index: u64) -> Option<LogId> {
        if let Some(last) = self.snapshot_last {
            if last.index == index {
                return Some(last);
            }
        }
        self.get(index).map(|ent| ent.log_id)
    }

    /// Returns `true` if the log contains `log_id`.
    ///
    /// `None` is the log id before the first entry and is always contained.
    /// A log id at or below the watermark is contained: only committed
    /// entries are compacted, and committed entries are the same on every
    /// node.
    pub(crate) fn has_log_id(&self, log_id: Option<&LogId>) -> bool {
        let Some(log_id) = log_id else {
            return true;
        };

        if log_id.index < self.snapshot_last.index_or_zero() {
            return true;
        }

        self.log_id_at(log_id.index) == Some(*log_id)
    }

    /// Clone at most `max` entries starting from `start`.
    pub(crate) fn slice(&self, start: u64, max: u64) -> Vec<Entry<C>> {
        let first = self.first_index();
        debug_assert!(start >= first, "start {} < first {}", start, first);

        let offset = (start - first) as usize;
        let end = std::cmp::min(self.entries.len(), offset + max as usize);
        if offset >= end {
            return vec![];
        }
        self.entries[offset..end].to_vec()
    }

    /// Append an entry right after the last one.
    pub(crate) fn append(&mut self, entry: Entry<C>) {
        debug_assert_eq!(
            entry.log_id.index,
            self.last_index() + 1,
            "entry {} is not contiguous with {}",
            entry.log_id,
            self
        );
        self.entries.push(entry);
    }

    /// Delete every entry whose index is `>= index`.
    pub(crate) fn truncate_from(&mut self, index: u64) {
        let first = self.first_index();
        assert!(
            index >= first,
            "can not truncate compacted entries: {} < {}",
            index,
            first
        );
        self.entries.truncate((index - first) as usize);
    }

    /// Merge entries sent by the leader after a matching `prev_log_id`.
    ///
    /// Entries already present with the same term are kept, the first
    /// conflicting entry and everything after it are truncated, and the rest
    /// are appended. Entries at or below the watermark are ignored.
    ///
    /// Returns `true` if the log is changed.
    pub(crate) fn merge(&mut self, entries: Vec<Entry<C>>) -> bool {
        let mut changed = false;

        for ent in entries {
            let index = ent.log_id.index;
            if index < self.first_index() {
                continue;
            }

            match self.log_id_at(index) {
                Some(existing) if existing == ent.log_id => {
                    continue;
                }
                Some(existing) => {
                    tracing::info!(
                        "truncate conflicting log from {}: existing {}, leader {}",
                        index,
                        existing,
                        ent.log_id
                    );
                    self.truncate_from(index);
                    self.append(ent);
                    changed = true;
                }
                None => {
                    self.append(ent);
                    changed = true;
                }
            }
        }

        changed
    }

    /// Build a hint for the leader after `prev_log_id` was not found.
    ///
    /// If the log is too short, the hint points right after the last entry.
    /// Otherwise it carries the conflicting term and the first index of
    /// that term in this log.
    pub(crate) fn conflict_hint(&self, prev_log_id: &LogId) -> ConflictHint {
        let last_index = self.last_index();

        if prev_log_id.index > last_index {
            return ConflictHint {
                index: last_index + 1,
                term: None,
            };
        }

        // has_log_id() returned false, thus prev_log_id.index is not compacted.
        let Some(conflict) = self.log_id_at(prev_log_id.index) else {
            return ConflictHint {
                index: self.first_index(),
                term: None,
            };
        };

        let mut index = conflict.index;
        while index > self.first_index() {
            match self.log_id_at(index - 1) {
                Some(l) if l.term == conflict.term => index -= 1,
                _ => break,
            }
        }

        ConflictHint {
            index,
            term: Some(conflict.term),
        }
    }

    /// The index of the last entry with `term`, `None` if this log has no
    /// entry in that term.
    pub(crate) fn last_index_of_term(&self, term: u64) -> Option<u64> {
        if let Some(ent) =
            self.entries.iter().rev().find(|ent| ent.log_id.term == term)
        {
            return Some(ent.log_id.index);
        }

        match self.snapshot_last {
            Some(last) if last.term == term => Some(last.index),
            _ => None,
        }
    }

    /// Compact every entry up to and including `upto` into the watermark.
    pub(crate) fn purge_upto(&mut self, upto: LogId) {
        let first = self.first_index();
        assert!(upto.index >= first, "{} is already purged", upto);
        debug_assert_eq!(self.log_id_at(upto.index), Some(upto));

        let n = (upto.index - first + 1) as usize;
        self.entries.drain(..n);
        self.snapshot_last = Some(upto);
    }

    /// Install a snapshot received from the leader.
    ///
    /// If this log has the snapshot's last log id, the suffix after it is
    /// kept. Otherwise the whole log is discarded.
    pub(crate) fn install_snapshot(&mut self, last: LogId) {
        if self.log_id_at(last.index) == Some(last)
            && last.index >= self.first_index()
        {
            self.purge_upto(last);
            return;
        }

        self.entries.clear();
        self.snapshot_last = Some(last);
    }

    fn assert_contiguous(&self) {
        let mut expected = self.first_index();
        for ent in self.entries.iter() {
            assert_eq!(
                expected, ent.log_id.index,
                "log is not contiguous at {}",
                ent.log_id
            );
            expected += 1;
        }
    }
}
