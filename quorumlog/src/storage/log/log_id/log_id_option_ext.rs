use crate::storage::log::log_id::LogId;

/// This helper trait extracts information from an `Option<LogId>`.
///
/// `None` stands for "no log at all", i.e., the position before index 1.
pub trait LogIdOptionExt {
    /// Returns the log index if it is not a `None`.
    fn index(&self) -> Option<u64>;

    /// Returns the log index, or 0 if it is `None`.
    fn index_or_zero(&self) -> u64;

    /// Returns the log term, or 0 if it is `None`.
    fn term_or_zero(&self) -> u64;

    /// Returns the next log index.
    ///
    /// If self is `None`, it returns 1, the index of the first log entry.
    fn next_index(&self) -> u64;
}

impl LogIdOptionExt for LogId {
    fn index(&self) -> Option<u64> {
        Some(self.index)
    }

    fn index_or_zero(&self) -> u64 {
        self.index
    }

    fn term_or_zero(&self) -> u64 {
        self.term
    }

    fn next_index(&self) -> u64 {
        self.index + 1
    }
}

impl<T> LogIdOptionExt for &T
where T: LogIdOptionExt
{
    fn index(&self) -> Option<u64> {
        LogIdOptionExt::index(*self)
    }

    fn index_or_zero(&self) -> u64 {
        LogIdOptionExt::index_or_zero(*self)
    }

    fn term_or_zero(&self) -> u64 {
        LogIdOptionExt::term_or_zero(*self)
    }

    fn next_index(&self) -> u64 {
        LogIdOptionExt::next_index(*self)
    }
}

impl<T> LogIdOptionExt for Option<T>
where T: LogIdOptionExt
{
    fn index(&self) -> Option<u64> {
        self.as_ref().and_then(|x| x.index())
    }

    fn index_or_zero(&self) -> u64 {
        self.as_ref().map_or(0, |x| x.index_or_zero())
    }

    fn term_or_zero(&self) -> u64 {
        self.as_ref().map_or(0, |x| x.term_or_zero())
    }

    fn next_index(&self) -> u64 {
        match self {
            None => 1,
            Some(log_id) => log_id.next_index(),
        }
    }
}
