use std::fmt;

use crate::base::Serde;

/// A trait defining application specific data.
///
/// This is the opaque command replicated by the log. Applications present
/// their own data models as-is to the Raft node; it is persisted through the
/// [`Persister`] and handed back, unchanged, in an [`ApplyMessage`] once
/// committed.
///
/// ## Note
///
/// The trait is automatically implemented for all types which satisfy its
/// super traits.
///
/// [`Persister`]: crate::storage::Persister
/// [`ApplyMessage`]: crate::ApplyMessage
pub trait AppData:
    fmt::Debug + Clone + Send + Sync + 'static + Serde
{
}

impl<T> AppData for T where T: fmt::Debug + Clone + Send + Sync + 'static + Serde
{}
