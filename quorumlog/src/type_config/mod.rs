//! Define the configuration of types used by a Raft node.

mod declare_raft_types;


use std::fmt::Debug;

use crate::app::AppData;

/// Configuration of types used by a [`Raft`] node.
///
/// The application data type is the only type parameter: it is the opaque
/// command replicated by the log and delivered back through the apply channel.
///
/// [`Raft`]: crate::Raft
pub trait TypeConfig:
    Sized
    + Send
    + Sync
    + Debug
    + Clone
    + Copy
    + Default
    + Eq
    + PartialEq
    + Ord
    + PartialOrd
    + 'static
{
    /// Application-specific request data passed to the state machine.
    type AppData: AppData;
}
