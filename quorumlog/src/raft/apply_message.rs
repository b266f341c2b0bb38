use std::fmt;

use crate::storage::log::log_id::LogId;
use crate::TypeConfig;

/// A message delivered to the application through the apply channel.
///
/// Committed commands are delivered in log order, each exactly once. A
/// `Snapshot` replaces the application state with the state up to
/// `last_log_id`; entries after it follow.
pub enum ApplyMessage<C>
where C: TypeConfig
{
    /// A committed command.
    Entry { log_id: LogId, command: C::AppData },

    /// The application should reset its state from a snapshot.
    Snapshot { last_log_id: LogId, data: Vec<u8> },
}

impl<C> ApplyMessage<C>
where C: TypeConfig
{
    /// The last log id this message brings the application to.
    pub fn log_id(&self) -> LogId {
        match self {
            ApplyMessage::Entry { log_id, .. } => *log_id,
            ApplyMessage::Snapshot { last_log_id, .. } => *last_log_id,
        }
    }
}

impl<C> Clone for ApplyMessage<C>
where C: TypeConfig
{
    fn clone(&self) -> Self {
        match self {
            ApplyMessage::Entry { log_id, command } => ApplyMessage::Entry {
                log_id: *log_id,
                command: command.clone(),
            },
            ApplyMessage::Snapshot { last_log_id, data } => {
                ApplyMessage::Snapshot {
                    last_log_id: *last_log_id,
                    data: data.clone(),
                }
            }
        }
    }
}

impl<C> fmt::Debug for ApplyMessage<C>
where C: TypeConfig
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplyMessage::Entry { log_id, command } => f
                .debug_struct("Entry")
                .field("log_id", log_id)
                .field("command", command)
                .finish(),
            ApplyMessage::Snapshot { last_log_id, data } => f
                .debug_struct("Snapshot")
                .field("last_log_id", last_log_id)
                .field("size", &data.len())
                .finish(),
        }
    }
}

impl<C> fmt::Display for ApplyMessage<C>
where C: TypeConfig
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplyMessage::Entry { log_id, command } => {
                write!(f, "Entry({}:{:?})", log_id, command)
            }
            ApplyMessage::Snapshot { last_log_id, data } => {
                write!(f, "Snapshot({}, size:{})", last_log_id, data.len())
            }
        }
    }
}
