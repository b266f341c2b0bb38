use std::fmt;
use std::fmt::Debug;

use crate::storage::log::log_id::LogId;
use crate::TypeConfig;

/// A Raft log entry.
#[derive(serde::Deserialize, serde::Serialize)]
#[serde(bound = "")]
pub struct Entry<C>
where C: TypeConfig
{
    pub log_id: LogId,

    /// This entry's payload: the opaque command submitted by the application.
    pub payload: C::AppData,
}

impl<C> Entry<C>
where C: TypeConfig
{
    pub fn new(log_id: LogId, payload: C::AppData) -> Self {
        Self { log_id, payload }
    }

    pub fn get_log_id(&self) -> &LogId {
        &self.log_id
    }
}

impl<C> Clone for Entry<C>
where C: TypeConfig
{
    fn clone(&self) -> Self {
        Self {
            log_id: self.log_id,
            payload: self.payload.clone(),
        }
    }
}

impl<C> Debug for Entry<C>
where C: TypeConfig
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("log_id", &self.log_id)
            .field("payload", &self.payload)
            .finish()
    }
}

impl<C> PartialEq for Entry<C>
where
    C::AppData: PartialEq,
    C: TypeConfig,
{
    fn eq(&self, other: &Self) -> bool {
        self.log_id == other.log_id && self.payload == other.payload
    }
}

impl<C> fmt::Display for Entry<C>
where C: TypeConfig
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:?}", self.log_id, self.payload)
    }
}
