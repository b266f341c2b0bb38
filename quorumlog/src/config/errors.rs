use anyerror::AnyError;

/// Why a [`Config`](crate::Config) can not be used to run a node.
#[derive(Debug, thiserror::Error)]
#[derive(PartialEq, Eq)]
pub enum ConfigError {
    #[error("can not parse config from {args:?}: {source}")]
    ParseError { source: AnyError, args: Vec<String> },

    /// Election timeouts are drawn from `[min, max)`, which must not be empty.
    #[error("empty election timeout range: [{min}, {max})")]
    EmptyElectionTimeoutRange { min: u64, max: u64 },

    /// A follower would time out between two heartbeats.
    #[error("heartbeat_interval({heartbeat_interval}) must be less than election_timeout_min({election_timeout_min})")]
    HeartbeatTooSlow {
        heartbeat_interval: u64,
        election_timeout_min: u64,
    },

    /// An AppendEntries request could never carry any entry.
    #[error("max_payload_entries must be positive")]
    ZeroPayloadEntries,

    /// No committed entry could ever be applied.
    #[error("max_apply_backlog must be positive")]
    ZeroApplyBacklog,
}
