#![doc = include_str!("lib_readme.md")]
#![allow(clippy::bool_assert_comparison)]
#![allow(clippy::bool_comparison)]
#![allow(clippy::result_large_err)]
#![allow(clippy::type_complexity)]
#![deny(unused_qualifications)]

mod config;
mod core;
mod quorum;

pub mod app;
pub mod base;
pub mod errors;
pub mod metrics;
pub mod network;
pub mod raft;
pub mod storage;
pub mod testing;
pub mod type_config;

pub use anyerror;
pub use anyerror::AnyError;
pub use openraft_macros::add_async_trait;

pub use crate::config::Config;
pub use crate::config::ConfigError;
pub use crate::metrics::Metrics;
pub use crate::metrics::ServerState;
pub use crate::network::Network;
pub use crate::raft::ApplyMessage;
pub use crate::raft::Raft;
pub use crate::storage::log::log_id::LogId;
pub use crate::storage::log::log_id::LogIdOptionExt;
pub use crate::storage::membership::Membership;
pub use crate::storage::membership::Node;
pub use crate::storage::membership::NodeId;
pub use crate::storage::vote::Vote;
pub use crate::storage::Persister;
pub use crate::type_config::TypeConfig;
