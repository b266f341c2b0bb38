//! The `Core` is the single task that owns the state of a Raft node.
//!
//! It receives requests from the application and from peers through
//! [`APIMessage`](io::api_message::APIMessage), and events from timers, RPC
//! tasks and the apply task through
//! [`Notification`](io::notification::Notification). It handles one message at
//! a time and never waits for the network while handling it.

pub(crate) mod apply;
#[allow(clippy::module_inception)]
pub(crate) mod core;
pub(crate) mod core_state;
pub(crate) mod election_timer;
pub(crate) mod io;
pub(crate) mod roles;
mod tick;

use roles::candidate::Candidate;
use roles::leader::Leader;
pub(crate) use tick::Tick;
pub(crate) use tick::TickHandle;

pub(crate) type LeaderState = Option<Box<Leader>>;
pub(crate) type CandidateState = Option<Candidate>;
