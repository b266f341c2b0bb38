#![allow(clippy::uninlined_format_args)]

#[path = "../fixtures/mod.rs"]
mod fixtures;

mod t20_vote_and_term_survive_restart;
mod t30_follower_restarts_with_stale_log;
