#![allow(clippy::uninlined_format_args)]

#[path = "../fixtures/mod.rs"]
mod fixtures;

mod t10_lagging_follower_installs_snapshot;
mod t20_restart_with_snapshot;
mod t30_request_snapshot;
