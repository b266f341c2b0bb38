#![allow(clippy::uninlined_format_args)]

#[path = "../fixtures/mod.rs"]
mod fixtures;

mod t10_initial_election;
mod t20_reelection;
