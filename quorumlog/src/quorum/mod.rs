//! A quorum is a set of nodes a vote request or append-entries request has to
//! contact to. The quorum used by quorumlog is **majority**.
//! A quorum set is a collection of quorums, e.g. the quorum set of the majority
//! of `{a,b,c}` is `{a,b}, {b,c}, {a,c}`.

mod quorum_set;

pub(crate) mod progress;

pub(crate) use progress::VecProgress;
pub(crate) use quorum_set::QuorumSet;
