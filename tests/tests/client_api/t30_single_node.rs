use anyhow::Result;
use pretty_assertions::assert_eq;
use quorumlog::ServerState;

use crate::fixtures::timeout;
use crate::fixtures::ut_harness;
use crate::fixtures::Cluster;

/// A single node is its own quorum: it elects itself and commits alone.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn single_node() -> Result<()> {
    let mut cluster = Cluster::new(1, None)?;

    cluster
        .raft(0)?
        .wait(timeout())
        .state(ServerState::Leader, "single node elects itself")
        .await?;

    for i in 1..=3 {
        let index = cluster.one(format!("c{}", i), 1, false).await?;
        assert_eq!(i, index);
    }

    let m = cluster.raft(0)?.metrics().borrow().clone();
    assert_eq!(3, m.commit_index);
    assert_eq!(Some(0), m.current_leader);

    cluster.shutdown().await
}
