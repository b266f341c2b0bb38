use std::time::Duration;

use anyhow::Result;
use pretty_assertions::assert_eq;
use quorumlog::ServerState;

use crate::fixtures::ut_harness;
use crate::fixtures::Cluster;

/// A leader is elected, and it stays the leader while nothing fails.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn initial_election() -> Result<()> {
    let mut cluster = Cluster::new(3, None)?;

    tracing::info!("--- one leader is elected");
    let leader = cluster.check_one_leader().await?;

    let term1 = cluster.check_terms().await?;
    assert!(term1 >= 1, "term is {}, but should be at least 1", term1);

    tracing::info!("--- followers learn the leader");
    for id in cluster.ids() {
        cluster
            .raft(id)?
            .wait(Some(Duration::from_millis(2_000)))
            .current_leader(leader, "learn leader")
            .await?;
    }

    tracing::info!("--- no election while the leader is alive");
    tokio::time::sleep(Duration::from_millis(900)).await;

    let term2 = cluster.check_terms().await?;
    assert_eq!(term1, term2, "term changed with no failure");

    let leader2 = cluster.check_one_leader().await?;
    assert_eq!(leader, leader2);

    let m = cluster.raft(leader)?.metrics().borrow().clone();
    assert_eq!(ServerState::Leader, m.server_state);
    assert_eq!(Some(leader), m.vote.voted_for());

    cluster.shutdown().await
}
