use std::time::Duration;

use anyhow::Result;

use crate::fixtures::ut_harness;
use crate::fixtures::Cluster;

/// A new leader is elected when the leader is disconnected, and no leader is
/// elected without a quorum.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn reelection() -> Result<()> {
    let mut cluster = Cluster::new(3, None)?;

    let leader1 = cluster.check_one_leader().await?;

    tracing::info!("--- leader disconnected, a new one should be elected");
    cluster.isolate(leader1);
    let leader2 = cluster.check_one_leader().await?;
    assert_ne!(leader1, leader2);

    tracing::info!("--- old leader rejoins, it should not disturb the new leader");
    cluster.restore(leader1);
    let leader2 = cluster.check_one_leader().await?;

    tracing::info!("--- no quorum, no leader should be elected");
    let other = (leader2 + 1) % 3;
    cluster.isolate(leader2);
    cluster.isolate(other);
    tokio::time::sleep(Duration::from_millis(900)).await;
    cluster.check_no_leader().await?;

    tracing::info!("--- quorum arises, a leader should be elected");
    cluster.restore(other);
    cluster.check_one_leader().await?;

    tracing::info!("--- all connected, still one leader");
    cluster.restore(leader2);
    cluster.check_one_leader().await?;

    cluster.shutdown().await
}
