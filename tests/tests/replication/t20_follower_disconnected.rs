use std::time::Duration;

use anyhow::Result;

use crate::fixtures::ut_harness;
use crate::fixtures::Cluster;

/// The leader and the remaining follower agree while a follower is
/// disconnected; the follower catches up when it comes back.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn follower_disconnected() -> Result<()> {
    let mut cluster = Cluster::new(3, None)?;

    cluster.one("101", 3, false).await?;

    let leader = cluster.check_one_leader().await?;
    let follower = (leader + 1) % 3;
    cluster.isolate(follower);

    tracing::info!("--- the leader and the other follower still agree");
    cluster.one("102", 2, false).await?;
    cluster.one("103", 2, false).await?;
    tokio::time::sleep(Duration::from_millis(300)).await;
    cluster.one("104", 2, false).await?;
    cluster.one("105", 2, false).await?;

    tracing::info!("--- n{} rejoins and catches up", follower);
    cluster.restore(follower);

    let index = cluster.one("106", 3, true).await?;
    tokio::time::sleep(Duration::from_millis(300)).await;
    cluster.one("107", 3, true).await?;

    assert_eq!(Some("105".to_string()), cluster.applied_at(follower, index - 1));

    cluster.shutdown().await
}
