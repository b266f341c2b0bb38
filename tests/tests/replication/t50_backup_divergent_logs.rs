use std::time::Duration;

use anyhow::Result;

use crate::fixtures::rand_ms;
use crate::fixtures::ut_harness;
use crate::fixtures::Cluster;

/// A leader brings followers with long divergent logs back in line.
///
/// Rejected AppendEntries carry a conflict hint, so the leader skips a whole
/// term of mismatching entries per round trip.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn backup_divergent_logs() -> Result<()> {
    let mut cluster = Cluster::new(5, None)?;

    cluster.one(rand_ms(10_000), 5, true).await?;

    tracing::info!("--- put leader and one follower in a partition");
    let leader1 = cluster.check_one_leader().await?;
    let f1 = (leader1 + 1) % 5;
    let others = [(leader1 + 2) % 5, (leader1 + 3) % 5, (leader1 + 4) % 5];
    for id in others {
        cluster.isolate(id);
    }

    tracing::info!("--- submit lots of commands that won't commit");
    for i in 0..50 {
        let _ = cluster.raft(leader1)?.submit(format!("uncommitted-1-{}", i)).await?;
    }
    tokio::time::sleep(Duration::from_millis(300)).await;

    cluster.isolate(leader1);
    cluster.isolate(f1);

    tracing::info!("--- allow the other partition to recover");
    for id in others {
        cluster.restore(id);
    }

    for i in 0..50 {
        cluster.one(format!("committed-2-{}", i), 3, true).await?;
    }

    tracing::info!("--- now another partitioned leader and one follower");
    let leader2 = cluster.check_one_leader().await?;
    let other = others.into_iter().find(|x| *x != leader2).unwrap_or(others[0]);
    cluster.isolate(other);

    for i in 0..50 {
        let _ = cluster.raft(leader2)?.submit(format!("uncommitted-3-{}", i)).await?;
    }
    tokio::time::sleep(Duration::from_millis(300)).await;

    tracing::info!("--- bring original leader back to life");
    for id in cluster.ids() {
        cluster.isolate(id);
    }
    cluster.restore(leader1);
    cluster.restore(f1);
    cluster.restore(other);

    for i in 0..50 {
        cluster.one(format!("committed-4-{}", i), 3, true).await?;
    }

    tracing::info!("--- now everyone");
    for id in cluster.ids() {
        cluster.restore(id);
    }
    cluster.one(rand_ms(10_000), 5, true).await?;

    cluster.shutdown().await
}
