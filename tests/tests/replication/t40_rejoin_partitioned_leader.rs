use anyhow::Result;
use pretty_assertions::assert_eq;

use crate::fixtures::ut_harness;
use crate::fixtures::Cluster;

/// A partitioned leader appends entries nobody else has. After the partition
/// heals, its uncommitted entries are overwritten and every node applies the
/// same command at the same index.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn rejoin_partitioned_leader() -> Result<()> {
    let mut cluster = Cluster::new(3, None)?;

    cluster.one("101", 3, true).await?;

    tracing::info!("--- leader is partitioned, and appends entries alone");
    let leader1 = cluster.check_one_leader().await?;
    cluster.isolate(leader1);

    for cmd in ["102", "103", "104"] {
        let res = cluster.raft(leader1)?.submit(cmd.to_string()).await?;
        assert!(res.is_ok(), "isolated leader should still accept");
    }

    tracing::info!("--- the majority commits in a new term");
    cluster.one("103", 2, true).await?;

    let leader2 = cluster.check_one_leader().await?;
    cluster.isolate(leader2);

    tracing::info!("--- old leader rejoins and its conflicting entries are replaced");
    cluster.restore(leader1);
    cluster.one("104", 2, true).await?;

    cluster.restore(leader2);
    let index = cluster.one("105", 3, true).await?;

    for id in cluster.ids() {
        assert_eq!(Some("103".to_string()), cluster.applied_at(id, 2));
        assert_eq!(Some("105".to_string()), cluster.applied_at(id, index));
    }

    cluster.shutdown().await
}
