use anyhow::Result;
use pretty_assertions::assert_eq;

use crate::fixtures::ut_harness;
use crate::fixtures::Cluster;

/// The log is compacted every 10 entries. A follower that misses entries the
/// leader has compacted receives an InstallSnapshot, then resumes with the
/// entry right after the snapshot.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn lagging_follower_installs_snapshot() -> Result<()> {
    let mut cluster = Cluster::new(3, Some(10))?;

    let leader = cluster.check_one_leader().await?;
    let lagging = (leader + 1) % 3;

    tracing::info!("--- n{} misses everything", lagging);
    cluster.isolate(lagging);

    for i in 1..=55 {
        cluster.one(format!("cmd-{}", i), 2, true).await?;
    }

    let m = cluster
        .raft(leader)?
        .wait(crate::fixtures::timeout())
        .metrics(|m| m.snapshot.map(|s| s.index) >= Some(50), "leader compacted")
        .await?;
    assert!(m.last_log_index >= 55);

    assert!(
        cluster.persister(leader)?.snapshot_size() > 0,
        "snapshot is persisted"
    );

    tracing::info!("--- n{} rejoins", lagging);
    cluster.restore(lagging);

    let index = cluster.one("after", 3, true).await?;

    let installed = cluster.snapshots_installed(lagging);
    assert!(!installed.is_empty(), "n{} installed no snapshot", lagging);
    let first = installed[0];
    assert!(first >= 50 && first % 10 == 0, "installed snapshot upto {}", first);

    tracing::info!("--- everything before the snapshot comes with it");
    assert_eq!(Some("cmd-1".to_string()), cluster.applied_at(lagging, 1));
    assert_eq!(Some("after".to_string()), cluster.applied_at(lagging, index));

    let m = cluster.raft(lagging)?.metrics().borrow().clone();
    assert!(m.snapshot.map(|s| s.index) >= Some(first));

    cluster.shutdown().await
}
