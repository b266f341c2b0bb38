use std::time::Duration;

use anyhow::Result;
use pretty_assertions::assert_eq;

use crate::fixtures::ut_harness;
use crate::fixtures::Cluster;

/// A restarted node delivers its persisted snapshot first, then the entries
/// after it, so its state machine is rebuilt from the apply channel alone.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn restart_with_snapshot() -> Result<()> {
    let mut cluster = Cluster::new(3, Some(10))?;

    let mut last = 0;
    for i in 1..=25 {
        last = cluster.one(format!("cmd-{}", i), 3, true).await?;
    }

    for id in cluster.ids() {
        cluster
            .raft(id)?
            .wait(crate::fixtures::timeout())
            .metrics(|m| m.snapshot.map(|s| s.index) >= Some(20), "compacted")
            .await?;
    }

    tracing::info!("--- crash and restart all");
    for id in cluster.ids() {
        cluster.crash(id).await?;
    }

    let installed_before = cluster
        .ids()
        .into_iter()
        .map(|id| cluster.snapshots_installed(id).len())
        .collect::<Vec<_>>();

    for id in cluster.ids() {
        cluster.start(id);
    }

    tracing::info!("--- every node delivers its snapshot before anything else");
    for (i, id) in cluster.ids().into_iter().enumerate() {
        let mut waited = 0;
        while cluster.snapshots_installed(id).len() == installed_before[i] {
            assert!(waited < 100, "n{} did not deliver its snapshot", id);
            tokio::time::sleep(Duration::from_millis(20)).await;
            waited += 1;
        }

        let installed = cluster.snapshots_installed(id);
        let upto = installed[installed.len() - 1];
        assert!(upto >= 20, "n{} restored snapshot upto {}", id, upto);
        assert!(cluster.applied_at(id, upto).is_some());
    }

    let index = cluster.one("after-restart", 3, true).await?;
    assert!(index > last);

    for id in cluster.ids() {
        assert_eq!(Some("cmd-25".to_string()), cluster.applied_at(id, last));
    }

    cluster.shutdown().await
}
