use anyhow::Result;
use pretty_assertions::assert_eq;
use quorumlog::errors::RejectSnapshot;
use quorumlog::LogId;

use crate::fixtures::ut_harness;
use crate::fixtures::Cluster;

/// A snapshot is rejected if it does not go beyond the current one, or if it
/// covers entries not yet delivered to the state machine.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn request_snapshot() -> Result<()> {
    let mut cluster = Cluster::new(3, None)?;

    for i in 1..=5 {
        cluster.one(format!("cmd-{}", i), 3, true).await?;
    }

    let leader = cluster.check_one_leader().await?;
    let raft = cluster.raft(leader)?.clone();
    let (term, _) = raft.get_state().await?;

    tracing::info!("--- not applied yet");
    let res = raft.request_snapshot(100, b"x".to_vec()).await?;
    assert!(
        matches!(res, Err(RejectSnapshot::NotApplied { upto: 100, .. })),
        "got: {:?}",
        res
    );

    tracing::info!("--- compact upto 3");
    raft.request_snapshot(3, b"upto-3".to_vec()).await??;

    let m = raft
        .wait(crate::fixtures::timeout())
        .metrics(|m| m.snapshot.is_some(), "compacted")
        .await?;
    let snapshot_last = m.snapshot.map(|x| x.index);
    assert_eq!(Some(3), snapshot_last);
    assert!(m.snapshot.map(|x| x.term) <= Some(term));

    tracing::info!("--- already compacted");
    for upto in [2, 3] {
        let res = raft.request_snapshot(upto, b"y".to_vec()).await?;
        assert_eq!(
            Err(RejectSnapshot::AlreadyCompacted {
                upto,
                snapshot_last: m.snapshot.unwrap_or(LogId::new(0, 0)),
            }),
            res
        );
    }

    tracing::info!("--- compacted log still replicates");
    cluster.one("cmd-6", 3, true).await?;

    cluster.shutdown().await
}
