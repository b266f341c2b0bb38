use anyhow::Result;
use pretty_assertions::assert_eq;

use crate::fixtures::ut_harness;
use crate::fixtures::Cluster;

/// A node restarts with a persisted log that conflicts with the committed
/// one. The conflicting suffix is truncated and the node catches up.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn follower_restarts_with_stale_log() -> Result<()> {
    let mut cluster = Cluster::new(3, None)?;

    cluster.one("base", 3, true).await?;

    tracing::info!("--- leader appends entries alone, then crashes");
    let old = cluster.check_one_leader().await?;
    cluster.isolate(old);

    for i in 0..5 {
        let _ = cluster.raft(old)?.submit(format!("lost-{}", i)).await?;
    }
    cluster.crash(old).await?;
    cluster.restore(old);

    tracing::info!("--- the others commit entries in a newer term");
    let mut last = 0;
    for i in 0..10 {
        last = cluster.one(format!("kept-{}", i), 2, true).await?;
    }

    tracing::info!("--- restart n{} with its stale log", old);
    cluster.start(old);

    let index = cluster.one("after-restart", 3, true).await?;
    assert!(index > last);

    for i in 2..=index {
        let got = cluster.applied_at(old, i);
        assert!(
            got.as_deref().map(|x| !x.starts_with("lost-")).unwrap_or(true),
            "n{} applied a lost entry at {}: {:?}",
            old,
            i,
            got
        );
    }
    assert_eq!(Some("kept-0".to_string()), cluster.applied_at(old, 2));

    cluster.shutdown().await
}
