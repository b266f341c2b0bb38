use std::time::Duration;

use anyhow::Result;
use pretty_assertions::assert_eq;

use crate::fixtures::ut_harness;
use crate::fixtures::Cluster;

/// Nothing is committed while a majority is disconnected.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn no_agreement_without_quorum() -> Result<()> {
    let mut cluster = Cluster::new(5, None)?;

    cluster.one("10", 5, false).await?;

    tracing::info!("--- disconnect 3 of 5 followers");
    let leader = cluster.check_one_leader().await?;
    let cut = [(leader + 1) % 5, (leader + 2) % 5, (leader + 3) % 5];
    for id in cut {
        cluster.isolate(id);
    }

    let log_id = cluster
        .raft(leader)?
        .submit("20".to_string())
        .await?
        .map_err(|e| anyhow::anyhow!("leader rejects submit: {}", e))?;
    assert_eq!(2, log_id.index);

    tokio::time::sleep(Duration::from_millis(900)).await;

    let (n, _) = cluster.n_committed(2)?;
    assert_eq!(0, n, "committed without a majority");

    tracing::info!("--- repair");
    for id in cut {
        cluster.restore(id);
    }

    // Index 2 is overwritten if the leader is one of the nodes that missed it.
    let leader2 = cluster.check_one_leader().await?;
    let res = cluster.raft(leader2)?.submit("30".to_string()).await?;
    if let Ok(log_id) = res {
        assert!((2..=3).contains(&log_id.index), "unexpected index {}", log_id);
    }

    cluster.one("1000", 5, true).await?;
    cluster.shutdown().await
}
