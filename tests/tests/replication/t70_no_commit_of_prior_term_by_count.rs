use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use pretty_assertions::assert_eq;
use quorumlog::NodeId;
use quorumlog::ServerState;

use crate::fixtures::test_config;
use crate::fixtures::timeout;
use crate::fixtures::ut_harness;
use crate::fixtures::Cluster;

/// An entry of an earlier term stored on a majority is not committed by
/// counting replicas: a node with a later-term entry at the same index can
/// still be elected and overwrite it.
///
/// Elections are only started by hand so that each step picks its leader.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn no_commit_of_prior_term_by_count() -> Result<()> {
    let mut config = (*test_config()?).clone();
    config.enable_elect = false;

    let mut cluster = Cluster::with_config(5, Arc::new(config), None)?;

    tracing::info!("--- n0 leads T1, index 1 is committed everywhere");
    elect_by_hand(&cluster, 0).await?;
    let index = cluster.one("a", 5, true).await?;
    assert_eq!(1, index);

    tracing::info!("--- n0 replicates index 2 only to n1");
    for id in [2, 3, 4] {
        cluster.isolate(id);
    }
    let log_id = cluster.raft(0)?.submit("b".to_string()).await??;
    assert_eq!((1, 2), (log_id.term, log_id.index));
    cluster
        .raft(1)?
        .wait(timeout())
        .log_index_at_least(2, "n1 receives index 2")
        .await?;

    tracing::info!("--- n4 leads with n2, n3 and appends its own index 2");
    cluster.crash(0).await?;
    cluster.isolate(1);
    for id in [2, 3, 4] {
        cluster.restore(id);
    }
    let t4 = elect_by_hand(&cluster, 4).await?;

    cluster.isolate(2);
    cluster.isolate(3);
    let log_id = cluster.raft(4)?.submit("c".to_string()).await??;
    assert_eq!((t4, 2), (log_id.term, log_id.index));
    cluster.crash(4).await?;

    tracing::info!("--- n0 restarts, leads again and spreads its T1 index 2");
    cluster.start(0);
    for id in [1, 2, 3] {
        cluster.restore(id);
    }
    let t0 = elect_by_hand(&cluster, 0).await?;
    assert!(t0 > t4);

    for id in [2, 3] {
        cluster
            .raft(id)?
            .wait(timeout())
            .log_index_at_least(2, format!("n{} receives index 2 from n0", id))
            .await?;
    }

    // Several heartbeats carry the leader's commit index.
    tokio::time::sleep(Duration::from_millis(500)).await;

    let m = cluster.raft(0)?.metrics().borrow().clone();
    assert!(
        m.commit_index < 2,
        "a majority holds T1 index 2 but it must not commit in T{}: {}",
        t0,
        m
    );
    for id in [0, 1, 2, 3] {
        assert_eq!(None, cluster.applied_at(id, 2), "n{} applied index 2", id);
    }

    tracing::info!("--- n4 restarts, is elected and overwrites index 2");
    cluster.crash(0).await?;
    cluster.start(4);
    elect_by_hand(&cluster, 4).await?;

    let index = cluster.one("d", 4, true).await?;
    assert_eq!(3, index);
    for id in [1, 2, 3, 4] {
        assert_eq!(Some("c".to_string()), cluster.applied_at(id, 2));
    }

    tracing::info!("--- n0 comes back and agrees");
    cluster.start(0);
    cluster.one("e", 5, true).await?;
    assert_eq!(Some("c".to_string()), cluster.applied_at(0, 2));

    cluster.shutdown().await
}

/// Trigger elections on `id` until it becomes the leader; return its term.
///
/// An attempt fails when the voters have already voted in that term, the
/// next one goes to a greater term.
async fn elect_by_hand(cluster: &Cluster, id: NodeId) -> Result<u64> {
    for _ in 0..5 {
        cluster.raft(id)?.trigger_elect().await?;

        let res = cluster
            .raft(id)?
            .wait(Some(Duration::from_millis(500)))
            .state(ServerState::Leader, format!("n{} elected by hand", id))
            .await;

        if let Ok(m) = res {
            return Ok(m.current_term);
        }
    }

    bail!("n{} is not elected", id)
}
