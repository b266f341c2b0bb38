use anyhow::Result;
use pretty_assertions::assert_eq;

use crate::fixtures::ut_harness;
use crate::fixtures::Cluster;

/// `get_state()` returns the current term and whether the node is the leader.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn get_state() -> Result<()> {
    let mut cluster = Cluster::new(3, None)?;

    let leader = cluster.check_one_leader().await?;
    let term = cluster.check_terms().await?;

    for id in cluster.ids() {
        let (t, is_leader) = cluster.raft(id)?.get_state().await?;
        assert_eq!(term, t);
        assert_eq!(id == leader, is_leader);
    }

    tracing::info!("--- the submitted entry carries the leader's term");
    let log_id = cluster
        .raft(leader)?
        .submit("x".to_string())
        .await?
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    assert_eq!(term, log_id.term);
    assert_eq!(1, log_id.index);

    cluster.shutdown().await
}
