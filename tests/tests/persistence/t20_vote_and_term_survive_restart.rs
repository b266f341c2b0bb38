use anyhow::Result;
use pretty_assertions::assert_eq;

use crate::fixtures::ut_harness;
use crate::fixtures::Cluster;

/// Term, vote and log are loaded from the persister on restart.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn vote_and_term_survive_restart() -> Result<()> {
    let mut cluster = Cluster::new(3, None)?;

    cluster.one("a", 3, true).await?;
    cluster.one("b", 3, true).await?;

    let mut before = Vec::new();
    for id in cluster.ids() {
        let m = cluster.raft(id)?.metrics().borrow().clone();
        before.push((id, m.current_term, m.vote, m.last_log_index));
    }

    for id in cluster.ids() {
        cluster.crash(id).await?;
    }

    tracing::info!("--- disable election so that the loaded state stays put");
    let mut config = (*cluster.config).clone();
    config.enable_elect = false;
    cluster.config = std::sync::Arc::new(config);

    for id in cluster.ids() {
        cluster.start(id);
    }

    for (id, term, vote, last_log_index) in before {
        let raft = cluster.raft(id)?;

        let (got_term, is_leader) = raft.get_state().await?;
        assert_eq!(term, got_term);
        assert!(!is_leader);

        let m = raft.metrics().borrow().clone();
        assert_eq!(vote, m.vote);
        assert_eq!(last_log_index, m.last_log_index);
    }

    cluster.shutdown().await
}
