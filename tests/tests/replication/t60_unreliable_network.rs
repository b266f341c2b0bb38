use anyhow::Result;

use crate::fixtures::ut_harness;
use crate::fixtures::Cluster;

/// Agreement is reached when messages are delayed and dropped at random.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn unreliable_network() -> Result<()> {
    let mut cluster = Cluster::new(5, None)?;
    cluster.set_unreliable(true);

    for i in 0..20 {
        cluster.one(format!("unreliable-{}", i), 1, true).await?;
    }

    cluster.set_unreliable(false);
    cluster.one("reliable", 5, true).await?;

    cluster.shutdown().await
}
