mod logging;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use maplit::btreeset;
use memstore::MemPersister;
use pseudonet::PseudoNet;
use quorumlog::declare_raft_types;
use quorumlog::errors::ForwardToLeader;
use quorumlog::ApplyMessage;
use quorumlog::Config;
use quorumlog::LogId;
use quorumlog::Membership;
use quorumlog::NodeId;
use quorumlog::Raft;
use tokio::sync::mpsc;

use crate::logging::init_logging;

#[derive(Debug, Clone)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Cmd {
    pub key: String,
    pub value: String,
}

impl Cmd {
    pub fn new(key: impl ToString, value: impl ToString) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

declare_raft_types!(pub Types: AppData = Cmd);

/// Compact the log every this many applied entries.
const SNAPSHOT_EVERY: u64 = 5;

/// A key-value store rebuilt only from what the apply channel delivers.
#[derive(Debug, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
struct StateMachine {
    applied: Option<LogId>,
    data: BTreeMap<String, String>,
}

impl StateMachine {
    async fn run(
        sm: Arc<Mutex<Self>>,
        id: NodeId,
        raft: Raft<Types>,
        mut rx: mpsc::Receiver<ApplyMessage<Types>>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        while let Some(msg) = rx.recv().await {
            println!("n{}: apply: {}", id, msg);

            let snapshot = {
                let mut sm = sm.lock().unwrap();
                match msg {
                    ApplyMessage::Entry { log_id, command } => {
                        sm.data.insert(command.key, command.value);
                        sm.applied = Some(log_id);
                    }
                    ApplyMessage::Snapshot { data, .. } => {
                        *sm = serde_json::from_slice(&data)?;
                    }
                }

                match sm.applied {
                    Some(log_id) if log_id.index % SNAPSHOT_EVERY == 0 => {
                        Some((log_id.index, serde_json::to_vec(&*sm)?))
                    }
                    _ => None,
                }
            };

            if let Some((upto, data)) = snapshot {
                let res = raft.request_snapshot(upto, data).await?;
                println!("n{}: compact log upto {}: {:?}", id, upto, res);
            }
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let g = init_logging("hello", "_log", "DEBUG");
    Box::leak(Box::new(g));

    let config = Arc::new(Config::default().validate()?);
    let net = PseudoNet::<Types>::new();
    let membership = Membership::new(btreeset! {1, 2, 3});

    let mut nodes = BTreeMap::new();

    for id in membership.node_ids() {
        let (tx_apply, rx_apply) = mpsc::channel(64);

        let raft = Raft::new(
            id,
            config.clone(),
            membership.clone(),
            net.network_for(id),
            MemPersister::new(),
            tx_apply,
        );

        // Add routes to the network
        net.add_peer(id, raft.clone());

        let sm = Arc::new(Mutex::new(StateMachine::default()));
        tokio::spawn(StateMachine::run(sm.clone(), id, raft.clone(), rx_apply));

        nodes.insert(id, (raft, sm));
    }

    let n1 = nodes[&1].0.clone();

    let res = n1.submit(Cmd::new("x", 1)).await?;
    println!("submit before election, there may not be a leader: {:?}", res);

    println!("wait for leader election");
    let metrics = n1
        .wait(Some(Duration::from_millis(3_000)))
        .metrics(|m| m.current_leader.is_some(), "leader elected")
        .await?;

    let res = n1.submit(Cmd::new("x", 1)).await?;
    println!(
        "submit to arbitrary node, if it's not leader, \
        it should inform to forward to a leader: {:?}",
        res
    );

    let leader_id = match res {
        Err(ForwardToLeader {
            leader_id: Some(leader_id),
        }) => leader_id,
        _ => metrics.current_leader.unwrap_or(1),
    };
    let leader = nodes[&leader_id].0.clone();

    for i in 0..12 {
        let res = leader.submit(Cmd::new(format!("k{}", i % 4), i)).await?;
        println!("submit to leader n{}: {:?}", leader_id, res);
    }

    let (term, _) = leader.get_state().await?;
    let last = leader.metrics().borrow().last_log_index;

    for (id, (raft, _)) in nodes.iter() {
        raft.wait(Some(Duration::from_millis(3_000)))
            .applied_index_at_least(last, "all applied")
            .await?;
        println!("n{}: {}", id, raft.metrics().borrow().clone());
    }

    for (id, (raft, sm)) in nodes.iter() {
        println!("n{}: term {}: {:?}", id, term, sm.lock().unwrap().data);
        raft.shutdown().await?;
    }

    Ok(())
}
