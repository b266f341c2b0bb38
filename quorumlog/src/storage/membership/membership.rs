use core::fmt;
use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::quorum::QuorumSet;
use crate::storage::membership::IntoNodes;
use crate::storage::membership::NodeId;
use crate::Node;

/// The fixed set of peers of a cluster.
///
/// Every peer is a voter; a quorum is a strict majority of the peers.
/// Membership does not change during the lifetime of a cluster.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[derive(serde::Deserialize, serde::Serialize)]
pub struct Membership {
    /// Additional info of all nodes, e.g., the connecting host and port.
    nodes: BTreeMap<NodeId, Node>,
}

impl From<BTreeMap<NodeId, Node>> for Membership {
    fn from(b: BTreeMap<NodeId, Node>) -> Self {
        Membership::new(b)
    }
}

impl fmt::Display for Membership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{",)?;

        for (i, (node_id, node)) in self.nodes.iter().enumerate() {
            if i > 0 {
                write!(f, ",",)?;
            }
            write!(f, "{node_id}:{node}")?;
        }

        write!(f, "}}")?;
        Ok(())
    }
}

impl Membership {
    /// Create a new Membership from a collection of peers.
    ///
    /// The `nodes` can be:
    /// - a `BTreeSet<NodeId>`, with a default `Node` for every id,
    /// - a `BTreeMap<NodeId, Node>` that provides a `Node` for every id,
    /// - a `Vec` of addresses, in which the position is the node id.
    pub fn new<T>(nodes: T) -> Self
    where T: IntoNodes {
        let nodes = nodes.into_nodes();

        Membership { nodes }
    }

    /// Returns an Iterator of all nodes.
    pub fn nodes(&self) -> impl Iterator<Item = (&NodeId, &Node)> {
        self.nodes.iter()
    }

    /// Get a node by node id.
    pub fn get_node(&self, node_id: &NodeId) -> Option<&Node> {
        self.nodes.get(node_id)
    }

    /// Returns an Iterator of all node ids.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Returns the number of peers.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The number of peers that makes a majority: `n/2 + 1`.
    pub fn majority(&self) -> usize {
        self.nodes.len() / 2 + 1
    }

    /// Check if the given `NodeId` is a peer of this cluster.
    pub fn contains(&self, node_id: &NodeId) -> bool {
        self.nodes.contains_key(node_id)
    }
}

impl QuorumSet<NodeId> for Membership {
    type Iter = std::vec::IntoIter<NodeId>;

    /// Distinct members among `ids` form a quorum if they are a majority.
    /// Non-members and repeated ids are not counted.
    fn is_quorum<'a, I: Iterator<Item = &'a NodeId> + Clone>(
        &self,
        ids: I,
    ) -> bool {
        let members = ids.filter(|id| self.contains(id)).collect::<BTreeSet<_>>();
        members.len() >= self.majority()
    }

    fn ids(&self) -> Self::Iter {
        self.node_ids().collect::<Vec<_>>().into_iter()
    }
}
