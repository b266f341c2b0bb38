use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::storage::membership::NodeId;
use crate::Node;

/// Convert into a map of `Node`.
///
/// This is used as a user input acceptor when building a Membership, to convert
/// various input types into a map of `Node`.
pub trait IntoNodes {
    fn into_nodes(self) -> BTreeMap<NodeId, Node>;
}

impl IntoNodes for BTreeSet<NodeId> {
    fn into_nodes(self) -> BTreeMap<NodeId, Node> {
        self.into_iter().map(|id| (id, Node::default())).collect()
    }
}

impl IntoNodes for BTreeMap<NodeId, Node> {
    fn into_nodes(self) -> BTreeMap<NodeId, Node> {
        self
    }
}

/// A peer list: the position of an address is the id of the peer.
impl<T: ToString> IntoNodes for Vec<T> {
    fn into_nodes(self) -> BTreeMap<NodeId, Node> {
        self.into_iter()
            .enumerate()
            .map(|(i, addr)| (i as NodeId, Node::new(addr)))
            .collect()
    }
}
