use std::collections::BTreeMap;
use std::fmt::Display;
use std::fmt::Formatter;

/// `NodeId` uniquely identifies a peer within the cluster.
///
/// It is the index of the peer in the fixed peer list the cluster is created
/// with.
pub type NodeId = u64;

/// `Node` represents a single participant in the cluster.
///
/// Each node is uniquely identified by [`NodeId`] and contains necessary
/// information for the [`Network`](crate::Network) to reach it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Node {
    /// The network address (e.g., IP and port) of the node for communication.
    pub address: String,

    /// Optional metadata associated with the node.
    pub metadata: BTreeMap<String, String>,
}

impl Node {
    pub fn new(address: impl ToString) -> Self {
        Node {
            address: address.to_string(),
            metadata: Default::default(),
        }
    }

    pub fn new_with_meta(
        address: impl ToString,
        metadata: BTreeMap<String, String>,
    ) -> Self {
        Node {
            address: address.to_string(),
            metadata,
        }
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.address)?;
        if !self.metadata.is_empty() {
            write!(f, "; ")?;
        }
        for (i, (k, v)) in self.metadata.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}:{}", k, v)?;
        }
        Ok(())
    }
}
