//! The quorumlog network interface.

use openraft_macros::add_async_trait;

use crate::network::connection::Connection;
use crate::storage::membership::NodeId;
use crate::Node;
use crate::TypeConfig;

pub mod connection;

/// A trait defining the interface for a network factory to create
/// connections between cluster members.
///
/// Typically, the network implementation as such will be hidden behind a
/// `Box<T>` or `Arc<T>` and this interface implemented on the `Box<T>` or
/// `Arc<T>`.
#[add_async_trait]
pub trait Network<C>: Send + Sync + 'static
where C: TypeConfig
{
    /// Actual type of the network handling a single connection.
    type Connection: Connection<C>;

    /// Create a new client sending RPCs to the target node.
    ///
    /// This function should **not** create a connection but rather a client
    /// that will connect when required. Therefore, there is chance it will
    /// build a client that is unable to send out anything, e.g., in case
    /// the Node network address is configured incorrectly. But this method
    /// does not return an error because raft can only ignore it: the RPCs
    /// sent through it fail and are retried on the next cycle.
    async fn new_connection(
        &mut self,
        target: NodeId,
        node: &Node,
    ) -> Self::Connection;
}
