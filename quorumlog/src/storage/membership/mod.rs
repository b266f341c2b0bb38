mod into_nodes;
#[allow(clippy::module_inception)]
mod membership;

pub mod node;

pub use into_nodes::IntoNodes;
pub use membership::Membership;
pub use node::Node;
pub use node::NodeId;
