/// Trait for state types used in a graph
///
/// A state is owned by exactly one node at a time: the compiled graph moves
/// it into a node and takes back whatever the node returns, so no locking or
/// merging is involved.
pub trait State: Send + Sync + 'static {}

impl<T> State for T where T: Send + Sync + 'static {}
