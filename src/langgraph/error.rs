use thiserror::Error;

/// Errors that can occur when building or running a graph
#[derive(Error, Debug)]
pub enum LangGraphError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Invalid edge: from '{0}' to '{1}'")]
    InvalidEdge(String, String),

    #[error("Execution error: {0}")]
    ExecutionError(String),

    #[error("Graph compilation error: {0}")]
    CompilationError(String),

    #[error("Condition function error: {0}")]
    ConditionError(String),

    #[error("No path from START to END")]
    NoPathToEnd,

    #[error("Recursion limit of {0} steps reached without hitting END")]
    RecursionLimit(usize),

    #[error("Node '{node}' failed: {source}")]
    NodeError {
        node: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl LangGraphError {
    /// Wrap a node's own error, keeping it recoverable by downcasting.
    pub fn node_error<E>(node: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        LangGraphError::NodeError {
            node: node.into(),
            source: Box::new(source),
        }
    }
}
