use std::collections::HashMap;
use std::sync::Arc;

use super::{
    edge::{Edge, END, START},
    error::LangGraphError,
    node::Node,
    state::State,
};

/// Default bound on node executions per invocation.
pub const DEFAULT_RECURSION_LIMIT: usize = 25;

/// CompiledGraph - an executable graph ready for execution
///
/// This is created by calling `compile()` on a `StateGraph`. It holds no
/// per-run state, so one compiled graph can serve concurrent invocations.
pub struct CompiledGraph<S: State> {
    nodes: HashMap<String, Arc<dyn Node<S>>>,
    adjacency: HashMap<String, Edge<S>>,
    recursion_limit: usize,
}

impl<S: State> CompiledGraph<S> {
    pub(crate) fn new(
        nodes: HashMap<String, Arc<dyn Node<S>>>,
        adjacency: HashMap<String, Edge<S>>,
    ) -> Self {
        Self {
            nodes,
            adjacency,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }

    /// Maximum number of node executions before a run is aborted.
    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }

    pub fn recursion_limit(&self) -> usize {
        self.recursion_limit
    }

    /// Invoke the graph with initial state
    ///
    /// Executes the graph from START to END, returning the final state. A
    /// failing node aborts the run and its error is returned unchanged; no
    /// partial state escapes.
    pub async fn invoke(&self, initial_state: S) -> Result<S, LangGraphError> {
        let mut state = initial_state;
        let mut current = self.next_node(START, &state).await?;
        let mut steps = 0;

        while current != END {
            if steps >= self.recursion_limit {
                return Err(LangGraphError::RecursionLimit(self.recursion_limit));
            }
            steps += 1;

            let node = self
                .nodes
                .get(&current)
                .ok_or_else(|| LangGraphError::NodeNotFound(current.clone()))?;

            log::debug!("graph step {}: entering node '{}'", steps, current);
            state = node.invoke(state).await?;

            current = self.next_node(&current, &state).await?;
        }

        log::debug!("graph reached END after {} steps", steps);
        Ok(state)
    }

    async fn next_node(&self, from: &str, state: &S) -> Result<String, LangGraphError> {
        self.adjacency
            .get(from)
            .ok_or_else(|| {
                LangGraphError::ExecutionError(format!("No edges found from node: {}", from))
            })?
            .get_target(state)
            .await
    }
}
