use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use super::{
    compiled::CompiledGraph,
    edge::{Edge, END, START},
    error::LangGraphError,
    node::Node,
    state::State,
};

/// StateGraph - a builder for creating stateful graphs
///
/// Add nodes and edges, then compile it for execution. Every node needs
/// exactly one outgoing edge; use a conditional edge to branch.
///
/// # Example
///
/// ```rust,no_run
/// use clerk_rag::langgraph::{function_node, StateGraph, END, START};
///
/// # fn build() -> Result<(), clerk_rag::langgraph::LangGraphError> {
/// let mut graph = StateGraph::<u32>::new();
/// graph.add_node("increment", function_node("increment", |n: u32| async move { Ok(n + 1) }))?;
/// graph.add_edge(START, "increment");
/// graph.add_edge("increment", END);
/// let compiled = graph.compile()?;
/// # Ok(()) }
/// ```
pub struct StateGraph<S: State> {
    nodes: HashMap<String, Arc<dyn Node<S>>>,
    edges: Vec<Edge<S>>,
}

impl<S: State> StateGraph<S> {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            edges: Vec::new(),
        }
    }

    /// Add a node to the graph
    ///
    /// # Errors
    ///
    /// Returns an error if a node with the same name already exists or the
    /// name is reserved.
    pub fn add_node<N: Node<S> + 'static>(
        &mut self,
        name: impl Into<String>,
        node: N,
    ) -> Result<&mut Self, LangGraphError> {
        let name = name.into();

        if self.nodes.contains_key(&name) {
            return Err(LangGraphError::CompilationError(format!(
                "Node '{}' already exists",
                name
            )));
        }

        if name == START || name == END {
            return Err(LangGraphError::CompilationError(format!(
                "Cannot add node with reserved name '{}'",
                name
            )));
        }

        self.nodes.insert(name, Arc::new(node));
        Ok(self)
    }

    /// Add a regular edge between two nodes
    ///
    /// `from` may be START and `to` may be END.
    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        self.edges.push(Edge::new(from, to));
        self
    }

    /// Add a conditional edge from a node
    ///
    /// `condition` sees the state the source node returned; its result is
    /// looked up in `mapping` to pick the next node.
    pub fn add_conditional_edges<F, Fut>(
        &mut self,
        from: impl Into<String>,
        condition: F,
        mapping: HashMap<String, String>,
    ) -> &mut Self
    where
        F: Fn(&S) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, LangGraphError>> + Send + 'static,
    {
        self.edges.push(Edge::conditional(from, condition, mapping));
        self
    }

    /// Compile the graph into an executable CompiledGraph
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - an edge references an unknown node
    /// - a node has no outgoing edge, or more than one
    /// - no path exists from START to END
    pub fn compile(self) -> Result<CompiledGraph<S>, LangGraphError> {
        self.validate()?;
        let adjacency = self
            .edges
            .into_iter()
            .map(|edge| (edge.from.clone(), edge))
            .collect();
        Ok(CompiledGraph::new(self.nodes, adjacency))
    }

    fn validate(&self) -> Result<(), LangGraphError> {
        let mut sources = HashSet::new();
        for edge in &self.edges {
            if edge.from == END {
                return Err(LangGraphError::InvalidEdge(
                    edge.from.clone(),
                    "END has no outgoing edges".to_string(),
                ));
            }
            if edge.from != START && !self.nodes.contains_key(&edge.from) {
                return Err(LangGraphError::InvalidEdge(
                    edge.from.clone(),
                    "source node not found".to_string(),
                ));
            }
            if !sources.insert(edge.from.as_str()) {
                return Err(LangGraphError::CompilationError(format!(
                    "Node '{}' has more than one outgoing edge",
                    edge.from
                )));
            }
            for target in edge.targets() {
                if target != END && !self.nodes.contains_key(target) {
                    return Err(LangGraphError::InvalidEdge(
                        edge.from.clone(),
                        format!("target node '{}' not found", target),
                    ));
                }
            }
        }

        if let Some(orphan) = self.nodes.keys().find(|n| !sources.contains(n.as_str())) {
            return Err(LangGraphError::CompilationError(format!(
                "Node '{}' has no outgoing edge",
                orphan
            )));
        }

        if !self.has_path_to_end() {
            return Err(LangGraphError::NoPathToEnd);
        }

        Ok(())
    }

    fn has_path_to_end(&self) -> bool {
        let adjacency: HashMap<&str, &Edge<S>> =
            self.edges.iter().map(|e| (e.from.as_str(), e)).collect();

        let mut visited = HashSet::new();
        let mut stack = vec![START];
        while let Some(node) = stack.pop() {
            if node == END {
                return true;
            }
            if !visited.insert(node) {
                continue;
            }
            if let Some(edge) = adjacency.get(node) {
                stack.extend(edge.targets());
            }
        }
        false
    }
}

impl<S: State> Default for StateGraph<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::langgraph::{branches, function_node, FunctionNode};

    fn passthrough(name: &str) -> FunctionNode<u32> {
        function_node(name.to_string(), |n: u32| async move { Ok(n) })
    }

    #[test]
    fn test_add_node_rejects_duplicates_and_reserved_names() {
        let mut graph = StateGraph::<u32>::new();
        assert!(graph.add_node("test", passthrough("test")).is_ok());
        assert!(graph.add_node("test", passthrough("test")).is_err());
        assert!(graph.add_node(END, passthrough("end")).is_err());
    }

    #[test]
    fn test_compile_linear_graph() {
        let mut graph = StateGraph::<u32>::new();
        graph.add_node("node1", passthrough("node1")).unwrap();
        graph.add_edge(START, "node1");
        graph.add_edge("node1", END);
        assert!(graph.compile().is_ok());
    }

    #[test]
    fn test_compile_rejects_unknown_target() {
        let mut graph = StateGraph::<u32>::new();
        graph.add_node("node1", passthrough("node1")).unwrap();
        graph.add_edge(START, "node1");
        graph.add_edge("node1", "missing");
        assert!(matches!(
            graph.compile(),
            Err(LangGraphError::InvalidEdge(_, _))
        ));
    }

    #[test]
    fn test_compile_rejects_node_without_edge() {
        let mut graph = StateGraph::<u32>::new();
        graph.add_node("node1", passthrough("node1")).unwrap();
        graph.add_node("dangling", passthrough("dangling")).unwrap();
        graph.add_edge(START, "node1");
        graph.add_edge("node1", END);
        assert!(matches!(
            graph.compile(),
            Err(LangGraphError::CompilationError(_))
        ));
    }

    #[test]
    fn test_compile_rejects_second_outgoing_edge() {
        let mut graph = StateGraph::<u32>::new();
        graph.add_node("node1", passthrough("node1")).unwrap();
        graph.add_edge(START, "node1");
        graph.add_edge("node1", END);
        graph.add_edge("node1", "node1");
        assert!(graph.compile().is_err());
    }

    #[test]
    fn test_compile_rejects_cycle_without_exit() {
        let mut graph = StateGraph::<u32>::new();
        graph.add_node("a", passthrough("a")).unwrap();
        graph.add_node("b", passthrough("b")).unwrap();
        graph.add_edge(START, "a");
        graph.add_edge("a", "b");
        graph.add_edge("b", "a");
        assert!(matches!(graph.compile(), Err(LangGraphError::NoPathToEnd)));
    }

    #[test]
    fn test_compile_accepts_conditional_exit() {
        let mut graph = StateGraph::<u32>::new();
        graph.add_node("a", passthrough("a")).unwrap();
        graph.add_edge(START, "a");
        graph.add_conditional_edges(
            "a",
            |n: &u32| {
                let done = *n > 3;
                async move { Ok(if done { "done" } else { "again" }.to_string()) }
            },
            branches([("done", END), ("again", "a")]),
        );
        assert!(graph.compile().is_ok());
    }
}
