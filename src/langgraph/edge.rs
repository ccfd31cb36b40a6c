use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use super::{error::LangGraphError, state::State};

/// Special node names for graph entry and exit
pub const START: &str = "__start__";
pub const END: &str = "__end__";

pub type ConditionFn<S> = Arc<
    dyn Fn(&S) -> Pin<Box<dyn Future<Output = Result<String, LangGraphError>> + Send>>
        + Send
        + Sync,
>;

/// Edge type - either a regular edge or a conditional edge
pub enum EdgeType<S: State> {
    /// Fixed routing to a single node
    Regular { to: String },
    /// Routing decided from the state after the source node ran
    Conditional {
        condition: ConditionFn<S>,
        /// Maps a condition result to a node name
        mapping: HashMap<String, String>,
    },
}

impl<S: State> Clone for EdgeType<S> {
    fn clone(&self) -> Self {
        match self {
            EdgeType::Regular { to } => EdgeType::Regular { to: to.clone() },
            EdgeType::Conditional { condition, mapping } => EdgeType::Conditional {
                condition: Arc::clone(condition),
                mapping: mapping.clone(),
            },
        }
    }
}

impl<S: State> std::fmt::Debug for EdgeType<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EdgeType::Regular { to } => f.debug_struct("Regular").field("to", to).finish(),
            EdgeType::Conditional { mapping, .. } => f
                .debug_struct("Conditional")
                .field("condition", &"<fn>")
                .field("mapping", mapping)
                .finish(),
        }
    }
}

/// Edge in the graph
#[derive(Clone, Debug)]
pub struct Edge<S: State> {
    pub from: String,
    pub edge_type: EdgeType<S>,
}

impl<S: State> Edge<S> {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            edge_type: EdgeType::Regular { to: to.into() },
        }
    }

    pub fn conditional<F, Fut>(
        from: impl Into<String>,
        condition: F,
        mapping: HashMap<String, String>,
    ) -> Self
    where
        F: Fn(&S) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, LangGraphError>> + Send + 'static,
    {
        Self {
            from: from.into(),
            edge_type: EdgeType::Conditional {
                condition: Arc::new(move |state| Box::pin(condition(state))),
                mapping,
            },
        }
    }

    /// Every node this edge can lead to.
    pub fn targets(&self) -> Vec<&str> {
        match &self.edge_type {
            EdgeType::Regular { to } => vec![to.as_str()],
            EdgeType::Conditional { mapping, .. } => {
                mapping.values().map(String::as_str).collect()
            }
        }
    }

    /// Resolve the next node for `state`.
    ///
    /// A condition result missing from the mapping is a
    /// [`LangGraphError::ConditionError`].
    pub async fn get_target(&self, state: &S) -> Result<String, LangGraphError> {
        match &self.edge_type {
            EdgeType::Regular { to } => Ok(to.clone()),
            EdgeType::Conditional { condition, mapping } => {
                let condition_result = (condition)(state).await?;
                mapping.get(&condition_result).cloned().ok_or_else(|| {
                    LangGraphError::ConditionError(format!(
                        "condition on '{}' returned '{}' which is not in mapping",
                        self.from, condition_result
                    ))
                })
            }
        }
    }
}

/// Build a condition mapping from `(result, node)` pairs.
pub fn branches<I, K, V>(pairs: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
