use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use super::{error::LangGraphError, state::State};

/// Trait for nodes in a graph
///
/// A node takes ownership of the state and hands back the state for the
/// next step.
#[async_trait]
pub trait Node<S: State>: Send + Sync {
    async fn invoke(&self, state: S) -> Result<S, LangGraphError>;
}

type NodeFn<S> =
    Arc<dyn Fn(S) -> Pin<Box<dyn Future<Output = Result<S, LangGraphError>> + Send>> + Send + Sync>;

/// Function node - wraps an async function
pub struct FunctionNode<S: State> {
    name: String,
    func: NodeFn<S>,
}

impl<S: State> FunctionNode<S> {
    pub fn new<F, Fut>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(S) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<S, LangGraphError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(move |state| Box::pin(func(state))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl<S: State> Node<S> for FunctionNode<S> {
    async fn invoke(&self, state: S) -> Result<S, LangGraphError> {
        (self.func)(state).await
    }
}

/// Helper function to create a function node
pub fn function_node<S, F, Fut>(name: impl Into<String>, func: F) -> FunctionNode<S>
where
    S: State,
    F: Fn(S) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<S, LangGraphError>> + Send + 'static,
{
    FunctionNode::new(name, func)
}
