//! A small state-graph engine.
//!
//! A [`StateGraph`] holds named nodes and the edges between them. Compiling it
//! validates the wiring and yields a [`CompiledGraph`] that moves one state
//! value from [`START`] to [`END`], one node at a time.

mod compiled;
mod edge;
pub mod error;
mod graph;
mod node;
mod state;

pub use compiled::*;
pub use edge::*;
pub use error::*;
pub use graph::*;
pub use node::*;
pub use state::*;
