//! # clerk-rag
//!
//! Agentic retrieval-augmented answering over a private document corpus.
//! A question is routed, answered from graded and diversified passages of the
//! document library when it needs them, rewritten and retried when the
//! library has nothing relevant, and checked for grounding before it is
//! returned with cited sources.
//!
//! ## Overview
//!
//! - **RAG**: the [`rag::AgenticRAG`] pipeline and its steps (router, grader,
//!   diversity filter, rewriter, generator, hallucination checker)
//! - **LangGraph**: the state graph the pipeline runs on
//! - **LLM**: OpenAI chat client and a scripted model for tests
//! - **Vector store**: Astra DB Data API client behind the `DocumentStore` trait
//! - **Config**: TOML settings with an environment overlay
//!
//! ## Example
//!
//! ```rust,no_run
//! use clerk_rag::config::Settings;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::load(Some("clerk.toml".as_ref()))?;
//! let pipeline = settings.build_pipeline()?;
//! let result = pipeline.answer("How is a teaching elder ordained?", &[]).await?;
//! println!("{}", result.answer);
//! for citation in &result.citations {
//!     println!("[{}] {}", citation.index, citation.title);
//! }
//! # Ok(()) }
//! ```

/// Settings file and environment overlay.
pub mod config;
/// LLM trait, call options, and structured-output helpers.
pub mod language_models;
/// State graphs the pipeline runs on.
pub mod langgraph;
/// Language model clients.
pub mod llm;
/// The agentic answering pipeline.
pub mod rag;
/// Retrievers over a document store.
pub mod retrievers;
/// Shared data types: passages, messages, structured output.
pub mod schemas;
/// Fire-and-forget query tracking.
pub mod telemetry;
pub mod utils;
/// Document stores.
pub mod vectorstore;
