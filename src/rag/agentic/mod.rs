//! Agentic retrieval-augmented answering.
//!
//! A question is routed, and when it needs the document library the
//! pipeline retrieves, grades, and deduplicates evidence, rewriting the
//! query a bounded number of times when nothing relevant turns up. The
//! answer is then generated and checked for grounding.

mod agentic_rag;
mod config;
mod diversity;
mod generator;
mod glossary;
mod grader;
mod hallucination;
pub mod prompts;
mod rewriter;
mod router;
mod state;

pub use agentic_rag::{AgenticRAG, AgenticRAGBuilder};
pub use config::AgenticRAGConfig;
pub use diversity::diversity_filter;
pub use generator::{
    resolve_citations, AnswerGenerator, AnswerWithSources, GeneratedAnswer, LLMAnswerGenerator,
    SourceRef, GENERAL_KNOWLEDGE_NOTICE, NO_EVIDENCE_NOTICE,
};
pub use glossary::{default_glossary, Glossary};
pub use grader::{grade_passages, LLMRelevanceGrader, RelevanceGrade, RelevanceGrader};
pub use hallucination::{GroundingAssessment, HallucinationChecker, LLMHallucinationChecker};
pub use rewriter::{LLMQueryRewriter, QueryRewriter};
pub use router::{LLMQueryRouter, QueryRouter, QueryType, RoutingDecision};
pub use state::{AgenticAnswer, Citation, PipelineState};
