use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    langgraph::{branches, function_node, CompiledGraph, FunctionNode, LangGraphError, StateGraph, END, START},
    language_models::llm::LLM,
    rag::RAGError,
    retrievers::{RetrieverError, VectorStoreRetriever},
    schemas::{ConversationTurn, Retriever},
    telemetry::{spawn_track, QueryEvent, QueryTracker},
    utils::with_timeout,
    vectorstore::DocumentStore,
};

use super::{
    config::AgenticRAGConfig,
    diversity::diversity_filter,
    generator::{AnswerGenerator, LLMAnswerGenerator},
    glossary::Glossary,
    grader::{grade_passages, LLMRelevanceGrader, RelevanceGrader},
    hallucination::{HallucinationChecker, LLMHallucinationChecker},
    rewriter::{LLMQueryRewriter, QueryRewriter},
    router::{LLMQueryRouter, QueryRouter},
    state::{AgenticAnswer, PipelineState},
};

const ROUTE: &str = "route";
const RETRIEVE: &str = "retrieve";
const GRADE: &str = "grade";
const REWRITE: &str = "rewrite";
const GENERATE: &str = "generate";
const CHECK: &str = "check";

/// The collaborators each graph node calls into.
struct Steps {
    router: Arc<dyn QueryRouter>,
    retriever: Arc<dyn Retriever>,
    grader: Arc<dyn RelevanceGrader>,
    rewriter: Arc<dyn QueryRewriter>,
    generator: Arc<dyn AnswerGenerator>,
    checker: Arc<dyn HallucinationChecker>,
    config: AgenticRAGConfig,
}

impl Steps {
    async fn route(self: Arc<Self>, mut state: PipelineState) -> Result<PipelineState, RAGError> {
        let decision = self.router.route(&state.question, &state.history).await?;
        state.routing = Some(decision);
        Ok(state)
    }

    async fn retrieve(self: Arc<Self>, mut state: PipelineState) -> Result<PipelineState, RAGError> {
        state.candidates.clear();
        state.graded.clear();
        state.documents.clear();

        let result: Result<_, RetrieverError> =
            with_timeout(self.config.call_timeout(), async {
                self.retriever.get_relevant_passages(&state.question).await
            })
            .await;

        match result {
            Ok(passages) => {
                log::debug!(
                    "retrieved {} candidates for '{}'",
                    passages.len(),
                    state.question
                );
                state.candidates = passages;
            }
            Err(e) if self.config.strict_retrieval => return Err(RAGError::Retrieval(e)),
            Err(e) => {
                log::warn!(
                    "retrieval failed for '{}', continuing without evidence: {}",
                    state.question,
                    e
                );
                state.retrieval_errors.push(e.to_string());
            }
        }
        Ok(state)
    }

    async fn grade(self: Arc<Self>, mut state: PipelineState) -> Result<PipelineState, RAGError> {
        let ranked = grade_passages(
            self.grader.as_ref(),
            &state.question,
            &state.candidates,
            self.config.relevance_threshold,
            self.config.grading_concurrency,
        )
        .await?;
        state.graded = diversity_filter(
            ranked,
            self.config.diversity_threshold,
            self.config.max_docs,
        );
        state.documents = state.graded.iter().map(|g| g.passage.clone()).collect();
        Ok(state)
    }

    async fn rewrite(self: Arc<Self>, mut state: PipelineState) -> Result<PipelineState, RAGError> {
        let rewritten = self.rewriter.rewrite(&state.question, &state.history).await?;
        state.rewrites.push(rewritten.clone());
        state.question = rewritten;
        state.rewrite_count += 1;
        Ok(state)
    }

    async fn generate(self: Arc<Self>, mut state: PipelineState) -> Result<PipelineState, RAGError> {
        let routing = state
            .routing
            .as_ref()
            .ok_or_else(|| RAGError::IncompleteState("generation reached before routing".into()))?;
        let searched = routing.searches_library();
        if !searched {
            state.documents.clear();
        }

        let generated = self
            .generator
            .generate(
                &state.original_question,
                &state.documents,
                &state.history,
                routing.query_type,
                searched,
            )
            .await?;
        state.answer = generated.answer;
        state.citations = generated.citations;
        Ok(state)
    }

    async fn check(self: Arc<Self>, mut state: PipelineState) -> Result<PipelineState, RAGError> {
        let grounding = self
            .checker
            .check(&state.original_question, &state.answer, &state.documents)
            .await?;
        state.grounding = Some(grounding);
        Ok(state)
    }
}

/// Wrap a step so its error travels through the graph intact.
fn step_node<F, Fut>(name: &'static str, steps: &Arc<Steps>, step: F) -> FunctionNode<PipelineState>
where
    F: Fn(Arc<Steps>, PipelineState) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<PipelineState, RAGError>> + Send + 'static,
{
    let steps = Arc::clone(steps);
    function_node(name, move |state: PipelineState| {
        let fut = step(Arc::clone(&steps), state);
        async move { fut.await.map_err(|e| LangGraphError::node_error(name, e)) }
    })
}

fn build_graph(steps: Arc<Steps>) -> Result<CompiledGraph<PipelineState>, RAGError> {
    let max_rewrites = steps.config.max_rewrites;
    let recursion_limit = steps.config.recursion_limit();

    let mut graph = StateGraph::<PipelineState>::new();
    graph.add_node(ROUTE, step_node(ROUTE, &steps, Steps::route))?;
    graph.add_node(RETRIEVE, step_node(RETRIEVE, &steps, Steps::retrieve))?;
    graph.add_node(GRADE, step_node(GRADE, &steps, Steps::grade))?;
    graph.add_node(REWRITE, step_node(REWRITE, &steps, Steps::rewrite))?;
    graph.add_node(GENERATE, step_node(GENERATE, &steps, Steps::generate))?;
    graph.add_node(CHECK, step_node(CHECK, &steps, Steps::check))?;

    graph.add_edge(START, ROUTE);
    graph.add_conditional_edges(
        ROUTE,
        |state: &PipelineState| {
            let searches = state
                .routing
                .as_ref()
                .map(|r| r.searches_library())
                .unwrap_or(false);
            async move { Ok(if searches { RETRIEVE } else { GENERATE }.to_string()) }
        },
        branches([(RETRIEVE, RETRIEVE), (GENERATE, GENERATE)]),
    );
    graph.add_edge(RETRIEVE, GRADE);
    graph.add_conditional_edges(
        GRADE,
        move |state: &PipelineState| {
            let next = if !state.documents.is_empty() {
                GENERATE
            } else if state.rewrite_count < max_rewrites {
                REWRITE
            } else {
                log::warn!(
                    "no relevant evidence after {} rewrites; answering without evidence",
                    state.rewrite_count
                );
                GENERATE
            };
            async move { Ok(next.to_string()) }
        },
        branches([(GENERATE, GENERATE), (REWRITE, REWRITE)]),
    );
    graph.add_edge(REWRITE, RETRIEVE);
    graph.add_edge(GENERATE, CHECK);
    graph.add_edge(CHECK, END);

    Ok(graph.compile()?.with_recursion_limit(recursion_limit))
}

/// Agentic RAG pipeline.
///
/// Holds no per-question state: one instance can answer any number of
/// questions concurrently, each in its own [`PipelineState`].
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use clerk_rag::llm::OpenAI;
/// use clerk_rag::rag::AgenticRAG;
/// use clerk_rag::schemas::ConversationTurn;
/// # use clerk_rag::vectorstore::DocumentStore;
///
/// # async fn run(store: Arc<dyn DocumentStore>) -> Result<(), clerk_rag::rag::RAGError> {
/// let pipeline = AgenticRAG::builder()
///     .with_llm(Arc::new(OpenAI::default()))
///     .with_document_store(store)
///     .build()?;
///
/// let history = vec![ConversationTurn::user("hello"), ConversationTurn::assistant("Hi!")];
/// let result = pipeline
///     .answer("What does the BCO say about ordination?", &history)
///     .await?;
/// println!("{}", result.answer);
/// # Ok(()) }
/// ```
pub struct AgenticRAG {
    graph: CompiledGraph<PipelineState>,
    config: AgenticRAGConfig,
    tracker: Option<Arc<dyn QueryTracker>>,
}

impl AgenticRAG {
    /// Start configuring a pipeline.
    pub fn builder() -> AgenticRAGBuilder {
        AgenticRAGBuilder::new()
    }

    /// Settings the pipeline was built with.
    pub fn config(&self) -> &AgenticRAGConfig {
        &self.config
    }

    /// Answer `question` given the caller's conversation `history`.
    ///
    /// Returns a complete answer or an error, never a partial result.
    /// Document-store failures degrade to an answer without evidence unless
    /// `strict_retrieval` is set.
    pub async fn answer(
        &self,
        question: &str,
        history: &[ConversationTurn],
    ) -> Result<AgenticAnswer, RAGError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(RAGError::InvalidInput("question is empty".to_string()));
        }

        if let Some(tracker) = &self.tracker {
            spawn_track(Arc::clone(tracker), QueryEvent::new(question));
        }

        let state = PipelineState::new(question, history.to_vec());
        let final_state = self.graph.invoke(state).await?;
        let answer = AgenticAnswer::try_from(final_state)?;

        log::info!(
            "answered with {} evidence passages, {} rewrites, grounded={}",
            answer.evidence.len(),
            answer.rewritten_queries.len(),
            answer.grounding.is_grounded
        );
        Ok(answer)
    }
}

/// Builder for [`AgenticRAG`].
///
/// Any step left unset is backed by the LLM given to [`with_llm`](Self::with_llm).
pub struct AgenticRAGBuilder {
    llm: Option<Arc<dyn LLM>>,
    retriever: Option<Arc<dyn Retriever>>,
    store: Option<Arc<dyn DocumentStore>>,
    router: Option<Arc<dyn QueryRouter>>,
    grader: Option<Arc<dyn RelevanceGrader>>,
    rewriter: Option<Arc<dyn QueryRewriter>>,
    generator: Option<Arc<dyn AnswerGenerator>>,
    checker: Option<Arc<dyn HallucinationChecker>>,
    tracker: Option<Arc<dyn QueryTracker>>,
    config: AgenticRAGConfig,
}

impl AgenticRAGBuilder {
    pub fn new() -> Self {
        Self {
            llm: None,
            retriever: None,
            store: None,
            router: None,
            grader: None,
            rewriter: None,
            generator: None,
            checker: None,
            tracker: None,
            config: AgenticRAGConfig::default(),
        }
    }

    /// Model used by every step that is not set explicitly.
    pub fn with_llm(mut self, llm: Arc<dyn LLM>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Search the store through a [`VectorStoreRetriever`] configured from
    /// the pipeline settings.
    pub fn with_document_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use a custom retriever; takes precedence over a document store.
    pub fn with_retriever(mut self, retriever: Arc<dyn Retriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    /// Override the routing step.
    pub fn with_router(mut self, router: Arc<dyn QueryRouter>) -> Self {
        self.router = Some(router);
        self
    }

    /// Override per-passage relevance grading.
    pub fn with_grader(mut self, grader: Arc<dyn RelevanceGrader>) -> Self {
        self.grader = Some(grader);
        self
    }

    /// Override the query rewriter used when grading leaves no evidence.
    pub fn with_rewriter(mut self, rewriter: Arc<dyn QueryRewriter>) -> Self {
        self.rewriter = Some(rewriter);
        self
    }

    /// Override answer generation.
    pub fn with_generator(mut self, generator: Arc<dyn AnswerGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Override the grounding check run on every answer.
    pub fn with_checker(mut self, checker: Arc<dyn HallucinationChecker>) -> Self {
        self.checker = Some(checker);
        self
    }

    /// Record every accepted question. Tracking runs in the background and
    /// its failures are only logged.
    pub fn with_query_tracker(mut self, tracker: Arc<dyn QueryTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    pub fn with_config(mut self, config: AgenticRAGConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate the configuration and compile the pipeline graph.
    ///
    /// Fails with [`RAGError::InvalidConfiguration`] when there is no
    /// retriever or store, or when a default step has no LLM to run on.
    pub fn build(self) -> Result<AgenticRAG, RAGError> {
        self.config.validate()?;
        let config = self.config;
        let glossary = Glossary::new(&config.glossary)?;
        let timeout: Duration = config.call_timeout();
        let window = config.history_window;
        let llm = self.llm;

        let require_llm = |step: &str| {
            llm.clone().ok_or_else(|| {
                RAGError::InvalidConfiguration(format!(
                    "an LLM is required unless a custom {} is set",
                    step
                ))
            })
        };

        let retriever: Arc<dyn Retriever> = match (self.retriever, self.store) {
            (Some(retriever), _) => retriever,
            (None, Some(store)) => Arc::new(
                VectorStoreRetriever::new(store)
                    .with_score_threshold(config.score_threshold)
                    .with_max_candidates(config.max_candidates)
                    .with_timeout(timeout),
            ),
            (None, None) => {
                return Err(RAGError::InvalidConfiguration(
                    "a retriever or document store must be set".to_string(),
                ))
            }
        };

        let router: Arc<dyn QueryRouter> = match self.router {
            Some(router) => router,
            None => Arc::new(
                LLMQueryRouter::new(require_llm("router")?)
                    .with_glossary(glossary.clone())
                    .with_history_window(window)
                    .with_timeout(timeout),
            ),
        };
        let grader: Arc<dyn RelevanceGrader> = match self.grader {
            Some(grader) => grader,
            None => Arc::new(LLMRelevanceGrader::new(require_llm("grader")?).with_timeout(timeout)),
        };
        let rewriter: Arc<dyn QueryRewriter> = match self.rewriter {
            Some(rewriter) => rewriter,
            None => Arc::new(
                LLMQueryRewriter::new(require_llm("rewriter")?)
                    .with_glossary(glossary)
                    .with_history_window(window)
                    .with_timeout(timeout),
            ),
        };
        let generator: Arc<dyn AnswerGenerator> = match self.generator {
            Some(generator) => generator,
            None => Arc::new(
                LLMAnswerGenerator::new(require_llm("generator")?)
                    .with_history_window(window)
                    .with_timeout(timeout),
            ),
        };
        let checker: Arc<dyn HallucinationChecker> = match self.checker {
            Some(checker) => checker,
            None => Arc::new(
                LLMHallucinationChecker::new(require_llm("hallucination checker")?)
                    .with_timeout(timeout),
            ),
        };

        let steps = Arc::new(Steps {
            router,
            retriever,
            grader,
            rewriter,
            generator,
            checker,
            config: config.clone(),
        });

        Ok(AgenticRAG {
            graph: build_graph(steps)?,
            config,
            tracker: self.tracker,
        })
    }
}

impl Default for AgenticRAGBuilder {
    fn default() -> Self {
        Self::new()
    }
}
