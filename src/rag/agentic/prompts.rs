//! Prompt templates for every model-backed step.
//!
//! Each template opens with a distinct `###` header so transcripts (and
//! scripted test models) can tell the steps apart.

use crate::schemas::{format_history, ConversationTurn, Message, Passage};

pub const ROUTER_HEADER: &str = "### QUERY ROUTING";
pub const GRADER_HEADER: &str = "### RELEVANCE GRADING";
pub const REWRITER_HEADER: &str = "### QUERY REWRITING";
pub const GREETING_HEADER: &str = "### GREETING REPLY";
pub const EVIDENCE_ANSWER_HEADER: &str = "### EVIDENCE ANSWER";
pub const GENERAL_ANSWER_HEADER: &str = "### GENERAL ANSWER";
pub const GROUNDING_HEADER: &str = "### GROUNDING CHECK";

const ASSISTANT_PERSONA: &str = "You are ClerkGPT, a research assistant for the Presbyterian \
Church in America (PCA). You help people find and understand PCA governance, polity, \
historical records, and doctrinal position papers.";

fn history_block(history: &[ConversationTurn], window: usize) -> String {
    let rendered = format_history(history, window);
    if rendered.is_empty() {
        "(no prior conversation)".to_string()
    } else {
        rendered
    }
}

/// Evidence rendered as `[source_id] title (page N)` blocks.
pub fn evidence_block(evidence: &[Passage]) -> String {
    evidence
        .iter()
        .map(|p| {
            format!(
                "[{}] {} (page {})\n{}",
                p.source_id,
                p.display_title(),
                p.display_page(),
                p.text.trim()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Routing prompt with the glossary and the trailing `window` turns.
pub fn router_messages(
    question: &str,
    history: &[ConversationTurn],
    window: usize,
    glossary: &str,
) -> Vec<Message> {
    let system = format!(
        "{ROUTER_HEADER}\n{ASSISTANT_PERSONA}\n\n\
Decide whether answering the user's question requires searching the PCA document library.\n\n\
Retrieval is NOT needed for:\n\
- greetings and small talk (query_type \"greeting\")\n\
- questions about you or how this assistant works (query_type \"meta\")\n\
- general theology answerable without PCA documents (query_type \"general_theology\")\n\n\
Retrieval IS needed for anything about PCA-specific governance, polity, the Book of Church \
Order, General Assembly actions, historical records, committee reports, or doctrinal position \
papers (query_type \"pca_specific\").\n\n\
Common abbreviations:\n{glossary}\n\n\
Reply with needs_retrieval, query_type, and a one-sentence rationale."
    );
    let human = format!(
        "Conversation so far:\n{}\n\nQuestion: {}",
        history_block(history, window),
        question
    );
    vec![
        Message::new_system_message(system),
        Message::new_human_message(human),
    ]
}

pub fn grader_messages(question: &str, passage: &Passage) -> Vec<Message> {
    let system = format!(
        "{GRADER_HEADER}\n\
You grade whether a retrieved passage is relevant to a user's question.\n\
Set score to \"yes\" if the passage contains information that helps answer the question, \
otherwise \"no\". Give relevance_score between 0 and 1 and a short rationale."
    );
    let human = format!(
        "Question: {}\n\nPassage [{}] {}:\n{}",
        question,
        passage.source_id,
        passage.display_title(),
        passage.text.trim()
    );
    vec![
        Message::new_system_message(system),
        Message::new_human_message(human),
    ]
}

pub fn rewriter_messages(
    question: &str,
    history: &[ConversationTurn],
    window: usize,
    glossary: &str,
) -> Vec<Message> {
    let system = format!(
        "{REWRITER_HEADER}\n{ASSISTANT_PERSONA}\n\n\
A search of the PCA document library found nothing relevant for the question below. \
Rewrite it as a better search query:\n\
- spell out PCA abbreviations using the list below\n\
- replace pronouns and vague references with what they refer to in the conversation\n\
- add PCA-specific terms a governing document would use\n\n\
Abbreviations:\n{glossary}\n\n\
Return only the rewritten query on a single line. Do not answer the question."
    );
    let human = format!(
        "Conversation so far:\n{}\n\nQuestion: {}",
        history_block(history, window),
        question
    );
    vec![
        Message::new_system_message(system),
        Message::new_human_message(human),
    ]
}

pub fn greeting_messages(
    question: &str,
    history: &[ConversationTurn],
    window: usize,
) -> Vec<Message> {
    let system = format!(
        "{GREETING_HEADER}\n{ASSISTANT_PERSONA}\n\n\
Reply warmly in at most two short sentences and offer to help with questions about the PCA."
    );
    let mut messages = vec![Message::new_system_message(system)];
    let start = history.len().saturating_sub(window);
    messages.extend(history[start..].iter().map(ConversationTurn::to_message));
    messages.push(Message::new_human_message(question));
    messages
}

/// Evidence template: every passage is listed under its bracketed source id.
pub fn evidence_answer_messages(
    question: &str,
    evidence: &[Passage],
    history: &[ConversationTurn],
    window: usize,
) -> Vec<Message> {
    let system = format!(
        "{EVIDENCE_ANSWER_HEADER}\n{ASSISTANT_PERSONA}\n\n\
Answer the question using ONLY the numbered sources below. Do not use outside knowledge. \
If the sources do not contain enough information to answer fully, say so plainly and answer \
only the part they support.\n\n\
List in `sources` the document_id of every source you relied on, exactly as shown in \
brackets.\n\n\
Sources:\n{}",
        evidence_block(evidence)
    );
    let human = format!(
        "Conversation so far:\n{}\n\nQuestion: {}",
        history_block(history, window),
        question
    );
    vec![
        Message::new_system_message(system),
        Message::new_human_message(human),
    ]
}

pub fn general_answer_messages(
    question: &str,
    history: &[ConversationTurn],
    window: usize,
) -> Vec<Message> {
    let system = format!(
        "{GENERAL_ANSWER_HEADER}\n{ASSISTANT_PERSONA}\n\n\
No PCA documents are available for this question. Answer from general knowledge, say \
clearly that your answer is not drawn from PCA documents, and suggest where in official \
PCA sources the reader could confirm it."
    );
    let human = format!(
        "Conversation so far:\n{}\n\nQuestion: {}",
        history_block(history, window),
        question
    );
    vec![
        Message::new_system_message(system),
        Message::new_human_message(human),
    ]
}

/// Grounding check over the answer and the evidence it was written from.
pub fn grounding_messages(question: &str, answer: &str, evidence: &[Passage]) -> Vec<Message> {
    let system = format!(
        "{GROUNDING_HEADER}\n\
You check whether an answer is grounded in the evidence it was written from. An answer is \
grounded only if every factual claim in it can be attributed to the evidence. Report \
is_grounded, a confidence between 0 and 1, and describe any unsupported claims in issues \
(empty if none)."
    );
    let human = format!(
        "Question: {}\n\nEvidence:\n{}\n\nAnswer:\n{}",
        question,
        evidence_block(evidence),
        answer
    );
    vec![
        Message::new_system_message(system),
        Message::new_human_message(human),
    ]
}
