//! Per-query state machine.
//!
//! `ResolveDoc -> {NotFound | Retrieve -> {SemanticOk | LexicalFallback} ->
//! Synthesize -> {Answered | ModelError}}`, with `Failed` reachable from
//! `ResolveDoc` and `Retrieve` for errors that are neither.
use serde::Serialize;

use crate::retriever::RetrievalPath;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryState {
    ResolveDoc,
    NotFound,
    Retrieve,
    SemanticOk,
    LexicalFallback,
    Synthesize,
    Answered,
    ModelError,
    Failed,
}

impl QueryState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::NotFound | Self::Answered | Self::ModelError | Self::Failed)
    }

    pub fn can_advance_to(self, next: QueryState) -> bool {
        use QueryState::*;
        matches!(
            (self, next),
            (ResolveDoc, NotFound | Retrieve | Failed)
                | (Retrieve, SemanticOk | LexicalFallback | NotFound | Failed)
                | (SemanticOk | LexicalFallback, Synthesize)
                | (Synthesize, Answered | ModelError)
        )
    }

    pub fn after_retrieval(path: &RetrievalPath) -> Self {
        match path {
            RetrievalPath::Semantic => Self::SemanticOk,
            RetrievalPath::LexicalFallback { .. } => Self::LexicalFallback,
        }
    }
}

/// States visited by one query, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryTrace {
    states: Vec<QueryState>,
}

impl Default for QueryTrace {
    fn default() -> Self { Self { states: vec![QueryState::ResolveDoc] } }
}

impl QueryTrace {
    pub fn new() -> Self { Self::default() }

    pub fn current(&self) -> QueryState {
        self.states.last().copied().unwrap_or(QueryState::ResolveDoc)
    }

    pub fn advance(&mut self, next: QueryState) {
        let current = self.current();
        debug_assert!(current.can_advance_to(next), "invalid transition {current:?} -> {next:?}");
        tracing::trace!(from = ?current, to = ?next, "query state");
        self.states.push(next);
    }

    pub fn states(&self) -> &[QueryState] { &self.states }

    pub fn is_finished(&self) -> bool { self.current().is_terminal() }
}

#[derive(Debug, Clone, Serialize)]
pub struct AskOutcome {
    pub answer: String,
    pub retrieval_path: RetrievalPath,
    pub trace: QueryTrace,
}
