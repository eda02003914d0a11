//! Document indexing and question answering over uploaded PDFs.
//!
//! `Pipeline` ties the pieces together: extraction, chunking, the per-document
//! `IndexStore`, two-tier retrieval and answer synthesis, with jobs bounded by
//! a `JobPool`.
pub mod answer;
pub mod extract;
pub mod index_store;
pub mod mirror;
pub mod pipeline;
pub mod pool;
pub mod retriever;
pub mod services;
pub mod state;

pub use answer::AnswerSynthesizer;
pub use index_store::{BuildReport, DocumentIndex, IndexStore, Manifest};
pub use pipeline::{AskFailure, Pipeline, UploadReport};
pub use pool::JobPool;
pub use retriever::{Retrieval, RetrievalPath, Retriever, SemanticFailure};
pub use services::Services;
pub use state::{AskOutcome, QueryState, QueryTrace};
