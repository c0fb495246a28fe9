//! Retrieval-augmented answering over the judgment corpus.
//!
//! Pipeline per query, strictly sequential: embed the query, search the
//! vector index, assemble a bounded context from the retrieved judgments,
//! then pick a generation strategy from the top retrieval score.

pub mod context;
pub mod policy;
pub mod retriever;
pub mod types;

pub use context::{ContextBuilder, DocumentStore, FsDocumentStore};
pub use policy::RagService;
pub use retriever::Retriever;
pub use types::{AnswerResponse, CaseMetadata, Citation, Confidence, RetrievalHit};
