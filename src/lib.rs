//! Legal question answering over an indexed judgment corpus.
//!
//! Queries are embedded, matched against an in-process vector index, and
//! answered by an LLM with a prompt chosen from the retrieval confidence.
//! Responses always carry verifiable citations to the retrieved judgments.

pub mod config;
pub mod errors;
pub mod index;
pub mod ingest;
pub mod llm;
pub mod logging;
pub mod rag;
pub mod server;
pub mod state;
