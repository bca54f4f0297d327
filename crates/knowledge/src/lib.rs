//! Document retrieval and grounded answering for Ragdesk.
//!
//! Ingest: extract text, chunk it, embed the chunks and append them to a
//! JSON vector index. Query: embed the question, rank every stored chunk by
//! cosine similarity and have the completion model answer from the best ones,
//! with a citation list built from the same passages.

pub mod chunker;
pub mod embeddings;
pub mod parser;
pub mod pipeline;
pub mod rag;
pub mod retrieval;
pub mod store;
pub mod types;
pub mod writer;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use embeddings::{EmbeddingClient, EmbeddingProvider};
pub use pipeline::RagPipeline;
pub use rag::{AnswerSynthesizer, Citation};
pub use retrieval::Retriever;
pub use store::IndexStore;
pub use types::{AskRequest, AskResponse, ChunkRecord, IndexStats, IngestReport, ScoredChunk};
pub use writer::IndexWriter;
