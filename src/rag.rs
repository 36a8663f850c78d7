/// RAG service HTTP client module.
///
/// This module provides a blocking HTTP client for the external retrieval-augmented
/// generation service, the trait seam used to inject it, and its error type.
mod client;

pub use client::{DataType, RagClient, RagClientBuilder, RagError, RagService};
