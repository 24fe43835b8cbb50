//! Query embedding seam. The index store is generic over this so tests (and other backends)
//! can stand in for Ollama.

use std::future::Future;

use crate::ollama::OllamaError;

/// Turns a single query text into a fixed-dimension vector.
///
/// Implementations must be deterministic for a given model: the same text always yields the
/// same vector. An empty text is a valid (degenerate) query.
pub trait Embedder: Send + Sync {
    /// Name of the model behind this embedder, for logs and status output.
    fn model_name(&self) -> &str;

    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, EmbedError>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    #[error(transparent)]
    Ollama(#[from] OllamaError),
    #[error("model {0} returned no embedding")]
    Empty(String),
}
