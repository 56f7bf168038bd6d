use crate::{
    context::Context,
    document::{DocFilter, Document, ScoredDocument},
    error::UnibotError,
    message::{DocumentLink, IncomingMessage, OutgoingMessage, Venue},
};
use async_trait::async_trait;

/// LLM provider trait.
///
/// Every chat backend (Mistral, OpenAI, Anthropic, Gemini) implements this
/// trait to provide a uniform interface.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name as used in config (e.g. "mistral").
    fn name(&self) -> &str;

    /// Default model identifier.
    fn model(&self) -> &str;

    /// Send a conversation context to the provider and get a response.
    async fn complete(&self, context: &Context) -> Result<OutgoingMessage, UnibotError>;

    /// Check if the provider is configured and ready.
    async fn is_available(&self) -> bool;
}

/// Text embedding backend.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn name(&self) -> &str;

    /// Vector length produced by this embedder.
    fn dimensions(&self) -> usize;

    /// Embed a batch of texts, preserving order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, UnibotError>;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, UnibotError> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| UnibotError::Provider(format!("{}: empty embedding response", self.name())))
    }
}

/// Similarity-searchable document store.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Up to `k` documents matching `filter`, most similar first.
    async fn similarity_search(
        &self,
        embedding: &[f32],
        filter: &DocFilter,
        k: i64,
    ) -> Result<Vec<ScoredDocument>, UnibotError>;

    /// Insert documents with their embeddings (same length and order). Returns rows written.
    async fn add_documents(
        &self,
        documents: &[Document],
        embeddings: &[Vec<f32>],
    ) -> Result<u64, UnibotError>;

    /// Remove every document whose `tool` metadata equals `tool`.
    async fn delete_by_tool(&self, tool: &str) -> Result<u64, UnibotError>;

    /// Number of stored documents.
    async fn count(&self) -> Result<i64, UnibotError>;

    /// Remove every document.
    async fn reset(&self) -> Result<(), UnibotError>;
}

/// Messaging Channel trait.
///
/// Every messaging platform implements this trait to receive and send messages.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name.
    fn name(&self) -> &str;

    /// Start listening for incoming messages.
    /// Returns a receiver that yields incoming messages.
    async fn start(&self) -> Result<tokio::sync::mpsc::Receiver<IncomingMessage>, UnibotError>;

    /// Send a response back through this channel.
    async fn send(&self, message: OutgoingMessage) -> Result<(), UnibotError>;

    /// Send a typing indicator to show the bot is processing.
    async fn send_typing(&self, _target: &str) -> Result<(), UnibotError> {
        Ok(())
    }

    /// Send a map pin.
    async fn send_venue(&self, _target: &str, _venue: &Venue) -> Result<(), UnibotError> {
        Ok(())
    }

    /// Send a remote file as a document.
    async fn send_document(
        &self,
        _target: &str,
        _document: &DocumentLink,
    ) -> Result<(), UnibotError> {
        Ok(())
    }

    /// Acknowledge an inline keyboard press.
    async fn answer_callback(&self, _callback_id: &str) -> Result<(), UnibotError> {
        Ok(())
    }

    /// Graceful shutdown.
    async fn stop(&self) -> Result<(), UnibotError>;
}
