//! # unibot-providers
//!
//! Chat and embedding backends for unibot: Mistral, OpenAI, Anthropic and Gemini.

pub mod anthropic;
pub mod embeddings;
pub mod gemini;
pub mod openai;
pub mod registry;
pub mod retry;

pub use registry::{build_embedder, build_provider, ProviderSpec, SUPPORTED_PROVIDERS};
