//! # crm-embeddings
//!
//! Embedding provider client for the CRM semantic search subsystem.
//!
//! The provider is an external, rate-limited, failure-prone HTTP service.
//! This crate abstracts it behind [`EmbeddingProvider`] and pairs it with a
//! deterministic [`FallbackEmbedder`], so batch pipelines stay
//! degraded-but-functional when the provider is down instead of blocked.

pub mod error;
pub mod fallback;
pub mod http;
pub mod model;

pub use error::EmbeddingError;
pub use fallback::{embed_or_fallback, FallbackEmbedder, FALLBACK_MODEL_ID};
pub use http::HttpEmbedder;
pub use model::{Embedding, EmbeddingOutput, EmbeddingProvider};
