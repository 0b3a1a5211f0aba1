//! # crm-vector
//!
//! Vector store adapter for the CRM semantic search subsystem.
//!
//! Persists vectors with their source text against (kind, entity id, field)
//! keys in the relational store, and exposes the cosine-ranked similarity
//! query primitive per entity collection. Queries are tenant-scoped and
//! skip rows whose model id is incommensurable with the query vector.

pub mod adapter;
pub mod error;

pub use adapter::{SimilarityMatch, VectorStoreAdapter, PREVIEW_CHARS};
pub use error::VectorError;
