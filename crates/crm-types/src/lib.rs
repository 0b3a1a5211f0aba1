//! # crm-types
//!
//! Shared domain types for the CRM semantic search subsystem.
//!
//! This crate defines the core data structures used throughout the system:
//! - Entities: typed Deal, Contact, and Lead records
//! - Activities: notes, calls, emails, and tasks linked to entities
//! - Embedding rows: stored vectors, audit metadata, and search query records
//! - Config: layered configuration for provider, search, and backfill

pub mod activity;
pub mod config;
pub mod embedding;
pub mod entity;
pub mod error;

pub use activity::{Activity, ActivityKind, ChangeKind};
pub use config::{BackfillSettings, CrmSearchConfig, ProviderSettings, SearchSettings};
pub use embedding::{
    EmbeddingMetadata, EmbeddingRecord, SearchHit, SearchQueryRecord, COMPOSITE_FIELD,
    METADATA_TEXT_CAP,
};
pub use entity::{Contact, Deal, EntityKind, Lead};
pub use error::CrmError;
