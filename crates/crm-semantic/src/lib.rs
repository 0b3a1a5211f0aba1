//! # crm-semantic
//!
//! Composite embedding and semantic search for CRM entities.
//!
//! Turns relationally-scattered records (deals, contacts, leads, and their
//! activities) into single vector representations and keeps them consistent
//! as records change:
//! - [`compose`]: deterministic, bounded context composition per entity
//! - [`CompositeEmbeddingService`]: compose -> embed -> store pipeline plus
//!   cross-kind similarity search
//! - [`BackfillEngine`]: paced batch generation of missing vectors
//! - [`FanoutCoordinator`]: settle-all recomputation on activity changes
//!
//! These are the only public entry points; the host application never
//! touches vector rows directly. Embedding is best-effort enrichment - a
//! failure here must never fail the primary CRUD operation that
//! triggered it.

pub mod backfill;
pub mod compose;
pub mod error;
pub mod fanout;
pub mod service;

pub use backfill::{BackfillEngine, BackfillReport};
pub use compose::{compose, ACTIVITY_EXCERPT_CHARS, MAX_ACTIVITY_EXCERPTS, MAX_RELATED_DEALS};
pub use error::SemanticError;
pub use fanout::{ActivityChange, FanoutCoordinator, FanoutReport};
pub use service::CompositeEmbeddingService;
