//! Stored embedding rows: vectors, audit metadata, and search query records.
//!
//! Vector rows live in their own collection keyed by (kind, entity id,
//! field) so multiple fields of one entity are tracked independently and
//! vectors can be queried without joining the entity tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::entity::EntityKind;
use crate::error::CrmError;

/// Field name under which an entity's composite vector is stored.
pub const COMPOSITE_FIELD: &str = "composite";

/// Maximum characters of source text kept on an audit metadata row.
pub const METADATA_TEXT_CAP: usize = 1000;

/// Truncate to a character count without splitting a code point.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    text.chars().take(max_chars).collect()
}

/// A stored vector for one field of one entity.
///
/// At most one row exists per (kind, entity_id, field); regeneration
/// overwrites, never appends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    /// Entity kind this vector belongs to
    pub kind: EntityKind,

    /// Entity id this vector belongs to
    pub entity_id: String,

    /// Owning user (tenant scope)
    pub user_id: String,

    /// Field name ("composite" or a single text field)
    pub field: String,

    /// The denormalized text the vector was derived from
    pub source_text: String,

    /// The embedding vector
    pub vector: Vec<f32>,

    /// Model that produced the vector
    pub model_id: String,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl EmbeddingRecord {
    /// Create a new vector row. Validates key fields and a non-empty vector.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        kind: EntityKind,
        entity_id: impl Into<String>,
        user_id: impl Into<String>,
        field: impl Into<String>,
        source_text: impl Into<String>,
        vector: Vec<f32>,
        model_id: impl Into<String>,
    ) -> Result<Self, CrmError> {
        let entity_id = entity_id.into();
        let user_id = user_id.into();
        let field = field.into();
        if entity_id.trim().is_empty() {
            return Err(CrmError::InvalidInput("entity id must not be empty".into()));
        }
        if user_id.trim().is_empty() {
            return Err(CrmError::InvalidInput("user id must not be empty".into()));
        }
        if field.trim().is_empty() {
            return Err(CrmError::InvalidInput("field must not be empty".into()));
        }
        if vector.is_empty() {
            return Err(CrmError::InvalidInput("vector must not be empty".into()));
        }
        let now = Utc::now();
        Ok(Self {
            kind,
            entity_id,
            user_id,
            field,
            source_text: source_text.into(),
            vector,
            model_id: model_id.into(),
            created_at: now,
            updated_at: now,
        })
    }

    /// The storage key for this row.
    pub fn key(&self) -> (EntityKind, String, String) {
        (self.kind, self.entity_id.clone(), self.field.clone())
    }
}

/// An audit/index row recording that a field of an entity was embedded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingMetadata {
    /// Unique row id
    pub id: String,

    /// Entity kind
    pub kind: EntityKind,

    /// Entity id
    pub entity_id: String,

    /// Owning user (tenant scope)
    pub user_id: String,

    /// Field name that was embedded
    pub field: String,

    /// Source text, truncated for storage
    pub text: String,

    /// Model that produced the vector
    pub model_id: String,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl EmbeddingMetadata {
    pub fn new(
        kind: EntityKind,
        entity_id: impl Into<String>,
        user_id: impl Into<String>,
        field: impl Into<String>,
        text: &str,
        model_id: impl Into<String>,
    ) -> Self {
        Self {
            id: Ulid::new().to_string(),
            kind,
            entity_id: entity_id.into(),
            user_id: user_id.into(),
            field: field.into(),
            text: truncate_chars(text, METADATA_TEXT_CAP),
            model_id: model_id.into(),
            created_at: Utc::now(),
        }
    }
}

/// One ranked hit inside a recorded search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub kind: EntityKind,
    pub entity_id: String,
    pub similarity: f32,
}

/// An audit row capturing one semantic search for analytics and replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQueryRecord {
    /// Unique row id
    pub id: String,

    /// Querying user (tenant scope)
    pub user_id: String,

    /// The free-text query
    pub query: String,

    /// The query vector
    pub vector: Vec<f32>,

    /// Target kind, or None for "all"
    #[serde(default)]
    pub target: Option<EntityKind>,

    /// Similarity threshold used
    pub threshold: f32,

    /// Ranked result set
    pub results: Vec<SearchHit>,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl SearchQueryRecord {
    pub fn new(
        user_id: impl Into<String>,
        query: impl Into<String>,
        vector: Vec<f32>,
        target: Option<EntityKind>,
        threshold: f32,
        results: Vec<SearchHit>,
    ) -> Self {
        Self {
            id: Ulid::new().to_string(),
            user_id: user_id.into(),
            query: query.into(),
            vector,
            target,
            threshold,
            results,
            created_at: Utc::now(),
        }
    }
}
