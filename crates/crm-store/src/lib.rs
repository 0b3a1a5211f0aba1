//! # crm-store
//!
//! Relational store boundary for the CRM semantic search subsystem.
//!
//! The relational store is an external collaborator: the rest of the
//! application owns the business tables, and this crate only defines the
//! boundary the embedding pipeline needs — typed CRUD on entities and
//! activities, vector rows keyed by (kind, entity id, field), audit
//! metadata, and the backfill candidate scan.
//!
//! [`MemoryStore`] is a complete in-memory implementation, used by every
//! test and usable as a small-scale backend.

pub mod error;
pub mod memory;
pub mod store;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use store::CrmStore;
