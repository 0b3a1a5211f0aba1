//! Entity records: deals, contacts, and leads.
//!
//! Query results from the relational store arrive as typed records with
//! validating constructors, so "unknown shape" errors surface at the
//! boundary rather than deep inside composition code.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CrmError;

/// The kinds of entity that own a composite vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Deal,
    Contact,
    Lead,
}

impl EntityKind {
    /// All kinds, in the order cross-kind search visits them.
    pub const ALL: [EntityKind; 3] = [EntityKind::Deal, EntityKind::Contact, EntityKind::Lead];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Deal => "deal",
            EntityKind::Contact => "contact",
            EntityKind::Lead => "lead",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = CrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deal" => Ok(EntityKind::Deal),
            "contact" => Ok(EntityKind::Contact),
            "lead" => Ok(EntityKind::Lead),
            other => Err(CrmError::InvalidInput(format!(
                "unknown entity kind: {other}"
            ))),
        }
    }
}

fn require(field: &str, value: &str) -> Result<(), CrmError> {
    if value.trim().is_empty() {
        return Err(CrmError::InvalidInput(format!("{field} must not be empty")));
    }
    Ok(())
}

/// A sales deal, optionally linked to a contact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deal {
    /// Unique identifier for this deal
    pub id: String,

    /// Owning user (tenant scope)
    pub user_id: String,

    /// Deal title
    pub title: String,

    /// Monetary value, if known
    #[serde(default)]
    pub value: Option<f64>,

    /// Pipeline stage (e.g., "Negotiation")
    pub stage: String,

    /// Win probability in percent
    #[serde(default)]
    pub probability: Option<u8>,

    /// Free-text next step
    #[serde(default)]
    pub next_step: Option<String>,

    /// Linked contact, if any
    #[serde(default)]
    pub contact_id: Option<String>,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl Deal {
    /// Create a new deal. Validates required identity fields.
    pub fn new(
        id: impl Into<String>,
        user_id: impl Into<String>,
        title: impl Into<String>,
        stage: impl Into<String>,
    ) -> Result<Self, CrmError> {
        let id = id.into();
        let user_id = user_id.into();
        require("deal id", &id)?;
        require("user id", &user_id)?;
        let now = Utc::now();
        Ok(Self {
            id,
            user_id,
            title: title.into(),
            value: None,
            stage: stage.into(),
            probability: None,
            next_step: None,
            contact_id: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_probability(mut self, probability: u8) -> Self {
        self.probability = Some(probability);
        self
    }

    pub fn with_next_step(mut self, next_step: impl Into<String>) -> Self {
        self.next_step = Some(next_step.into());
        self
    }

    pub fn with_contact(mut self, contact_id: impl Into<String>) -> Self {
        self.contact_id = Some(contact_id.into());
        self
    }
}

/// A person record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    /// Unique identifier for this contact
    pub id: String,

    /// Owning user (tenant scope)
    pub user_id: String,

    /// Full name
    pub name: String,

    /// Job title
    #[serde(default)]
    pub title: Option<String>,

    /// Company name
    #[serde(default)]
    pub company: Option<String>,

    /// Free-text persona description
    #[serde(default)]
    pub persona: Option<String>,

    /// Free-text notes
    #[serde(default)]
    pub notes: Option<String>,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl Contact {
    /// Create a new contact. Validates required identity fields.
    pub fn new(
        id: impl Into<String>,
        user_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self, CrmError> {
        let id = id.into();
        let user_id = user_id.into();
        require("contact id", &id)?;
        require("user id", &user_id)?;
        let now = Utc::now();
        Ok(Self {
            id,
            user_id,
            name: name.into(),
            title: None,
            company: None,
            persona: None,
            notes: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = Some(persona.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// An unqualified lead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    /// Unique identifier for this lead
    pub id: String,

    /// Owning user (tenant scope)
    pub user_id: String,

    /// Full name
    pub name: String,

    /// Company name
    #[serde(default)]
    pub company: Option<String>,

    /// Acquisition source (e.g., "webinar", "referral")
    #[serde(default)]
    pub source: Option<String>,

    /// Qualification status
    pub status: String,

    /// Lead score
    #[serde(default)]
    pub score: Option<i32>,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl Lead {
    /// Create a new lead. Validates required identity fields.
    pub fn new(
        id: impl Into<String>,
        user_id: impl Into<String>,
        name: impl Into<String>,
        status: impl Into<String>,
    ) -> Result<Self, CrmError> {
        let id = id.into();
        let user_id = user_id.into();
        require("lead id", &id)?;
        require("user id", &user_id)?;
        let now = Utc::now();
        Ok(Self {
            id,
            user_id,
            name: name.into(),
            company: None,
            source: None,
            status: status.into(),
            score: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_score(mut self, score: i32) -> Self {
        self.score = Some(score);
        self
    }
}
