//! Activity records and change notifications.
//!
//! Activities are the one-to-many neighborhood of an entity: notes, calls,
//! emails, and tasks. A mutation to an activity names the entities it
//! touches so their composite vectors can be recomputed.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CrmError;

/// The kind of an activity record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Note,
    Call,
    Email,
    Task,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Note => "note",
            ActivityKind::Call => "call",
            ActivityKind::Email => "email",
            ActivityKind::Task => "task",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityKind {
    type Err = CrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "note" => Ok(ActivityKind::Note),
            "call" => Ok(ActivityKind::Call),
            "email" => Ok(ActivityKind::Email),
            "task" => Ok(ActivityKind::Task),
            other => Err(CrmError::InvalidInput(format!(
                "unknown activity kind: {other}"
            ))),
        }
    }
}

/// The kind of mutation applied to an activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Create,
    Update,
    Delete,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Create => "create",
            ChangeKind::Update => "update",
            ChangeKind::Delete => "delete",
        }
    }
}

/// An activity linked to zero or more entities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    /// Unique identifier for this activity
    pub id: String,

    /// Owning user (tenant scope)
    pub user_id: String,

    /// Activity kind
    pub kind: ActivityKind,

    /// Short subject line
    pub subject: String,

    /// Body text
    #[serde(default)]
    pub content: Option<String>,

    /// Linked deal, if any
    #[serde(default)]
    pub deal_id: Option<String>,

    /// Linked contact, if any
    #[serde(default)]
    pub contact_id: Option<String>,

    /// Linked lead, if any
    #[serde(default)]
    pub lead_id: Option<String>,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl Activity {
    /// Create a new activity. Validates required identity fields.
    pub fn new(
        id: impl Into<String>,
        user_id: impl Into<String>,
        kind: ActivityKind,
        subject: impl Into<String>,
    ) -> Result<Self, CrmError> {
        let id = id.into();
        let user_id = user_id.into();
        if id.trim().is_empty() {
            return Err(CrmError::InvalidInput("activity id must not be empty".into()));
        }
        if user_id.trim().is_empty() {
            return Err(CrmError::InvalidInput("user id must not be empty".into()));
        }
        let now = Utc::now();
        Ok(Self {
            id,
            user_id,
            kind,
            subject: subject.into(),
            content: None,
            deal_id: None,
            contact_id: None,
            lead_id: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_deal(mut self, deal_id: impl Into<String>) -> Self {
        self.deal_id = Some(deal_id.into());
        self
    }

    pub fn with_contact(mut self, contact_id: impl Into<String>) -> Self {
        self.contact_id = Some(contact_id.into());
        self
    }

    pub fn with_lead(mut self, lead_id: impl Into<String>) -> Self {
        self.lead_id = Some(lead_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_kind_round_trip() {
        for kind in [
            ActivityKind::Note,
            ActivityKind::Call,
            ActivityKind::Email,
            ActivityKind::Task,
        ] {
            let parsed: ActivityKind = kind.as_str().parse().unwrap();
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn test_activity_links() {
        let activity = Activity::new("act-1", "user-1", ActivityKind::Call, "Pricing call")
            .unwrap()
            .with_content("Discussed pricing objection, follow up Friday")
            .with_deal("deal-1")
            .with_contact("contact-2");

        assert_eq!(activity.deal_id.as_deref(), Some("deal-1"));
        assert_eq!(activity.contact_id.as_deref(), Some("contact-2"));
        assert!(activity.lead_id.is_none());
    }

    #[test]
    fn test_activity_requires_ids() {
        assert!(Activity::new("", "user-1", ActivityKind::Note, "x").is_err());
    }
}
