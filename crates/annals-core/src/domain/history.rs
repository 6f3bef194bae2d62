use crate::domain::account::AccountRef;
use crate::domain::attachment::Attachment;
use crate::domain::contact::Participants;
use crate::domain::ids::{DraftId, HistoryId};
use crate::domain::user::UserRef;
use crate::error::CoreError;
use crate::rules::duration::DEFAULT_DURATION_MINUTES;
use crate::rules::validation::validate_fields;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryKind {
    #[default]
    Meeting,
    Call,
    Email,
    Note,
    ToDo,
    Appointment,
    Other(String),
}

impl HistoryKind {
    pub const BUILT_IN: [HistoryKind; 6] = [
        HistoryKind::Meeting,
        HistoryKind::Call,
        HistoryKind::Email,
        HistoryKind::Note,
        HistoryKind::ToDo,
        HistoryKind::Appointment,
    ];

    pub fn other(label: &str) -> Result<Self, CoreError> {
        let trimmed = label.trim();
        if trimmed.is_empty() {
            return Err(CoreError::InvalidHistoryKind(label.to_string()));
        }
        Ok(Self::Other(trimmed.to_string()))
    }

    /// Picklist value as stored in the CRM.
    pub fn label(&self) -> &str {
        match self {
            HistoryKind::Meeting => "Meeting",
            HistoryKind::Call => "Call",
            HistoryKind::Email => "Email",
            HistoryKind::Note => "Note",
            HistoryKind::ToDo => "To-Do",
            HistoryKind::Appointment => "Appointment",
            HistoryKind::Other(label) => label,
        }
    }
}

impl fmt::Display for HistoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for HistoryKind {
    type Err = CoreError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CoreError::InvalidHistoryKind(raw.to_string()));
        }
        let lower = trimmed.to_ascii_lowercase();
        let kind = match lower.as_str() {
            "meeting" => HistoryKind::Meeting,
            "call" => HistoryKind::Call,
            "email" => HistoryKind::Email,
            "note" => HistoryKind::Note,
            "to-do" | "todo" | "to_do" => HistoryKind::ToDo,
            "appointment" => HistoryKind::Appointment,
            _ => match lower.strip_prefix("other:") {
                Some(_) => HistoryKind::other(&trimmed[6..])?,
                None => HistoryKind::other(trimmed)?,
            },
        };
        Ok(kind)
    }
}

/// Editable fields of a history record, as collected by the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryFields {
    pub kind: HistoryKind,
    pub result: Option<String>,
    pub regarding: Option<String>,
    pub details: String,
    pub duration_minutes: u32,
    pub occurred_at: i64,
    pub owner: Option<UserRef>,
    pub stakeholder: Option<AccountRef>,
}

impl HistoryFields {
    pub fn with_defaults(now_utc: i64, owner: Option<UserRef>) -> Self {
        Self {
            kind: HistoryKind::Meeting,
            result: None,
            regarding: None,
            details: String::new(),
            duration_minutes: DEFAULT_DURATION_MINUTES,
            occurred_at: now_utc,
            owner,
            stakeholder: None,
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        validate_fields(self)
    }
}

/// A history record that has not been submitted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryDraft {
    pub draft_id: DraftId,
    pub fields: HistoryFields,
}

impl HistoryDraft {
    pub fn new(now_utc: i64, owner: Option<UserRef>) -> Self {
        Self {
            draft_id: DraftId::new(),
            fields: HistoryFields::with_defaults(now_utc, owner),
        }
    }

    pub fn from_fields(fields: HistoryFields) -> Self {
        Self {
            draft_id: DraftId::new(),
            fields,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    pub id: HistoryId,
    pub name: String,
    pub fields: HistoryFields,
    pub participants: Participants,
    pub attachment: Option<Attachment>,
    pub modified_at: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::{HistoryDraft, HistoryKind};
    use std::str::FromStr;

    #[test]
    fn draft_defaults() {
        let draft = HistoryDraft::new(1_700_000_000, None);
        assert_eq!(draft.fields.kind, HistoryKind::Meeting);
        assert_eq!(draft.fields.duration_minutes, 60);
        assert_eq!(draft.fields.occurred_at, 1_700_000_000);
    }

    #[test]
    fn kind_parses_labels_and_other() {
        assert_eq!(HistoryKind::from_str("call").unwrap(), HistoryKind::Call);
        assert_eq!(HistoryKind::from_str("To-Do").unwrap(), HistoryKind::ToDo);
        assert_eq!(
            HistoryKind::from_str("other:Site Visit").unwrap(),
            HistoryKind::Other("Site Visit".to_string())
        );
        assert_eq!(
            HistoryKind::from_str("Workshop").unwrap().label(),
            "Workshop"
        );
        assert!(HistoryKind::from_str(" ").is_err());
    }
}
