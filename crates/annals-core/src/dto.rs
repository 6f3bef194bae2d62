use crate::domain::{
    Attachment, ContactRef, History, HistoryFields, HistoryId, HistoryKind, HistoryRef,
    JoinRecord, Participants,
};
use crate::rules::DEFAULT_DURATION_MINUTES;
use crate::time::split_date_time;
use serde::{Deserialize, Serialize};

/// One entry of the local history list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRow {
    pub history: HistoryRef,
    pub fields: HistoryFields,
    pub participants: Participants,
    pub attachment: Option<Attachment>,
    pub modified_at: Option<i64>,
}

impl HistoryRow {
    pub fn id(&self) -> &HistoryId {
        &self.history.id
    }

    pub fn name(&self) -> &str {
        &self.history.name
    }

    /// Builds a row from a contact's join row without fetching the history
    /// record itself; only the viewed contact is known as participant.
    pub fn from_join(join: &JoinRecord) -> Self {
        let fields = HistoryFields {
            kind: join.kind.clone().unwrap_or_default(),
            result: join.result.clone(),
            regarding: join.regarding.clone(),
            details: join.details.clone().unwrap_or_default(),
            duration_minutes: join.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES),
            occurred_at: join.occurred_at.unwrap_or_default(),
            owner: None,
            stakeholder: None,
        };
        Self {
            history: join.history.clone(),
            fields,
            participants: std::iter::once(join.contact.clone()).collect(),
            attachment: None,
            modified_at: None,
        }
    }
}

impl From<History> for HistoryRow {
    fn from(history: History) -> Self {
        Self {
            history: HistoryRef {
                id: history.id,
                name: history.name,
            },
            fields: history.fields,
            participants: history.participants,
            attachment: history.attachment,
            modified_at: history.modified_at,
        }
    }
}

/// Flat rendering of a row for `--json` output and table display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRowDto {
    pub id: HistoryId,
    pub name: String,
    pub date: String,
    pub time: String,
    pub occurred_at: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub result: Option<String>,
    pub duration_minutes: u32,
    pub regarding: Option<String>,
    pub details: String,
    pub record_manager: Option<String>,
    pub stakeholder: Option<String>,
    pub participants: Vec<ContactRef>,
    pub attachment: Option<String>,
}

impl From<&HistoryRow> for HistoryRowDto {
    fn from(row: &HistoryRow) -> Self {
        let (date, time) = split_date_time(row.fields.occurred_at);
        Self {
            id: row.history.id.clone(),
            name: row.history.name.clone(),
            date,
            time,
            occurred_at: row.fields.occurred_at,
            kind: row.fields.kind.label().to_string(),
            result: row.fields.result.clone(),
            duration_minutes: row.fields.duration_minutes,
            regarding: row.fields.regarding.clone(),
            details: row.fields.details.clone(),
            record_manager: row.fields.owner.as_ref().map(|owner| owner.name.clone()),
            stakeholder: row
                .fields
                .stakeholder
                .as_ref()
                .map(|account| account.name.clone()),
            participants: row.participants.as_slice().to_vec(),
            attachment: row
                .attachment
                .as_ref()
                .map(|attachment| attachment.file_name.clone()),
        }
    }
}

/// Reference tables offered by the history form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormOptionsDto {
    pub types: Vec<TypeOptionDto>,
    pub durations: Vec<u32>,
    pub default_duration: u32,
    pub regarding: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeOptionDto {
    #[serde(rename = "type")]
    pub kind: String,
    pub results: Vec<String>,
}

impl FormOptionsDto {
    pub fn build() -> Self {
        let types = HistoryKind::BUILT_IN
            .iter()
            .map(|kind| TypeOptionDto {
                kind: kind.label().to_string(),
                results: crate::rules::allowed_results(kind)
                    .unwrap_or_default()
                    .iter()
                    .map(|result| result.to_string())
                    .collect(),
            })
            .collect();
        Self {
            types,
            durations: crate::rules::DURATION_OPTIONS.to_vec(),
            default_duration: DEFAULT_DURATION_MINUTES,
            regarding: crate::rules::REGARDING_PRESETS
                .iter()
                .map(|preset| preset.to_string())
                .collect(),
        }
    }
}
