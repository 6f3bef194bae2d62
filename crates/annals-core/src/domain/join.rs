use crate::domain::contact::ContactRef;
use crate::domain::history::HistoryKind;
use crate::domain::ids::{HistoryId, JoinId};
use serde::{Deserialize, Serialize};

/// One history/contact pairing. Carries a copy of the history fields the
/// contact's history table shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRecord {
    pub id: JoinId,
    pub history: HistoryRef,
    pub contact: ContactRef,
    pub kind: Option<HistoryKind>,
    pub result: Option<String>,
    pub regarding: Option<String>,
    pub details: Option<String>,
    pub duration_minutes: Option<u32>,
    pub occurred_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRef {
    pub id: HistoryId,
    pub name: String,
}
