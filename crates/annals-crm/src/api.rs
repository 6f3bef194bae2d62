use crate::error::Result;
use annals_core::{Attachment, StagedFile};
use async_trait::async_trait;
use serde_json::{Map, Value};

/// A CRM record as exchanged with the API: field API name to JSON value.
pub type Record = Map<String, Value>;

pub const MAX_PER_PAGE: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    Success,
    Error,
}

/// Per-record result of a write. Transport failures are `Err`; a request the
/// CRM answered but refused is `Ok` with `WriteStatus::Error`.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOutcome {
    pub status: WriteStatus,
    pub id: Option<String>,
    pub code: Option<String>,
    pub message: Option<String>,
    pub raw: Value,
}

impl WriteOutcome {
    pub fn success(id: Option<String>, raw: Value) -> Self {
        Self {
            status: WriteStatus::Success,
            id,
            code: Some("SUCCESS".to_string()),
            message: None,
            raw,
        }
    }

    pub fn error(code: &str, message: &str, raw: Value) -> Self {
        Self {
            status: WriteStatus::Error,
            id: None,
            code: Some(code.to_string()),
            message: Some(message.to_string()),
            raw,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == WriteStatus::Success
    }

    /// Parses one entry of a `{"data": [...]}` write response.
    pub fn from_entry(entry: &Value) -> Self {
        let status = match entry.get("status").and_then(Value::as_str) {
            Some(status) if status.eq_ignore_ascii_case("success") => WriteStatus::Success,
            _ => WriteStatus::Error,
        };
        let id = entry
            .get("details")
            .and_then(|details| details.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string);
        Self {
            status,
            id,
            code: entry
                .get("code")
                .and_then(Value::as_str)
                .map(str::to_string),
            message: entry
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
            raw: entry.clone(),
        }
    }

    pub fn describe(&self) -> String {
        match (&self.code, &self.message) {
            (Some(code), Some(message)) => format!("{code}: {message}"),
            (Some(code), None) => code.clone(),
            (None, Some(message)) => message.clone(),
            (None, None) => "unknown error".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Workflow,
    Approval,
    Blueprint,
}

impl Trigger {
    pub fn as_str(self) -> &'static str {
        match self {
            Trigger::Workflow => "workflow",
            Trigger::Approval => "approval",
            Trigger::Blueprint => "blueprint",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Search {
    Criteria(String),
    Email(String),
    Phone(String),
    Word(String),
}

impl Search {
    pub fn equals(field: &str, text: &str) -> Self {
        Search::Criteria(format!("({field}:equals:{})", escape_criteria(text.trim())))
    }

    pub fn query_pair(&self) -> (&'static str, &str) {
        match self {
            Search::Criteria(value) => ("criteria", value),
            Search::Email(value) => ("email", value),
            Search::Phone(value) => ("phone", value),
            Search::Word(value) => ("word", value),
        }
    }
}

fn escape_criteria(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '(' | ')' | ',') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub per_page: u32,
}

impl Page {
    pub fn first(per_page: u32) -> Self {
        Self {
            page: 1,
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::first(MAX_PER_PAGE)
    }
}

#[async_trait]
pub trait CrmApi: Send + Sync {
    async fn insert_record(
        &self,
        module: &str,
        record: Record,
        triggers: &[Trigger],
    ) -> Result<WriteOutcome>;

    async fn update_record(
        &self,
        module: &str,
        id: &str,
        record: Record,
        triggers: &[Trigger],
    ) -> Result<WriteOutcome>;

    async fn delete_record(&self, module: &str, id: &str) -> Result<WriteOutcome>;

    async fn get_record(&self, module: &str, id: &str) -> Result<Option<Record>>;

    async fn get_related_records(
        &self,
        module: &str,
        id: &str,
        related_list: &str,
        fields: &[&str],
        page: Page,
    ) -> Result<Vec<Record>>;

    async fn search_records(&self, module: &str, search: &Search, page: Page)
        -> Result<Vec<Record>>;

    async fn list_attachments(&self, module: &str, id: &str) -> Result<Vec<Attachment>>;

    async fn upload_attachment(
        &self,
        module: &str,
        id: &str,
        file: &StagedFile,
    ) -> Result<WriteOutcome>;

    async fn delete_attachment(
        &self,
        module: &str,
        id: &str,
        attachment_id: &str,
    ) -> Result<WriteOutcome>;
}

#[cfg(test)]
mod tests {
    use super::{Page, Search, WriteOutcome, WriteStatus};
    use serde_json::json;

    #[test]
    fn equals_search_escapes_reserved_characters() {
        let search = Search::equals("Last_Name", " Smith (Jr), ");
        assert_eq!(
            search.query_pair(),
            ("criteria", "(Last_Name:equals:Smith \\(Jr\\)\\,)")
        );
    }

    #[test]
    fn write_outcome_reads_zoho_entry() {
        let ok = WriteOutcome::from_entry(&json!({
            "code": "SUCCESS",
            "details": {"id": "5000000000000000001"},
            "message": "record added",
            "status": "success"
        }));
        assert!(ok.is_success());
        assert_eq!(ok.id.as_deref(), Some("5000000000000000001"));

        let err = WriteOutcome::from_entry(&json!({
            "code": "MANDATORY_NOT_FOUND",
            "details": {"api_name": "Name"},
            "message": "required field not found",
            "status": "error"
        }));
        assert_eq!(err.status, WriteStatus::Error);
        assert_eq!(
            err.describe(),
            "MANDATORY_NOT_FOUND: required field not found"
        );
    }

    #[test]
    fn page_is_clamped() {
        assert_eq!(Page::first(500).per_page, 200);
        assert_eq!(Page::first(0).per_page, 1);
        assert_eq!(Page::default(), Page { page: 1, per_page: 200 });
    }
}
