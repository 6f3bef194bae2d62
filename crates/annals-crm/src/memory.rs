use crate::api::{CrmApi, Page, Record, Search, Trigger, WriteOutcome};
use crate::error::{CrmError, Result};
use crate::mapping::{parse_lookup, record_id};
use crate::schema::{fields, ModuleNames, RelatedLists};
use annals_core::{Attachment, AttachmentId, StagedFile};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

const ID_BASE: u64 = 5_000_000_000_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Insert,
    Update,
    Delete,
    Get,
    Related,
    Search,
    ListAttachments,
    UploadAttachment,
    DeleteAttachment,
}

/// One call received by the in-memory CRM, successful or not.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub operation: Operation,
    pub module: String,
    pub id: Option<String>,
    pub payload: Option<Record>,
}

/// A related list: rows of `child_module` whose `lookup_field` points at a
/// record of `parent_module`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub parent_module: String,
    pub related_list: String,
    pub child_module: String,
    pub lookup_field: String,
}

#[derive(Debug, Clone)]
struct FailureRule {
    operation: Operation,
    module: Option<String>,
    remaining: Option<usize>,
}

#[derive(Debug, Default)]
struct State {
    modules: BTreeMap<String, BTreeMap<String, Record>>,
    attachments: BTreeMap<(String, String), Vec<Attachment>>,
    relations: Vec<Relation>,
    failures: Vec<FailureRule>,
    calls: Vec<Call>,
    next_id: u64,
}

impl State {
    fn allocate_id(&mut self) -> String {
        self.next_id += 1;
        (ID_BASE + self.next_id).to_string()
    }

    fn should_fail(&mut self, operation: Operation, module: &str) -> bool {
        let position = self.failures.iter().position(|rule| {
            rule.operation == operation
                && rule
                    .module
                    .as_deref()
                    .is_none_or(|wanted| wanted == module)
        });
        let Some(position) = position else {
            return false;
        };
        if let Some(remaining) = self.failures[position].remaining.as_mut() {
            *remaining -= 1;
            if *remaining == 0 {
                self.failures.remove(position);
            }
        }
        true
    }

    fn record(
        &mut self,
        operation: Operation,
        module: &str,
        id: Option<&str>,
        payload: Option<&Record>,
    ) {
        self.calls.push(Call {
            operation,
            module: module.to_string(),
            id: id.map(str::to_string),
            payload: payload.cloned(),
        });
    }

    fn display_name_of(&self, id: &str) -> Option<String> {
        self.modules.values().find_map(|records| {
            let record = records.get(id)?;
            [
                fields::NAME,
                fields::FULL_NAME,
                fields::USER_FULL_NAME,
                fields::ACCOUNT_NAME,
            ]
            .iter()
            .find_map(|key| record.get(*key).and_then(Value::as_str))
            .map(str::to_string)
        })
    }

    /// Fills `name` into lookup values that only carry an `id`, as the CRM
    /// does when a record is read back.
    fn enrich_lookups(&self, record: &mut Record) {
        for value in record.values_mut() {
            let Some(lookup) = value.as_object_mut() else {
                continue;
            };
            if lookup.contains_key("name") {
                continue;
            }
            let Some(id) = lookup.get(fields::ID).and_then(Value::as_str) else {
                continue;
            };
            if let Some(name) = self.display_name_of(id) {
                lookup.insert("name".to_string(), json!(name));
            }
        }
    }
}

/// CRM double holding records in memory. Every call is journaled; failures can
/// be injected per operation and module. Injected write failures come back as
/// error outcomes, injected read failures as `CrmError::Unavailable`.
#[derive(Debug, Default)]
pub struct MemoryCrm {
    state: Mutex<State>,
}

impl MemoryCrm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wires the related lists the history widget reads.
    pub fn with_history_schema(modules: &ModuleNames, related: &RelatedLists) -> Self {
        let crm = Self::new();
        crm.add_relation(Relation {
            parent_module: modules.contacts.clone(),
            related_list: related.contact_history.clone(),
            child_module: modules.history_contacts.clone(),
            lookup_field: fields::CONTACT_DETAILS.to_string(),
        });
        crm.add_relation(Relation {
            parent_module: modules.history.clone(),
            related_list: related.history_contacts.clone(),
            child_module: modules.history_contacts.clone(),
            lookup_field: fields::CONTACT_HISTORY_INFO.to_string(),
        });
        crm
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_relation(&self, relation: Relation) {
        self.state().relations.push(relation);
    }

    /// Stores a record directly, bypassing the journal. Returns its id.
    pub fn seed(&self, module: &str, mut record: Record) -> String {
        let mut state = self.state();
        let id = match record_id(&record) {
            Some(id) => id,
            None => state.allocate_id(),
        };
        record.insert(fields::ID.to_string(), json!(id));
        state
            .modules
            .entry(module.to_string())
            .or_default()
            .insert(id.clone(), record);
        id
    }

    pub fn seed_attachment(&self, module: &str, id: &str, file_name: &str) -> Result<String> {
        let mut state = self.state();
        let attachment_id = state.allocate_id();
        let attachment = Attachment {
            id: AttachmentId::new(&attachment_id)?,
            file_name: file_name.to_string(),
        };
        state
            .attachments
            .entry((module.to_string(), id.to_string()))
            .or_default()
            .push(attachment);
        Ok(attachment_id)
    }

    /// Fails every matching call until cleared.
    pub fn fail(&self, operation: Operation, module: Option<&str>) {
        self.push_failure(operation, module, None);
    }

    /// Fails the next `times` matching calls.
    pub fn fail_times(&self, operation: Operation, module: Option<&str>, times: usize) {
        if times > 0 {
            self.push_failure(operation, module, Some(times));
        }
    }

    fn push_failure(&self, operation: Operation, module: Option<&str>, remaining: Option<usize>) {
        self.state().failures.push(FailureRule {
            operation,
            module: module.map(str::to_string),
            remaining,
        });
    }

    pub fn clear_failures(&self) {
        self.state().failures.clear();
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    pub fn count(&self, operation: Operation, module: &str) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|call| call.operation == operation && call.module == module)
            .count()
    }

    pub fn records(&self, module: &str) -> Vec<Record> {
        self.state()
            .modules
            .get(module)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn record(&self, module: &str, id: &str) -> Option<Record> {
        self.state()
            .modules
            .get(module)
            .and_then(|records| records.get(id))
            .cloned()
    }

    pub fn attachments(&self, module: &str, id: &str) -> Vec<Attachment> {
        self.state()
            .attachments
            .get(&(module.to_string(), id.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    fn begin(
        &self,
        operation: Operation,
        module: &str,
        id: Option<&str>,
        payload: Option<&Record>,
    ) -> (MutexGuard<'_, State>, Option<WriteOutcome>) {
        let mut state = self.state();
        debug!(?operation, module, id, "memory crm call");
        state.record(operation, module, id, payload);
        let failed = state.should_fail(operation, module).then(|| {
            WriteOutcome::error(
                "INJECTED_FAILURE",
                &format!("{operation:?} on {module} failed"),
                json!({ "status": "error", "code": "INJECTED_FAILURE" }),
            )
        });
        (state, failed)
    }

    fn begin_read(
        &self,
        operation: Operation,
        module: &str,
        id: Option<&str>,
    ) -> Result<MutexGuard<'_, State>> {
        let (state, failed) = self.begin(operation, module, id, None);
        match failed {
            Some(outcome) => Err(CrmError::Unavailable(outcome.describe())),
            None => Ok(state),
        }
    }
}

fn success_outcome(id: &str) -> WriteOutcome {
    WriteOutcome::success(
        Some(id.to_string()),
        json!({ "code": "SUCCESS", "details": { "id": id }, "status": "success" }),
    )
}

fn not_found(id: &str) -> WriteOutcome {
    WriteOutcome::error(
        "INVALID_DATA",
        "the related id given seems to be invalid",
        json!({ "code": "INVALID_DATA", "details": { "id": id }, "status": "error" }),
    )
}

fn matches_search(record: &Record, search: &Search) -> bool {
    let field_equals = |field: &str, text: &str| {
        record
            .get(field)
            .and_then(Value::as_str)
            .is_some_and(|value| value.trim().eq_ignore_ascii_case(text.trim()))
    };
    match search {
        Search::Criteria(criteria) => match parse_equals_criteria(criteria) {
            Some((field, text)) if field == fields::ID => {
                record_id(record).is_some_and(|id| id == text)
            }
            Some((field, text)) => field_equals(&field, &text),
            None => false,
        },
        Search::Email(email) => field_equals(fields::EMAIL, email),
        Search::Phone(phone) => field_equals(fields::MOBILE, phone),
        Search::Word(word) => {
            let needle = word.trim().to_lowercase();
            !needle.is_empty()
                && record.values().any(|value| {
                    value
                        .as_str()
                        .is_some_and(|text| text.to_lowercase().contains(&needle))
                })
        }
    }
}

fn parse_equals_criteria(criteria: &str) -> Option<(String, String)> {
    let inner = criteria.trim().strip_prefix('(')?.strip_suffix(')')?;
    let (field, rest) = inner.split_once(":equals:")?;
    let mut text = String::with_capacity(rest.len());
    let mut escaped = false;
    for ch in rest.chars() {
        if escaped || ch != '\\' {
            text.push(ch);
            escaped = false;
        } else {
            escaped = true;
        }
    }
    Some((field.to_string(), text))
}

#[async_trait]
impl CrmApi for MemoryCrm {
    async fn insert_record(
        &self,
        module: &str,
        mut record: Record,
        _triggers: &[Trigger],
    ) -> Result<WriteOutcome> {
        let (mut state, failed) = self.begin(Operation::Insert, module, None, Some(&record));
        if let Some(outcome) = failed {
            return Ok(outcome);
        }
        let id = state.allocate_id();
        record.insert(fields::ID.to_string(), json!(id));
        state.enrich_lookups(&mut record);
        state
            .modules
            .entry(module.to_string())
            .or_default()
            .insert(id.clone(), record);
        Ok(success_outcome(&id))
    }

    async fn update_record(
        &self,
        module: &str,
        id: &str,
        record: Record,
        _triggers: &[Trigger],
    ) -> Result<WriteOutcome> {
        let (mut state, failed) = self.begin(Operation::Update, module, Some(id), Some(&record));
        if let Some(outcome) = failed {
            return Ok(outcome);
        }
        let mut record = record;
        state.enrich_lookups(&mut record);
        let Some(existing) = state
            .modules
            .get_mut(module)
            .and_then(|records| records.get_mut(id))
        else {
            return Ok(not_found(id));
        };
        for (key, value) in record {
            if key != fields::ID {
                existing.insert(key, value);
            }
        }
        Ok(success_outcome(id))
    }

    async fn delete_record(&self, module: &str, id: &str) -> Result<WriteOutcome> {
        let (mut state, failed) = self.begin(Operation::Delete, module, Some(id), None);
        if let Some(outcome) = failed {
            return Ok(outcome);
        }
        let removed = state
            .modules
            .get_mut(module)
            .and_then(|records| records.remove(id));
        if removed.is_none() {
            return Ok(not_found(id));
        }
        state
            .attachments
            .remove(&(module.to_string(), id.to_string()));
        Ok(success_outcome(id))
    }

    async fn get_record(&self, module: &str, id: &str) -> Result<Option<Record>> {
        let state = self.begin_read(Operation::Get, module, Some(id))?;
        Ok(state
            .modules
            .get(module)
            .and_then(|records| records.get(id))
            .cloned())
    }

    async fn get_related_records(
        &self,
        module: &str,
        id: &str,
        related_list: &str,
        _fields: &[&str],
        page: Page,
    ) -> Result<Vec<Record>> {
        let state = self.begin_read(Operation::Related, module, Some(id))?;
        let Some(relation) = state
            .relations
            .iter()
            .find(|relation| {
                relation.parent_module == module && relation.related_list == related_list
            })
        else {
            return Err(CrmError::Api {
                status: 400,
                message: format!("invalid related list {related_list} for {module}"),
            });
        };
        let skip = (page.page.saturating_sub(1) as usize) * page.per_page as usize;
        Ok(state
            .modules
            .get(&relation.child_module)
            .map(|records| {
                records
                    .values()
                    .filter(|record| {
                        parse_lookup(record, &relation.lookup_field)
                            .is_some_and(|(parent_id, _)| parent_id == id)
                    })
                    .skip(skip)
                    .take(page.per_page as usize)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn search_records(
        &self,
        module: &str,
        search: &Search,
        page: Page,
    ) -> Result<Vec<Record>> {
        let state = self.begin_read(Operation::Search, module, None)?;
        let skip = (page.page.saturating_sub(1) as usize) * page.per_page as usize;
        Ok(state
            .modules
            .get(module)
            .map(|records| {
                records
                    .values()
                    .filter(|record| matches_search(record, search))
                    .skip(skip)
                    .take(page.per_page as usize)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn list_attachments(&self, module: &str, id: &str) -> Result<Vec<Attachment>> {
        let state = self.begin_read(Operation::ListAttachments, module, Some(id))?;
        Ok(state
            .attachments
            .get(&(module.to_string(), id.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn upload_attachment(
        &self,
        module: &str,
        id: &str,
        file: &StagedFile,
    ) -> Result<WriteOutcome> {
        let (mut state, failed) = self.begin(Operation::UploadAttachment, module, Some(id), None);
        if let Some(outcome) = failed {
            return Ok(outcome);
        }
        let exists = state
            .modules
            .get(module)
            .is_some_and(|records| records.contains_key(id));
        if !exists {
            return Ok(not_found(id));
        }
        let attachment_id = state.allocate_id();
        let attachment = Attachment {
            id: AttachmentId::new(&attachment_id)?,
            file_name: file.file_name().to_string(),
        };
        state
            .attachments
            .entry((module.to_string(), id.to_string()))
            .or_default()
            .push(attachment);
        Ok(success_outcome(&attachment_id))
    }

    async fn delete_attachment(
        &self,
        module: &str,
        id: &str,
        attachment_id: &str,
    ) -> Result<WriteOutcome> {
        let (mut state, failed) =
            self.begin(Operation::DeleteAttachment, module, Some(attachment_id), None);
        if let Some(outcome) = failed {
            return Ok(outcome);
        }
        let Some(attachments) = state
            .attachments
            .get_mut(&(module.to_string(), id.to_string()))
        else {
            return Ok(not_found(attachment_id));
        };
        let before = attachments.len();
        attachments.retain(|attachment| attachment.id.as_str() != attachment_id);
        if attachments.len() == before {
            return Ok(not_found(attachment_id));
        }
        Ok(success_outcome(attachment_id))
    }
}

#[cfg(test)]
mod tests {
    use super::parse_equals_criteria;

    #[test]
    fn criteria_parsing_unescapes_values() {
        assert_eq!(
            parse_equals_criteria("(Last_Name:equals:Smith \\(Jr\\))"),
            Some(("Last_Name".to_string(), "Smith (Jr)".to_string()))
        );
        assert_eq!(parse_equals_criteria("Last_Name:equals:Smith"), None);
    }
}
