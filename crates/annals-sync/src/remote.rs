use crate::audit::{AuditEntry, AuditLog};
use annals_core::StagedFile;
use annals_crm::{CrmApi, Record, Trigger, WriteOutcome};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

const TRIGGERS: [Trigger; 1] = [Trigger::Workflow];

/// CRM writes that are mirrored into the audit log. Failures come back as a
/// human-readable reason; transport errors and refused writes look the same.
#[derive(Clone)]
pub(crate) struct AuditedWriter {
    crm: Arc<dyn CrmApi>,
    audit: AuditLog,
}

pub(crate) type WriteResult = std::result::Result<WriteOutcome, String>;

impl AuditedWriter {
    pub(crate) fn new(crm: Arc<dyn CrmApi>, audit: AuditLog) -> Self {
        Self { crm, audit }
    }

    pub(crate) async fn insert(&self, module: &str, record: Record) -> WriteResult {
        let request = Value::Object(record.clone());
        let result = self.crm.insert_record(module, record, &TRIGGERS).await;
        let outcome = self.settle("insert", module, request, result)?;
        if outcome.id.is_none() {
            return Err("crm response did not include the new record id".to_string());
        }
        Ok(outcome)
    }

    pub(crate) async fn update(&self, module: &str, id: &str, record: Record) -> WriteResult {
        let mut request = record.clone();
        request.insert("id".to_string(), json!(id));
        let result = self.crm.update_record(module, id, record, &TRIGGERS).await;
        self.settle("update", module, Value::Object(request), result)
    }

    pub(crate) async fn delete(&self, module: &str, id: &str) -> WriteResult {
        let result = self.crm.delete_record(module, id).await;
        self.settle("delete", module, json!({ "id": id }), result)
    }

    pub(crate) async fn upload(&self, module: &str, id: &str, file: &StagedFile) -> WriteResult {
        let request = json!({
            "id": id,
            "file_name": file.file_name(),
            "size": file.content().len(),
        });
        let result = self.crm.upload_attachment(module, id, file).await;
        self.settle("upload_attachment", module, request, result)
    }

    pub(crate) async fn delete_attachment(
        &self,
        module: &str,
        id: &str,
        attachment_id: &str,
    ) -> WriteResult {
        let request = json!({ "id": id, "attachment_id": attachment_id });
        let result = self.crm.delete_attachment(module, id, attachment_id).await;
        self.settle("delete_attachment", module, request, result)
    }

    fn settle(
        &self,
        action: &str,
        module: &str,
        request: Value,
        result: annals_crm::Result<WriteOutcome>,
    ) -> WriteResult {
        match result {
            Ok(outcome) => {
                debug!(action, module, success = outcome.is_success(), "crm write");
                self.audit
                    .record(AuditEntry::from_outcome(action, module, request, &outcome));
                if outcome.is_success() {
                    Ok(outcome)
                } else {
                    Err(outcome.describe())
                }
            }
            Err(err) => {
                debug!(action, module, error = %err, "crm write failed");
                self.audit
                    .record(AuditEntry::from_error(action, module, request, &err));
                Err(err.to_string())
            }
        }
    }
}
