use crate::error::SyncError;
use annals_crm::mapping::audit_record;
use annals_crm::{CrmApi, Trigger, WriteOutcome};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// One remote write to mirror into the audit module.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    pub action: String,
    pub module: String,
    pub request: Value,
    pub response: Value,
    pub success: bool,
}

impl AuditEntry {
    pub fn from_outcome(action: &str, module: &str, request: Value, outcome: &WriteOutcome) -> Self {
        Self {
            action: action.to_string(),
            module: module.to_string(),
            request,
            response: outcome.raw.clone(),
            success: outcome.is_success(),
        }
    }

    pub fn from_error(action: &str, module: &str, request: Value, error: &impl ToString) -> Self {
        Self {
            action: action.to_string(),
            module: module.to_string(),
            request,
            response: json!({ "error": error.to_string() }),
            success: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuditSummary {
    pub written: usize,
    pub failed: usize,
}

enum Message {
    Entry(AuditEntry),
    Flush(oneshot::Sender<AuditSummary>),
}

/// Fire-and-forget audit trail. Entries are queued and written by a
/// background task in submission order; audit failures are only logged.
#[derive(Debug, Clone)]
pub struct AuditLog {
    sender: Option<mpsc::UnboundedSender<Message>>,
}

impl std::fmt::Debug for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Message::Entry(entry) => f.debug_tuple("Entry").field(entry).finish(),
            Message::Flush(_) => f.write_str("Flush"),
        }
    }
}

impl AuditLog {
    /// Starts the writer task; must be called inside a tokio runtime.
    pub fn spawn(crm: Arc<dyn CrmApi>, audit_module: impl Into<String>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(crm, audit_module.into(), receiver));
        Self {
            sender: Some(sender),
        }
    }

    pub fn disabled() -> Self {
        Self { sender: None }
    }

    pub fn record(&self, entry: AuditEntry) {
        let Some(sender) = &self.sender else {
            return;
        };
        if sender.send(Message::Entry(entry)).is_err() {
            warn!("audit writer stopped; entry dropped");
        }
    }

    /// Waits until every entry queued so far has been written.
    pub async fn flush(&self) -> AuditSummary {
        let Some(sender) = &self.sender else {
            return AuditSummary::default();
        };
        let (done, wait) = oneshot::channel();
        if sender.send(Message::Flush(done)).is_err() {
            return AuditSummary::default();
        }
        wait.await.unwrap_or_default()
    }
}

async fn run_writer(
    crm: Arc<dyn CrmApi>,
    audit_module: String,
    mut receiver: mpsc::UnboundedReceiver<Message>,
) {
    let mut summary = AuditSummary::default();
    while let Some(message) = receiver.recv().await {
        match message {
            Message::Entry(entry) => match write_entry(crm.as_ref(), &audit_module, &entry).await {
                Ok(()) => summary.written += 1,
                Err(err) => {
                    summary.failed += 1;
                    warn!(action = %entry.action, module = %entry.module, "{err}");
                }
            },
            Message::Flush(done) => {
                let _ = done.send(summary);
            }
        }
    }
    debug!(?summary, "audit writer finished");
}

async fn write_entry(
    crm: &dyn CrmApi,
    audit_module: &str,
    entry: &AuditEntry,
) -> Result<(), SyncError> {
    let record = audit_record(
        &entry.action,
        &entry.module,
        &entry.request,
        &entry.response,
        entry.success,
    );
    match crm
        .insert_record(audit_module, record, &[Trigger::Workflow])
        .await
    {
        Ok(outcome) if outcome.is_success() => Ok(()),
        Ok(outcome) => Err(SyncError::AuditLogFailed(outcome.describe())),
        Err(err) => Err(SyncError::AuditLogFailed(err.to_string())),
    }
}
