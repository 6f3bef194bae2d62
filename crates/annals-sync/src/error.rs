use annals_core::CoreError;
use annals_crm::CrmError;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentAction {
    List,
    Upload,
    Delete,
}

impl fmt::Display for AttachmentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AttachmentAction::List => "list",
            AttachmentAction::Upload => "upload",
            AttachmentAction::Delete => "delete",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkAction {
    List,
    Insert,
    Delete,
}

impl fmt::Display for LinkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkAction::List => f.write_str("list"),
            LinkAction::Insert => f.write_str("insert"),
            LinkAction::Delete => f.write_str("delete"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to create history record: {0}")]
    CreateFailed(String),
    #[error("failed to update history record {id}: {reason}")]
    UpdateFailed { id: String, reason: String },
    #[error("failed to delete history record {id}: {reason}")]
    DeleteFailed { id: String, reason: String },
    #[error("attachment {action} failed for history record {id}: {reason}")]
    AttachmentOpFailed {
        action: AttachmentAction,
        id: String,
        reason: String,
    },
    #[error("participant {action} failed for contact {contact}: {reason}")]
    LinkOpFailed {
        action: LinkAction,
        contact: String,
        reason: String,
    },
    #[error("audit log write failed: {0}")]
    AuditLogFailed(String),
    #[error("history record {0} was modified in the crm since it was loaded")]
    Conflict(String),
    #[error("an operation on {0} is already in progress")]
    AlreadyPending(String),
    #[error("history record has no id")]
    MissingId,
    #[error("history record not found: {0}")]
    NotFound(String),
    #[error("crm error: {0}")]
    Crm(#[from] CrmError),
    #[error("core error: {0}")]
    Core(#[from] CoreError),
}

impl SyncError {
    /// Child-operation failures that are collected instead of aborting.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            SyncError::AttachmentOpFailed { .. }
                | SyncError::LinkOpFailed { .. }
                | SyncError::AuditLogFailed(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

/// Outcome of an operation whose primary write succeeded, with the non-fatal
/// failures of its child operations.
#[derive(Debug)]
pub struct Synced<T> {
    pub value: T,
    pub warnings: Vec<SyncError>,
}

impl<T> Synced<T> {
    pub fn new(value: T, warnings: Vec<SyncError>) -> Self {
        Self { value, warnings }
    }

    pub fn clean(value: T) -> Self {
        Self::new(value, Vec::new())
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Synced<U> {
        Synced {
            value: f(self.value),
            warnings: self.warnings,
        }
    }
}
