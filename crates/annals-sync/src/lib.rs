mod attachments;
pub mod audit;
pub mod book;
pub mod controller;
pub mod error;
pub mod guard;
mod lookup;
mod participants;
mod remote;

pub use audit::{AuditEntry, AuditLog, AuditSummary};
pub use book::BookSync;
pub use controller::{HistorySync, MovedHistory, SyncOptions};
pub use error::{AttachmentAction, LinkAction, Result, SyncError, Synced};
pub use guard::{SubmitGuard, SubmitKey, SubmitKind, SubmitTicket};
