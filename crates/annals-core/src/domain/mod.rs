pub mod account;
pub mod attachment;
pub mod contact;
pub mod history;
pub mod ids;
pub mod join;
pub mod user;

pub use account::AccountRef;
pub use attachment::{Attachment, StagedFile};
pub use contact::{display_name, Contact, ContactRef, ContactSearchField, Participants};
pub use history::{History, HistoryDraft, HistoryFields, HistoryKind};
pub use ids::{
    AccountId, ApplicationId, AttachmentId, ContactId, DraftId, HistoryId, JoinId, UserId,
};
pub use join::{HistoryRef, JoinRecord};
pub use user::{User, UserRef};
