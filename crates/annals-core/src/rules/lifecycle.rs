use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Client-side phase of one history record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordPhase {
    Draft,
    Editing,
    Saving,
    Saved,
    SaveFailed,
    Deleting,
    Deleted,
    DeleteFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordEvent {
    Edit,
    Submit,
    SaveSucceeded,
    SaveFailed,
    Delete,
    DeleteSucceeded,
    DeleteFailed,
}

impl RecordPhase {
    pub fn apply(self, event: RecordEvent) -> Result<RecordPhase, CoreError> {
        use RecordEvent as E;
        use RecordPhase as P;

        let next = match (self, event) {
            (P::Draft | P::Saved | P::Editing, E::Submit) => P::Saving,
            (P::Saved, E::Edit) => P::Editing,
            (P::Editing, E::Edit) => P::Editing,
            (P::Saving, E::SaveSucceeded) => P::Saved,
            (P::Saving, E::SaveFailed) => P::SaveFailed,
            (P::Saved | P::Editing, E::Delete) => P::Deleting,
            (P::Deleting, E::DeleteSucceeded) => P::Deleted,
            (P::Deleting, E::DeleteFailed) => P::DeleteFailed,
            _ => {
                return Err(CoreError::InvalidTransition {
                    from: self.to_string(),
                    event: format!("{event:?}"),
                })
            }
        };
        Ok(next)
    }

    /// Failed attempts fall back to the phase the user can retry from.
    pub fn settle(self, had_id: bool) -> RecordPhase {
        match self {
            RecordPhase::SaveFailed if had_id => RecordPhase::Saved,
            RecordPhase::SaveFailed => RecordPhase::Draft,
            RecordPhase::DeleteFailed => RecordPhase::Saved,
            other => other,
        }
    }

    pub fn is_pending(self) -> bool {
        matches!(self, RecordPhase::Saving | RecordPhase::Deleting)
    }
}

impl fmt::Display for RecordPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RecordPhase::Draft => "draft",
            RecordPhase::Editing => "editing",
            RecordPhase::Saving => "saving",
            RecordPhase::Saved => "saved",
            RecordPhase::SaveFailed => "save_failed",
            RecordPhase::Deleting => "deleting",
            RecordPhase::Deleted => "deleted",
            RecordPhase::DeleteFailed => "delete_failed",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::{RecordEvent, RecordPhase};

    #[test]
    fn draft_saves() {
        let phase = RecordPhase::Draft.apply(RecordEvent::Submit).unwrap();
        assert!(phase.is_pending());
        let phase = phase.apply(RecordEvent::SaveSucceeded).unwrap();
        assert_eq!(phase, RecordPhase::Saved);
    }

    #[test]
    fn saving_rejects_second_submit() {
        assert!(RecordPhase::Saving.apply(RecordEvent::Submit).is_err());
        assert!(RecordPhase::Deleting.apply(RecordEvent::Delete).is_err());
    }

    #[test]
    fn failures_settle_back_for_retry() {
        let failed = RecordPhase::Saving.apply(RecordEvent::SaveFailed).unwrap();
        assert_eq!(failed.settle(false), RecordPhase::Draft);
        assert_eq!(failed.settle(true), RecordPhase::Saved);
        let failed = RecordPhase::Deleting
            .apply(RecordEvent::DeleteFailed)
            .unwrap();
        assert_eq!(failed.settle(true), RecordPhase::Saved);
    }

    #[test]
    fn deleted_is_terminal() {
        assert!(RecordPhase::Deleted.apply(RecordEvent::Edit).is_err());
    }
}
