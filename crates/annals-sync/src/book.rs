use crate::controller::MovedHistory;
use crate::error::Synced;
use annals_core::{HistoryBook, HistoryId, HistoryRow};

/// Folds settled controller results back into the local history list.
pub trait BookSync {
    /// Replaces the saved row in place, or prepends it when it is new.
    fn merge_saved(&mut self, saved: &Synced<HistoryRow>);
    fn remove_deleted(&mut self, deleted: &Synced<HistoryId>) -> Option<HistoryRow>;
    /// A moved record no longer belongs to the contact's history.
    fn remove_moved(&mut self, moved: &Synced<MovedHistory>) -> Option<HistoryRow>;
}

impl BookSync for HistoryBook {
    fn merge_saved(&mut self, saved: &Synced<HistoryRow>) {
        self.merge(saved.value.clone());
    }

    fn remove_deleted(&mut self, deleted: &Synced<HistoryId>) -> Option<HistoryRow> {
        self.remove(&deleted.value)
    }

    fn remove_moved(&mut self, moved: &Synced<MovedHistory>) -> Option<HistoryRow> {
        self.remove(&moved.value.source)
    }
}
