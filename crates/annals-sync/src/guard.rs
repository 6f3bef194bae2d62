use crate::error::{Result, SyncError};
use annals_core::{DraftId, HistoryId, RecordEvent, RecordPhase};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SubmitKey {
    Draft(DraftId),
    Record(HistoryId),
}

impl SubmitKey {
    fn initial_phase(&self) -> RecordPhase {
        match self {
            SubmitKey::Draft(_) => RecordPhase::Draft,
            SubmitKey::Record(_) => RecordPhase::Saved,
        }
    }
}

impl fmt::Display for SubmitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitKey::Draft(id) => write!(f, "draft {id}"),
            SubmitKey::Record(id) => write!(f, "history record {id}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitKind {
    Save,
    Delete,
}

/// Tracks the lifecycle phase per draft or record and refuses a second
/// submission while one is in flight.
#[derive(Debug, Clone, Default)]
pub struct SubmitGuard {
    phases: Arc<Mutex<HashMap<SubmitKey, RecordPhase>>>,
}

impl SubmitGuard {
    pub fn new() -> Self {
        Self::default()
    }

    fn phases(&self) -> MutexGuard<'_, HashMap<SubmitKey, RecordPhase>> {
        self.phases.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn phase(&self, key: &SubmitKey) -> RecordPhase {
        self.phases()
            .get(key)
            .copied()
            .unwrap_or_else(|| key.initial_phase())
    }

    pub fn begin(&self, key: SubmitKey, kind: SubmitKind) -> Result<SubmitTicket> {
        let mut phases = self.phases();
        let current = phases
            .get(&key)
            .copied()
            .unwrap_or_else(|| key.initial_phase());
        if current.is_pending() {
            return Err(SyncError::AlreadyPending(key.to_string()));
        }
        let next = match kind {
            SubmitKind::Save => {
                let editing = match current {
                    RecordPhase::Saved => current.apply(RecordEvent::Edit)?,
                    other => other,
                };
                editing.apply(RecordEvent::Submit)?
            }
            SubmitKind::Delete => current.apply(RecordEvent::Delete)?,
        };
        phases.insert(key.clone(), next);
        Ok(SubmitTicket {
            guard: self.clone(),
            key,
            kind,
            finished: false,
        })
    }
}

/// Held for the duration of one submission. Dropping it unfinished counts as
/// a failure so the record can be retried.
#[derive(Debug)]
pub struct SubmitTicket {
    guard: SubmitGuard,
    key: SubmitKey,
    kind: SubmitKind,
    finished: bool,
}

impl SubmitTicket {
    pub fn succeed(mut self) {
        self.finish(true);
    }

    pub fn fail(mut self) {
        self.finish(false);
    }

    fn finish(&mut self, success: bool) {
        if self.finished {
            return;
        }
        self.finished = true;
        let event = match (self.kind, success) {
            (SubmitKind::Save, true) => RecordEvent::SaveSucceeded,
            (SubmitKind::Save, false) => RecordEvent::SaveFailed,
            (SubmitKind::Delete, true) => RecordEvent::DeleteSucceeded,
            (SubmitKind::Delete, false) => RecordEvent::DeleteFailed,
        };
        let had_id = matches!(self.key, SubmitKey::Record(_));
        let mut phases = self.guard.phases();
        let current = phases
            .get(&self.key)
            .copied()
            .unwrap_or_else(|| self.key.initial_phase());
        let settled = current
            .apply(event)
            .map(|phase| phase.settle(had_id))
            .unwrap_or_else(|_| current.settle(had_id));
        if settled == self.key.initial_phase() {
            phases.remove(&self.key);
        } else {
            phases.insert(self.key.clone(), settled);
        }
    }
}

impl Drop for SubmitTicket {
    fn drop(&mut self) {
        self.finish(false);
    }
}

#[cfg(test)]
mod tests {
    use super::{SubmitGuard, SubmitKey, SubmitKind};
    use crate::error::SyncError;
    use annals_core::{DraftId, HistoryId, RecordPhase};

    #[test]
    fn second_submit_is_rejected_while_pending() {
        let guard = SubmitGuard::new();
        let key = SubmitKey::Record(HistoryId::new("h1").expect("id"));
        let ticket = guard.begin(key.clone(), SubmitKind::Save).expect("first");
        assert_eq!(guard.phase(&key), RecordPhase::Saving);

        let err = guard.begin(key.clone(), SubmitKind::Delete).unwrap_err();
        assert!(matches!(err, SyncError::AlreadyPending(_)));

        ticket.succeed();
        assert_eq!(guard.phase(&key), RecordPhase::Saved);
        guard.begin(key, SubmitKind::Delete).expect("after settle");
    }

    #[test]
    fn dropped_ticket_allows_retry() {
        let guard = SubmitGuard::new();
        let key = SubmitKey::Draft(DraftId::new());
        {
            let _ticket = guard.begin(key.clone(), SubmitKind::Save).expect("begin");
        }
        assert_eq!(guard.phase(&key), RecordPhase::Draft);
        guard.begin(key, SubmitKind::Save).expect("retry").fail();
    }

    #[test]
    fn deleted_record_cannot_be_saved() {
        let guard = SubmitGuard::new();
        let key = SubmitKey::Record(HistoryId::new("h1").expect("id"));
        guard
            .begin(key.clone(), SubmitKind::Delete)
            .expect("delete")
            .succeed();
        assert_eq!(guard.phase(&key), RecordPhase::Deleted);
        let err = guard.begin(key, SubmitKind::Save).unwrap_err();
        assert!(matches!(err, SyncError::Core(_)));
    }
}
