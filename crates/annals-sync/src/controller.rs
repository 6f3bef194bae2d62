use crate::attachments::{self, first_attachment};
use crate::audit::{AuditLog, AuditSummary};
use crate::error::{AttachmentAction, LinkAction, Result, SyncError, Synced};
use crate::guard::{SubmitGuard, SubmitKey, SubmitKind};
use crate::participants::{all_related, link, load_joins, unlink};
use crate::remote::AuditedWriter;
use annals_core::{
    diff_participants, history_name, ApplicationId, ContactId, ContactRef, HistoryBook,
    HistoryDraft, HistoryFields, HistoryId, HistoryRef, HistoryRow, JoinRecord, Participants,
    StagedFile,
};
use annals_crm::mapping::{
    application_contact_record, application_history_record, parse_history, parse_join,
};
use annals_crm::schema::fields::JOIN_FIELDS;
use annals_crm::{CrmApi, ModuleNames, Page, RelatedLists};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Compare `Modified_Time` before an update and refuse stale writes.
    pub conflict_check: bool,
    pub page_size: u32,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            conflict_check: false,
            page_size: annals_crm::api::MAX_PER_PAGE,
        }
    }
}

/// Result of moving a history record under an application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovedHistory {
    pub source: HistoryId,
    pub application: ApplicationId,
    pub application_history_id: String,
    pub participants: Participants,
}

/// Keeps local history rows consistent with the History, join and attachment
/// collections of the CRM.
pub struct HistorySync {
    pub(crate) crm: Arc<dyn CrmApi>,
    pub(crate) modules: ModuleNames,
    pub(crate) related: RelatedLists,
    writer: AuditedWriter,
    audit: AuditLog,
    guard: SubmitGuard,
    options: SyncOptions,
}

impl HistorySync {
    pub fn new(crm: Arc<dyn CrmApi>, modules: ModuleNames, related: RelatedLists) -> Self {
        let audit = AuditLog::disabled();
        Self {
            writer: AuditedWriter::new(Arc::clone(&crm), audit.clone()),
            crm,
            modules,
            related,
            audit,
            guard: SubmitGuard::new(),
            options: SyncOptions::default(),
        }
    }

    pub fn with_audit(mut self, audit: AuditLog) -> Self {
        self.writer = AuditedWriter::new(Arc::clone(&self.crm), audit.clone());
        self.audit = audit;
        self
    }

    pub fn with_options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    pub fn guard(&self) -> &SubmitGuard {
        &self.guard
    }

    pub fn modules(&self) -> &ModuleNames {
        &self.modules
    }

    pub async fn flush_audit(&self) -> AuditSummary {
        self.audit.flush().await
    }

    pub(crate) fn page(&self) -> Page {
        Page::first(self.options.page_size)
    }

    /// Rows of a contact's history list, built from its join rows.
    pub async fn load_rows(&self, contact_id: &ContactId) -> Result<HistoryBook> {
        let records = all_related(
            self.crm.as_ref(),
            &self.modules.contacts,
            contact_id.as_str(),
            &self.related.contact_history,
            &JOIN_FIELDS,
            self.page(),
        )
        .await?;
        let rows = records
            .iter()
            .map(|record| parse_join(&self.modules.history_contacts, record))
            .map(|join| join.map(|join| HistoryRow::from_join(&join)))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        debug!(contact = %contact_id, rows = rows.len(), "loaded history rows");
        Ok(HistoryBook::new(rows))
    }

    /// Full history record with participants and its attachment.
    pub async fn load_detail(&self, id: &HistoryId) -> Result<Synced<HistoryRow>> {
        let record = self
            .crm
            .get_record(&self.modules.history, id.as_str())
            .await?
            .ok_or_else(|| SyncError::NotFound(id.to_string()))?;
        let mut history = parse_history(&self.modules.history, &record)?;
        let joins = load_joins(
            self.crm.as_ref(),
            &self.modules,
            &self.related,
            id,
            self.page(),
        )
        .await?;
        history.participants = joins.into_iter().map(|join| join.contact).collect();

        let mut warnings = Vec::new();
        match first_attachment(self.crm.as_ref(), &self.modules.history, id.as_str()).await {
            Ok(attachment) => history.attachment = attachment,
            Err(err) => warnings.push(attachments::failed(
                AttachmentAction::List,
                id.as_str(),
                err.to_string(),
            )),
        }
        Ok(Synced::new(history.into(), warnings))
    }

    pub async fn create_history(
        &self,
        draft: &HistoryDraft,
        participants: Participants,
        current_contact: &ContactRef,
        staged: Option<&StagedFile>,
    ) -> Result<Synced<HistoryRow>> {
        draft.fields.validate()?;
        let ticket = self
            .guard
            .begin(SubmitKey::Draft(draft.draft_id), SubmitKind::Save)?;

        let participants = participants.or_current(current_contact);
        let name = history_name(participants.iter());
        let record = annals_crm::mapping::history_record(&name, &draft.fields);
        let outcome = match self.writer.insert(&self.modules.history, record).await {
            Ok(outcome) => outcome,
            Err(reason) => {
                ticket.fail();
                return Err(SyncError::CreateFailed(reason));
            }
        };
        let raw_id = outcome.id.unwrap_or_default();
        let id = HistoryId::new(&raw_id).map_err(|_| SyncError::MissingId)?;
        debug!(history = %id, "history record created");

        let mut warnings = Vec::new();
        let mut attachment = None;
        if let Some(file) = staged {
            match attachments::upload(&self.writer, &self.modules.history, id.as_str(), file).await
            {
                Ok(uploaded) => attachment = Some(uploaded),
                Err(err) => warnings.push(err),
            }
        }

        let history = HistoryRef { id, name };
        warnings.extend(
            link(
                &self.writer,
                &self.modules.history_contacts,
                &history,
                participants.as_slice(),
                &draft.fields,
            )
            .await,
        );

        ticket.succeed();
        Ok(Synced::new(
            HistoryRow {
                history,
                fields: draft.fields.clone(),
                participants,
                attachment,
                modified_at: None,
            },
            warnings,
        ))
    }

    pub async fn update_history(
        &self,
        selected: &HistoryRow,
        fields: HistoryFields,
        participants: Participants,
        staged: Option<&StagedFile>,
    ) -> Result<Synced<HistoryRow>> {
        let id = selected.id().clone();
        fields.validate()?;
        let ticket = self
            .guard
            .begin(SubmitKey::Record(id.clone()), SubmitKind::Save)?;

        if self.options.conflict_check {
            self.check_conflict(selected).await?;
        }

        let name = history_name(participants.iter());
        let record = annals_crm::mapping::history_record(&name, &fields);
        if let Err(reason) = self
            .writer
            .update(&self.modules.history, id.as_str(), record)
            .await
        {
            ticket.fail();
            return Err(SyncError::UpdateFailed {
                id: id.to_string(),
                reason,
            });
        }

        let (attachment, mut warnings) = attachments::replace(
            self.crm.as_ref(),
            &self.writer,
            &self.modules.history,
            id.as_str(),
            selected.attachment.as_ref(),
            staged,
        )
        .await;

        let history = HistoryRef {
            id: id.clone(),
            name,
        };
        match load_joins(
            self.crm.as_ref(),
            &self.modules,
            &self.related,
            &id,
            self.page(),
        )
        .await
        {
            Ok(joins) => {
                let diff = diff_participants(&joins, participants.as_slice());
                debug!(
                    history = %id,
                    delete = diff.to_delete.len(),
                    add = diff.to_add.len(),
                    unchanged = diff.unchanged.len(),
                    "participant diff"
                );
                warnings.extend(
                    unlink(&self.writer, &self.modules.history_contacts, &diff.to_delete).await,
                );
                warnings.extend(
                    link(
                        &self.writer,
                        &self.modules.history_contacts,
                        &history,
                        &diff.to_add,
                        &fields,
                    )
                    .await,
                );
            }
            Err(err) => {
                let err = SyncError::LinkOpFailed {
                    action: LinkAction::List,
                    contact: id.to_string(),
                    reason: err.to_string(),
                };
                warn!("{err}");
                warnings.push(err);
            }
        }

        let modified_at = if self.options.conflict_check {
            self.remote_modified_at(&id).await
        } else {
            None
        };

        ticket.succeed();
        Ok(Synced::new(
            HistoryRow {
                history,
                fields,
                participants,
                attachment,
                modified_at,
            },
            warnings,
        ))
    }

    pub async fn delete_history(&self, selected: &HistoryRow) -> Result<Synced<HistoryId>> {
        let id = selected.id().clone();
        let ticket = self
            .guard
            .begin(SubmitKey::Record(id.clone()), SubmitKind::Delete)?;
        match self.delete_with_joins(&id).await {
            Ok(deleted) => {
                ticket.succeed();
                Ok(deleted.map(|_| id))
            }
            Err(err) => {
                ticket.fail();
                Err(err)
            }
        }
    }

    /// Deletes the record, then recreates it as an application history entry
    /// linked to the same contacts.
    pub async fn move_to_application(
        &self,
        selected: &HistoryRow,
        application: &ApplicationId,
    ) -> Result<Synced<MovedHistory>> {
        let id = selected.id().clone();
        let ticket = self
            .guard
            .begin(SubmitKey::Record(id.clone()), SubmitKind::Delete)?;
        let deleted = match self.delete_with_joins(&id).await {
            Ok(deleted) => deleted,
            Err(err) => {
                ticket.fail();
                return Err(err);
            }
        };
        // The source is gone from here on, whatever happens next.
        ticket.succeed();

        let mut warnings = deleted.warnings;
        let mut participants: Participants = deleted
            .value
            .into_iter()
            .map(|join| join.contact)
            .collect();
        if participants.is_empty() {
            participants = selected.participants.clone();
        }

        let record = application_history_record(application, selected.name(), &selected.fields);
        let outcome = self
            .writer
            .insert(&self.modules.application_history, record)
            .await
            .map_err(SyncError::CreateFailed)?;
        let application_history_id = outcome.id.unwrap_or_default();

        let inserts = participants.iter().map(|contact| {
            let record = application_contact_record(&application_history_id, contact);
            async move {
                self.writer
                    .insert(&self.modules.application_contacts, record)
                    .await
                    .map_err(|reason| {
                        let err = SyncError::LinkOpFailed {
                            action: LinkAction::Insert,
                            contact: contact.id.to_string(),
                            reason,
                        };
                        warn!("{err}");
                        err
                    })
            }
        });
        warnings.extend(join_all(inserts).await.into_iter().filter_map(|r| r.err()));

        Ok(Synced::new(
            MovedHistory {
                source: id,
                application: application.clone(),
                application_history_id,
                participants,
            },
            warnings,
        ))
    }

    /// Fetches the join rows, deletes them, then deletes the parent. Returns
    /// the join rows that were found.
    async fn delete_with_joins(&self, id: &HistoryId) -> Result<Synced<Vec<JoinRecord>>> {
        let joins = load_joins(
            self.crm.as_ref(),
            &self.modules,
            &self.related,
            id,
            self.page(),
        )
        .await
        .map_err(|err| SyncError::DeleteFailed {
            id: id.to_string(),
            reason: format!("could not list participants: {err}"),
        })?;

        let warnings = unlink(&self.writer, &self.modules.history_contacts, &joins).await;

        self.writer
            .delete(&self.modules.history, id.as_str())
            .await
            .map_err(|reason| SyncError::DeleteFailed {
                id: id.to_string(),
                reason,
            })?;
        debug!(history = %id, joins = joins.len(), "history record deleted");
        Ok(Synced::new(joins, warnings))
    }

    async fn check_conflict(&self, selected: &HistoryRow) -> Result<()> {
        let id = selected.id();
        let record = self
            .crm
            .get_record(&self.modules.history, id.as_str())
            .await?
            .ok_or_else(|| SyncError::NotFound(id.to_string()))?;
        let remote = parse_history(&self.modules.history, &record)?;
        match (selected.modified_at, remote.modified_at) {
            (Some(loaded), Some(current)) if loaded != current => {
                Err(SyncError::Conflict(id.to_string()))
            }
            _ => Ok(()),
        }
    }

    async fn remote_modified_at(&self, id: &HistoryId) -> Option<i64> {
        let record = match self.crm.get_record(&self.modules.history, id.as_str()).await {
            Ok(record) => record?,
            Err(err) => {
                warn!(history = %id, "could not refresh modified time: {err}");
                return None;
            }
        };
        parse_history(&self.modules.history, &record)
            .ok()
            .and_then(|history| history.modified_at)
    }
}
