use crate::error::{LinkAction, SyncError};
use crate::remote::AuditedWriter;
use annals_core::{ContactRef, HistoryFields, HistoryId, HistoryRef, JoinRecord};
use annals_crm::mapping::{join_record, parse_join};
use annals_crm::schema::fields::JOIN_FIELDS;
use annals_crm::{CrmApi, CrmError, ModuleNames, Page, Record, RelatedLists};
use futures::future::join_all;
use tracing::warn;

/// Reads a related list page by page, starting at `page`, until a short page
/// comes back.
pub(crate) async fn all_related(
    crm: &dyn CrmApi,
    module: &str,
    id: &str,
    related_list: &str,
    fields: &[&str],
    mut page: Page,
) -> Result<Vec<Record>, CrmError> {
    let mut records = Vec::new();
    loop {
        let batch = crm
            .get_related_records(module, id, related_list, fields, page)
            .await?;
        let short = batch.len() < page.per_page as usize;
        records.extend(batch);
        if short {
            return Ok(records);
        }
        page.page += 1;
    }
}

/// Current join rows of a history record, read from the CRM.
pub(crate) async fn load_joins(
    crm: &dyn CrmApi,
    modules: &ModuleNames,
    related: &RelatedLists,
    history_id: &HistoryId,
    page: Page,
) -> Result<Vec<JoinRecord>, CrmError> {
    let records = all_related(
        crm,
        &modules.history,
        history_id.as_str(),
        &related.history_contacts,
        &JOIN_FIELDS,
        page,
    )
    .await?;
    records
        .iter()
        .map(|record| parse_join(&modules.history_contacts, record))
        .collect()
}

/// Inserts one join row per contact concurrently. Returns the failures.
pub(crate) async fn link(
    writer: &AuditedWriter,
    join_module: &str,
    history: &HistoryRef,
    contacts: &[ContactRef],
    fields: &HistoryFields,
) -> Vec<SyncError> {
    let inserts = contacts.iter().map(|contact| async move {
        let record = join_record(history, contact, fields);
        writer
            .insert(join_module, record)
            .await
            .map_err(|reason| link_failed(LinkAction::Insert, contact, reason))
    });
    collect_failures(join_all(inserts).await)
}

/// Deletes the given join rows concurrently. Returns the failures.
pub(crate) async fn unlink(
    writer: &AuditedWriter,
    join_module: &str,
    joins: &[JoinRecord],
) -> Vec<SyncError> {
    let deletes = joins.iter().map(|join| async move {
        writer
            .delete(join_module, join.id.as_str())
            .await
            .map_err(|reason| link_failed(LinkAction::Delete, &join.contact, reason))
    });
    collect_failures(join_all(deletes).await)
}

fn link_failed(action: LinkAction, contact: &ContactRef, reason: String) -> SyncError {
    let err = SyncError::LinkOpFailed {
        action,
        contact: contact.id.to_string(),
        reason,
    };
    warn!("{err}");
    err
}

fn collect_failures<T>(results: Vec<Result<T, SyncError>>) -> Vec<SyncError> {
    results.into_iter().filter_map(Result::err).collect()
}
