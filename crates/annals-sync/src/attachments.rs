use crate::error::{AttachmentAction, SyncError};
use crate::remote::AuditedWriter;
use annals_core::{Attachment, AttachmentId, StagedFile};
use annals_crm::{CrmApi, CrmError};
use tracing::warn;

/// The single attachment a history record keeps: the first one listed.
pub(crate) async fn first_attachment(
    crm: &dyn CrmApi,
    module: &str,
    id: &str,
) -> Result<Option<Attachment>, CrmError> {
    let attachments = crm.list_attachments(module, id).await?;
    Ok(attachments.into_iter().next())
}

pub(crate) async fn upload(
    writer: &AuditedWriter,
    module: &str,
    id: &str,
    file: &StagedFile,
) -> Result<Attachment, SyncError> {
    let outcome = writer
        .upload(module, id, file)
        .await
        .map_err(|reason| failed(AttachmentAction::Upload, id, reason))?;
    let Some(raw_id) = outcome.id.as_deref() else {
        return Err(failed(
            AttachmentAction::Upload,
            id,
            "crm response did not include the attachment id".to_string(),
        ));
    };
    let attachment_id = AttachmentId::new(raw_id)
        .map_err(|err| failed(AttachmentAction::Upload, id, err.to_string()))?;
    Ok(Attachment {
        id: attachment_id,
        file_name: file.file_name().to_string(),
    })
}

/// Deletes every attachment the CRM lists for the record, then uploads the
/// staged file. The upload is skipped unless all deletes went through, so the
/// record never ends up with more than one attachment. Failures are returned
/// as warnings along with what the record is left with; when the listing
/// fails nothing is touched and `loaded` is kept.
pub(crate) async fn replace(
    crm: &dyn CrmApi,
    writer: &AuditedWriter,
    module: &str,
    id: &str,
    loaded: Option<&Attachment>,
    staged: Option<&StagedFile>,
) -> (Option<Attachment>, Vec<SyncError>) {
    let current = match crm.list_attachments(module, id).await {
        Ok(current) => current,
        Err(err) => {
            let warning = failed(AttachmentAction::List, id, err.to_string());
            return (loaded.cloned(), vec![warning]);
        }
    };

    let mut warnings = Vec::new();
    let mut remaining = Vec::new();
    for attachment in current {
        if let Err(reason) = writer
            .delete_attachment(module, id, attachment.id.as_str())
            .await
        {
            warnings.push(failed(AttachmentAction::Delete, id, reason));
            remaining.push(attachment);
        }
    }
    if !remaining.is_empty() {
        return (remaining.into_iter().next(), warnings);
    }

    let Some(file) = staged else {
        return (None, warnings);
    };
    match upload(writer, module, id, file).await {
        Ok(attachment) => (Some(attachment), warnings),
        Err(err) => {
            warnings.push(err);
            (None, warnings)
        }
    }
}

pub(crate) fn failed(action: AttachmentAction, id: &str, reason: String) -> SyncError {
    let err = SyncError::AttachmentOpFailed {
        action,
        id: id.to_string(),
        reason,
    };
    warn!("{err}");
    err
}
