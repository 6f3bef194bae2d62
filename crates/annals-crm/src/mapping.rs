use crate::api::Record;
use crate::error::{CrmError, Result};
use crate::schema::fields;
use annals_core::time::{format_crm_datetime, parse_crm_datetime};
use annals_core::{
    display_name, AccountId, AccountRef, ApplicationId, Attachment, AttachmentId, Contact,
    ContactId, ContactRef, History, HistoryFields, HistoryId, HistoryKind, HistoryRef, JoinId,
    JoinRecord, Participants, User, UserId, UserRef, DEFAULT_DURATION_MINUTES,
};
use serde_json::{json, Value};

pub const STATUS_SUCCESS: &str = "Success";
pub const STATUS_ERROR: &str = "Error";

/// Body of a History record insert or update.
pub fn history_record(name: &str, fields: &HistoryFields) -> Record {
    let mut record = Record::new();
    record.insert(fields::NAME.to_string(), json!(name));
    put_activity_fields(&mut record, fields);
    if let Some(owner) = &fields.owner {
        record.insert(fields::OWNER.to_string(), json!({ "id": owner.id.as_str() }));
    }
    let stakeholder = match &fields.stakeholder {
        Some(account) => json!({ "id": account.id.as_str() }),
        None => Value::Null,
    };
    record.insert(fields::STAKEHOLDER.to_string(), stakeholder);
    record
}

/// Join row linking one contact to a history record, with the activity fields
/// copied so a contact's list renders without fetching the history record.
pub fn join_record(history: &HistoryRef, contact: &ContactRef, fields: &HistoryFields) -> Record {
    let mut record = Record::new();
    record.insert(
        fields::CONTACT_DETAILS.to_string(),
        json!({ "id": contact.id.as_str() }),
    );
    record.insert(
        fields::CONTACT_HISTORY_INFO.to_string(),
        json!({ "id": history.id.as_str() }),
    );
    put_activity_fields(&mut record, fields);
    record
}

pub fn application_history_record(
    application: &ApplicationId,
    name: &str,
    fields: &HistoryFields,
) -> Record {
    let mut record = Record::new();
    record.insert(fields::NAME.to_string(), json!(name));
    put_activity_fields(&mut record, fields);
    if let Some(owner) = &fields.owner {
        record.insert(fields::OWNER.to_string(), json!({ "id": owner.id.as_str() }));
    }
    record.insert(
        fields::APPLICATION.to_string(),
        json!({ "id": application.as_str() }),
    );
    record
}

pub fn application_contact_record(application_history_id: &str, contact: &ContactRef) -> Record {
    let mut record = Record::new();
    record.insert(
        fields::APPLICATION_HISTORY.to_string(),
        json!({ "id": application_history_id }),
    );
    record.insert(
        fields::CONTACT.to_string(),
        json!({ "id": contact.id.as_str() }),
    );
    record
}

/// Audit entry mirroring one remote write.
pub fn audit_record(
    action: &str,
    module: &str,
    request: &Value,
    response: &Value,
    success: bool,
) -> Record {
    let mut record = Record::new();
    record.insert(fields::NAME.to_string(), json!(action));
    record.insert(fields::MODULE_NAME.to_string(), json!(module));
    record.insert(
        fields::REQUEST_PAYLOAD.to_string(),
        json!(request.to_string()),
    );
    record.insert(fields::RESPONSE.to_string(), json!(response.to_string()));
    let status = if success {
        STATUS_SUCCESS
    } else {
        STATUS_ERROR
    };
    record.insert(fields::STATUS.to_string(), json!(status));
    record
}

fn put_activity_fields(record: &mut Record, fields: &HistoryFields) {
    record.insert(
        fields::HISTORY_TYPE.to_string(),
        json!(fields.kind.label()),
    );
    record.insert(
        fields::HISTORY_RESULT.to_string(),
        optional_string(fields.result.as_deref()),
    );
    record.insert(
        fields::REGARDING.to_string(),
        optional_string(fields.regarding.as_deref()),
    );
    record.insert(
        fields::HISTORY_DETAILS.to_string(),
        json!(fields.details),
    );
    record.insert(
        fields::DURATION.to_string(),
        json!(fields.duration_minutes.to_string()),
    );
    record.insert(
        fields::HISTORY_DATE_TIME.to_string(),
        json!(format_crm_datetime(fields.occurred_at)),
    );
}

fn optional_string(value: Option<&str>) -> Value {
    match value {
        Some(value) => json!(value),
        None => Value::Null,
    }
}

pub fn parse_history(module: &str, record: &Record) -> Result<History> {
    let id = HistoryId::new(&required_str(module, record, fields::ID)?)?;
    let name = str_field(record, fields::NAME).unwrap_or_default();
    let fields = HistoryFields {
        kind: parse_kind(record)?.unwrap_or_default(),
        result: str_field(record, fields::HISTORY_RESULT),
        regarding: str_field(record, fields::REGARDING),
        details: str_field(record, fields::HISTORY_DETAILS).unwrap_or_default(),
        duration_minutes: parse_duration(module, record)?.unwrap_or(DEFAULT_DURATION_MINUTES),
        occurred_at: parse_datetime(module, record, fields::HISTORY_DATE_TIME)?
            .unwrap_or_default(),
        owner: parse_lookup(record, fields::OWNER)
            .map(|(id, name)| UserId::new(&id).map(|id| UserRef { id, name }))
            .transpose()?,
        stakeholder: parse_lookup(record, fields::STAKEHOLDER)
            .map(|(id, name)| AccountId::new(&id).map(|id| AccountRef { id, name }))
            .transpose()?,
    };
    Ok(History {
        id,
        name,
        fields,
        participants: Participants::new(),
        attachment: None,
        modified_at: parse_datetime(module, record, fields::MODIFIED_TIME)?,
    })
}

pub fn parse_join(module: &str, record: &Record) -> Result<JoinRecord> {
    let id = JoinId::new(&required_str(module, record, fields::ID)?)?;
    let (contact_id, contact_name) =
        parse_lookup(record, fields::CONTACT_DETAILS).ok_or_else(|| missing(module, fields::CONTACT_DETAILS))?;
    let (history_id, history_name) = parse_lookup(record, fields::CONTACT_HISTORY_INFO)
        .ok_or_else(|| missing(module, fields::CONTACT_HISTORY_INFO))?;
    Ok(JoinRecord {
        id,
        history: HistoryRef {
            id: HistoryId::new(&history_id)?,
            name: history_name,
        },
        contact: ContactRef::new(ContactId::new(&contact_id)?, contact_name),
        kind: parse_kind(record)?,
        result: str_field(record, fields::HISTORY_RESULT),
        regarding: str_field(record, fields::REGARDING),
        details: str_field(record, fields::HISTORY_DETAILS),
        duration_minutes: parse_duration(module, record)?,
        occurred_at: parse_datetime(module, record, fields::HISTORY_DATE_TIME)?,
    })
}

pub fn parse_contact(module: &str, record: &Record) -> Result<Contact> {
    let id = ContactId::new(&required_str(module, record, fields::ID)?)?;
    let first_name = str_field(record, fields::FIRST_NAME);
    let last_name = str_field(record, fields::LAST_NAME);
    let full_name = str_field(record, fields::FULL_NAME)
        .unwrap_or_else(|| display_name(first_name.as_deref(), last_name.as_deref()));
    Ok(Contact {
        id,
        full_name,
        first_name,
        last_name,
        email: str_field(record, fields::EMAIL),
        mobile: str_field(record, fields::MOBILE),
        id_number: str_field(record, fields::ID_NUMBER),
    })
}

pub fn parse_account(module: &str, record: &Record) -> Result<AccountRef> {
    let id = AccountId::new(&required_str(module, record, fields::ID)?)?;
    let name = str_field(record, fields::ACCOUNT_NAME)
        .ok_or_else(|| missing(module, fields::ACCOUNT_NAME))?;
    Ok(AccountRef { id, name })
}

pub fn parse_user(module: &str, record: &Record) -> Result<User> {
    let id = UserId::new(&required_str(module, record, fields::ID)?)?;
    Ok(User {
        id,
        full_name: str_field(record, fields::USER_FULL_NAME).unwrap_or_default(),
        email: str_field(record, fields::USER_EMAIL),
    })
}

pub fn parse_attachment(module: &str, record: &Record) -> Result<Attachment> {
    Ok(Attachment {
        id: AttachmentId::new(&required_str(module, record, fields::ID)?)?,
        file_name: str_field(record, fields::FILE_NAME)
            .ok_or_else(|| missing(module, fields::FILE_NAME))?,
    })
}

/// Reads a lookup field of the shape `{"id": "...", "name": "..."}`.
pub fn parse_lookup(record: &Record, field: &str) -> Option<(String, String)> {
    let value = record.get(field)?.as_object()?;
    let id = value_as_string(value.get(fields::ID)?)?;
    let name = value
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Some((id, name))
}

pub fn record_id(record: &Record) -> Option<String> {
    record.get(fields::ID).and_then(value_as_string)
}

fn parse_kind(record: &Record) -> Result<Option<HistoryKind>> {
    match str_field(record, fields::HISTORY_TYPE) {
        Some(raw) => Ok(Some(raw.parse()?)),
        None => Ok(None),
    }
}

fn parse_duration(module: &str, record: &Record) -> Result<Option<u32>> {
    let Some(value) = record.get(fields::DURATION) else {
        return Ok(None);
    };
    let parsed = match value {
        Value::Null => return Ok(None),
        Value::Number(number) => number.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(text) if text.trim().is_empty() => return Ok(None),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    };
    parsed.map(Some).ok_or_else(|| CrmError::InvalidField {
        module: module.to_string(),
        field: fields::DURATION.to_string(),
        value: value.to_string(),
    })
}

fn parse_datetime(module: &str, record: &Record, field: &str) -> Result<Option<i64>> {
    match str_field(record, field) {
        Some(raw) => parse_crm_datetime(&raw)
            .map(Some)
            .map_err(|_| CrmError::InvalidField {
                module: module.to_string(),
                field: field.to_string(),
                value: raw,
            }),
        None => Ok(None),
    }
}

fn str_field(record: &Record, field: &str) -> Option<String> {
    record
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn required_str(module: &str, record: &Record, field: &str) -> Result<String> {
    record
        .get(field)
        .and_then(value_as_string)
        .ok_or_else(|| missing(module, field))
}

fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn missing(module: &str, field: &str) -> CrmError {
    CrmError::MissingField {
        module: module.to_string(),
        field: field.to_string(),
    }
}
