use crate::domain::HistoryFields;
use crate::error::CoreError;
use crate::rules::duration::validate_duration;
use crate::rules::results::validate_result;

pub fn validate_fields(fields: &HistoryFields) -> Result<(), CoreError> {
    validate_duration(fields.duration_minutes)?;
    if let Some(result) = &fields.result {
        validate_result(&fields.kind, result)?;
    }
    if fields.occurred_at < 0 {
        return Err(CoreError::InvalidTimestamp);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::validate_fields;
    use crate::domain::{HistoryFields, HistoryKind};
    use crate::error::CoreError;

    #[test]
    fn defaults_are_valid() {
        let fields = HistoryFields::with_defaults(1_700_000_000, None);
        assert!(validate_fields(&fields).is_ok());
    }

    #[test]
    fn mismatched_result_is_rejected() {
        let mut fields = HistoryFields::with_defaults(1_700_000_000, None);
        fields.kind = HistoryKind::Note;
        fields.result = Some("Call Completed".to_string());
        assert!(matches!(
            validate_fields(&fields),
            Err(CoreError::InvalidResult { .. })
        ));
    }
}
