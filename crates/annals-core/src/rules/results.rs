use crate::domain::HistoryKind;
use crate::error::CoreError;

const MEETING_RESULTS: &[&str] = &[
    "Meeting Held",
    "Meeting Not Held",
    "Meeting Rescheduled",
    "Meeting Cancelled",
];
const CALL_RESULTS: &[&str] = &[
    "Call Completed",
    "Call Attempted",
    "Call Left Message",
    "Call Received",
];
const EMAIL_RESULTS: &[&str] = &["Email Sent", "Email Received", "Email Bounced"];
const NOTE_RESULTS: &[&str] = &["Note Added"];
const TODO_RESULTS: &[&str] = &["To-do Done", "To-do Not Done"];
const APPOINTMENT_RESULTS: &[&str] = &[
    "Appointment Booked",
    "Appointment Completed",
    "Appointment Rescheduled",
    "Appointment Cancelled",
];

/// Results offered for a type. `None` means the type accepts any result.
pub fn allowed_results(kind: &HistoryKind) -> Option<&'static [&'static str]> {
    match kind {
        HistoryKind::Meeting => Some(MEETING_RESULTS),
        HistoryKind::Call => Some(CALL_RESULTS),
        HistoryKind::Email => Some(EMAIL_RESULTS),
        HistoryKind::Note => Some(NOTE_RESULTS),
        HistoryKind::ToDo => Some(TODO_RESULTS),
        HistoryKind::Appointment => Some(APPOINTMENT_RESULTS),
        HistoryKind::Other(_) => None,
    }
}

/// Matches the result against the table case-insensitively and returns the
/// canonical spelling.
pub fn validate_result(kind: &HistoryKind, result: &str) -> Result<String, CoreError> {
    let trimmed = result.trim();
    let invalid = || CoreError::InvalidResult {
        kind: kind.label().to_string(),
        result: result.to_string(),
    };
    if trimmed.is_empty() {
        return Err(invalid());
    }
    match allowed_results(kind) {
        None => Ok(trimmed.to_string()),
        Some(options) => options
            .iter()
            .find(|option| option.eq_ignore_ascii_case(trimmed))
            .map(|option| option.to_string())
            .ok_or_else(invalid),
    }
}
