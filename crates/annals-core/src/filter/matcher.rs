use crate::dto::HistoryRow;
use crate::filter::ast::{AttachmentSelector, FilterExpr};

pub fn matches(filter: &FilterExpr, row: &HistoryRow) -> bool {
    match filter {
        FilterExpr::And(terms) => terms.iter().all(|term| matches(term, row)),
        FilterExpr::Kind(kind) => &row.fields.kind == kind,
        FilterExpr::Result(needle) => row
            .fields
            .result
            .as_deref()
            .is_some_and(|result| contains_folded(result, needle)),
        FilterExpr::Owner(needle) => row
            .fields
            .owner
            .as_ref()
            .is_some_and(|owner| contains_folded(&owner.name, needle)),
        FilterExpr::After(ts) => row.fields.occurred_at >= *ts,
        FilterExpr::Before(ts) => row.fields.occurred_at < *ts,
        FilterExpr::Attachment(AttachmentSelector::With) => row.attachment.is_some(),
        FilterExpr::Attachment(AttachmentSelector::Without) => row.attachment.is_none(),
        FilterExpr::Text(needle) => text_matches(row, needle),
    }
}

fn text_matches(row: &HistoryRow, needle: &str) -> bool {
    let fields = &row.fields;
    contains_folded(&row.history.name, needle)
        || contains_folded(&fields.details, needle)
        || fields
            .regarding
            .as_deref()
            .is_some_and(|regarding| contains_folded(regarding, needle))
        || fields
            .result
            .as_deref()
            .is_some_and(|result| contains_folded(result, needle))
        || row
            .participants
            .iter()
            .any(|contact| contains_folded(&contact.name, needle))
}

fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

#[cfg(test)]
mod tests {
    use super::matches;
    use crate::domain::{
        Attachment, AttachmentId, ContactId, ContactRef, HistoryFields, HistoryId, HistoryKind,
        HistoryRef, UserId, UserRef,
    };
    use crate::dto::HistoryRow;
    use crate::filter::parse_filter;
    use crate::time::parse_local_timestamp;

    fn row() -> HistoryRow {
        let mut fields =
            HistoryFields::with_defaults(parse_local_timestamp("2030-01-15 10:00").unwrap(), None);
        fields.kind = HistoryKind::Call;
        fields.result = Some("Call Completed".to_string());
        fields.regarding = Some("Initial Consultation Fee $165".to_string());
        fields.details = "Discussed the invoice".to_string();
        fields.owner = Some(UserRef {
            id: UserId::new("U1").unwrap(),
            name: "Morgan Admin".to_string(),
        });
        HistoryRow {
            history: HistoryRef {
                id: HistoryId::new("H1").unwrap(),
                name: "Ada Lovelace".to_string(),
            },
            fields,
            participants: std::iter::once(ContactRef::new(
                ContactId::new("C1").unwrap(),
                "Ada Lovelace",
            ))
            .collect(),
            attachment: Some(Attachment {
                id: AttachmentId::new("A1").unwrap(),
                file_name: "notes.pdf".to_string(),
            }),
            modified_at: None,
        }
    }

    fn check(filter: &str) -> bool {
        matches(&parse_filter(filter).unwrap(), &row())
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(check(""));
    }

    #[test]
    fn structured_terms() {
        assert!(check("type:call result:completed owner:morgan has:attachment"));
        assert!(!check("type:meeting"));
        assert!(!check("no:attachment"));
    }

    #[test]
    fn date_bounds_include_the_named_day() {
        assert!(check("after:2030-01-15 before:2030-01-15"));
        assert!(!check("after:2030-01-16"));
        assert!(!check("before:2030-01-14"));
    }

    #[test]
    fn text_searches_details_regarding_and_participants() {
        assert!(check("INVOICE"));
        assert!(check("consultation"));
        assert!(check("lovelace"));
        assert!(!check("hopper"));
    }
}
