use crate::domain::HistoryKind;
use crate::filter::ast::{AttachmentSelector, FilterExpr, HistoryFilter};
use crate::filter::FilterParseError;
use crate::time::parse_local_timestamp;
use std::str::FromStr;

const DAY_SECONDS: i64 = 24 * 60 * 60;

pub fn parse_filter(input: &str) -> Result<HistoryFilter, FilterParseError> {
    let mut terms = Vec::new();

    for token in input.split_whitespace() {
        if let Some(raw) = token.strip_prefix("type:") {
            let raw = non_empty("type", raw)?;
            let kind = HistoryKind::from_str(raw)
                .map_err(|_| FilterParseError::InvalidKind(raw.to_string()))?;
            terms.push(FilterExpr::Kind(kind));
        } else if let Some(raw) = token.strip_prefix("result:") {
            let raw = non_empty("result", raw)?;
            terms.push(FilterExpr::Result(raw.to_lowercase()));
        } else if let Some(raw) = token.strip_prefix("owner:") {
            let raw = non_empty("owner", raw)?;
            terms.push(FilterExpr::Owner(raw.to_lowercase()));
        } else if let Some(raw) = token.strip_prefix("after:") {
            terms.push(FilterExpr::After(parse_day("after", raw)?));
        } else if let Some(raw) = token.strip_prefix("before:") {
            // Inclusive of the whole named day.
            terms.push(FilterExpr::Before(parse_day("before", raw)? + DAY_SECONDS));
        } else if let Some(raw) = token.strip_prefix("has:") {
            terms.push(FilterExpr::Attachment(parse_attachment(raw, true)?));
        } else if let Some(raw) = token.strip_prefix("no:") {
            terms.push(FilterExpr::Attachment(parse_attachment(raw, false)?));
        } else {
            terms.push(FilterExpr::Text(token.to_lowercase()));
        }
    }

    Ok(FilterExpr::And(terms))
}

fn non_empty<'a>(key: &str, raw: &'a str) -> Result<&'a str, FilterParseError> {
    if raw.is_empty() {
        return Err(FilterParseError::EmptyValue(key.to_string()));
    }
    Ok(raw)
}

fn parse_day(key: &str, raw: &str) -> Result<i64, FilterParseError> {
    let raw = non_empty(key, raw)?;
    parse_local_timestamp(raw).map_err(|_| FilterParseError::InvalidDate(raw.to_string()))
}

fn parse_attachment(raw: &str, with: bool) -> Result<AttachmentSelector, FilterParseError> {
    match raw {
        "attachment" if with => Ok(AttachmentSelector::With),
        "attachment" => Ok(AttachmentSelector::Without),
        _ => Err(FilterParseError::InvalidAttachmentSelector(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::parse_filter;
    use crate::domain::HistoryKind;
    use crate::filter::ast::{AttachmentSelector, FilterExpr};
    use crate::filter::FilterParseError;

    #[test]
    fn parse_type_and_text() {
        let filter = parse_filter("type:call invoice").unwrap();
        assert_eq!(
            filter,
            FilterExpr::And(vec![
                FilterExpr::Kind(HistoryKind::Call),
                FilterExpr::Text("invoice".to_string())
            ])
        );
    }

    #[test]
    fn parse_attachment_selectors() {
        let filter = parse_filter("has:attachment no:attachment").unwrap();
        assert_eq!(
            filter,
            FilterExpr::And(vec![
                FilterExpr::Attachment(AttachmentSelector::With),
                FilterExpr::Attachment(AttachmentSelector::Without)
            ])
        );
    }

    #[test]
    fn empty_value_is_error() {
        let err = parse_filter("owner:").unwrap_err();
        assert_eq!(err, FilterParseError::EmptyValue("owner".to_string()));
    }

    #[test]
    fn invalid_date_is_error() {
        let err = parse_filter("after:someday").unwrap_err();
        assert_eq!(err, FilterParseError::InvalidDate("someday".to_string()));
    }

    #[test]
    fn invalid_attachment_selector_is_error() {
        let err = parse_filter("has:photos").unwrap_err();
        assert_eq!(
            err,
            FilterParseError::InvalidAttachmentSelector("photos".to_string())
        );
    }
}
