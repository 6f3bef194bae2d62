use crate::domain::HistoryKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentSelector {
    With,
    Without,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterExpr {
    Text(String),
    Kind(HistoryKind),
    Result(String),
    Owner(String),
    After(i64),
    Before(i64),
    Attachment(AttachmentSelector),
    And(Vec<FilterExpr>),
}

pub type HistoryFilter = FilterExpr;
