mod ast;
mod matcher;
mod parser;

use thiserror::Error;

pub use ast::{AttachmentSelector, FilterExpr, HistoryFilter};
pub use matcher::matches;
pub use parser::parse_filter;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterParseError {
    #[error("empty value for {0}")]
    EmptyValue(String),
    #[error("invalid type: {0}")]
    InvalidKind(String),
    #[error("invalid date: {0}")]
    InvalidDate(String),
    #[error("invalid attachment selector: {0}")]
    InvalidAttachmentSelector(String),
}
