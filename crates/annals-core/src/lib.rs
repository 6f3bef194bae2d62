pub mod book;
pub mod domain;
pub mod dto;
pub mod error;
pub mod filter;
pub mod rules;
pub mod time;
pub mod view;

pub use book::HistoryBook;
pub use domain::*;
pub use dto::*;
pub use error::CoreError;
pub use filter::{parse_filter, FilterExpr, FilterParseError, HistoryFilter};
pub use rules::*;
