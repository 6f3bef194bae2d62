pub mod api;
pub mod error;
pub mod host;
pub mod mapping;
pub mod memory;
#[cfg(feature = "rest")]
pub mod rest;
pub mod schema;

pub use api::{CrmApi, Page, Record, Search, Trigger, WriteOutcome, WriteStatus};
pub use error::{CrmError, Result};
pub use host::{HostEnvironment, PageContext, StaticHost};
pub use memory::{Call, MemoryCrm, Operation, Relation};
#[cfg(feature = "rest")]
pub use rest::RestCrm;
pub use schema::{ModuleNames, RelatedLists};
