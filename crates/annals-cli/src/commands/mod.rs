use crate::error::invalid_input;
use crate::util::parse_contact_id;
use annals_config::AppConfig;
use annals_core::ContactId;
use annals_crm::HostEnvironment;
use annals_sync::{HistorySync, SyncError, Synced};
use anyhow::Result;
use serde::Serialize;
use std::io::{self, Write};

pub mod history;
pub mod lookup;
pub mod options;

pub struct Context<'a> {
    pub sync: &'a HistorySync,
    pub json: bool,
    pub config: &'a AppConfig,
    pub host: &'a dyn HostEnvironment,
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

impl Context<'_> {
    /// The contact whose page the widget is mounted on.
    pub fn current_contact(&self) -> Result<ContactId> {
        contact_on_page(self.host, &self.config.modules.contacts)
    }
}

pub fn contact_on_page(host: &dyn HostEnvironment, contacts_module: &str) -> Result<ContactId> {
    let page = host
        .page_context()
        .ok_or_else(|| invalid_input("widget is not mounted on a record page"))?;
    if page.entity != contacts_module {
        return Err(invalid_input(format!(
            "widget is mounted on {}, not {contacts_module}",
            page.entity
        )));
    }
    parse_contact_id(&page.record_id)
}

#[derive(Debug, Serialize)]
pub struct SyncedDto<T> {
    pub value: T,
    pub warnings: Vec<String>,
}

/// Prints child-operation warnings to stderr and hands back the value.
pub fn report_warnings<T>(synced: Synced<T>) -> (T, Vec<String>) {
    let warnings: Vec<String> = synced.warnings.iter().map(SyncError::to_string).collect();
    for warning in &warnings {
        eprintln!("warning: {warning}");
    }
    (synced.value, warnings)
}

#[cfg(test)]
mod tests {
    use super::contact_on_page;
    use annals_crm::{PageContext, StaticHost};

    fn host(entity: &str, record_id: &str) -> StaticHost {
        StaticHost::new(Some(PageContext {
            entity: entity.to_string(),
            record_id: record_id.to_string(),
        }))
    }

    #[test]
    fn contact_page_yields_contact_id() {
        let contact = contact_on_page(&host("Contacts", "c1"), "Contacts").expect("contact");
        assert_eq!(contact.as_str(), "c1");
    }

    #[test]
    fn other_pages_are_rejected() {
        assert!(contact_on_page(&host("Accounts", "a1"), "Contacts").is_err());
        assert!(contact_on_page(&host("Contacts", " "), "Contacts").is_err());
        assert!(contact_on_page(&StaticHost::new(None), "Contacts").is_err());
    }
}
