use crate::controller::HistorySync;
use crate::error::Result;
use annals_core::{AccountId, AccountRef, Contact, ContactId, ContactSearchField, User, UserId};
use annals_crm::mapping::{parse_account, parse_contact, parse_user};
use annals_crm::Search;
use tracing::debug;

impl HistorySync {
    /// Participant picker search. Blank input returns nothing without a call.
    pub async fn search_contacts(
        &self,
        field: ContactSearchField,
        text: &str,
    ) -> Result<Vec<Contact>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }
        let search = match field {
            ContactSearchField::Email => Search::Email(text.to_string()),
            other => Search::equals(other.api_name(), text),
        };
        let records = self
            .crm
            .search_records(&self.modules.contacts, &search, self.page())
            .await?;
        debug!(field = field.api_name(), hits = records.len(), "contact search");
        let contacts = records
            .iter()
            .map(|record| parse_contact(&self.modules.contacts, record))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(contacts)
    }

    /// Stakeholder picker search.
    pub async fn search_accounts(&self, text: &str) -> Result<Vec<AccountRef>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }
        let records = self
            .crm
            .search_records(
                &self.modules.accounts,
                &Search::Word(text.to_string()),
                self.page(),
            )
            .await?;
        let accounts = records
            .iter()
            .map(|record| parse_account(&self.modules.accounts, record))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(accounts)
    }

    pub async fn get_user(&self, id: &UserId) -> Result<Option<User>> {
        let Some(record) = self.crm.get_record(&self.modules.users, id.as_str()).await? else {
            return Ok(None);
        };
        Ok(Some(parse_user(&self.modules.users, &record)?))
    }

    pub async fn get_contact(&self, id: &ContactId) -> Result<Option<Contact>> {
        let Some(record) = self
            .crm
            .get_record(&self.modules.contacts, id.as_str())
            .await?
        else {
            return Ok(None);
        };
        Ok(Some(parse_contact(&self.modules.contacts, &record)?))
    }

    pub async fn get_account(&self, id: &AccountId) -> Result<Option<AccountRef>> {
        let Some(record) = self
            .crm
            .get_record(&self.modules.accounts, id.as_str())
            .await?
        else {
            return Ok(None);
        };
        Ok(Some(parse_account(&self.modules.accounts, &record)?))
    }
}
