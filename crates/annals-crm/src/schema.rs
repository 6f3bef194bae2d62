use serde::Deserialize;

/// API names of the CRM modules the widget touches.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModuleNames {
    pub history: String,
    pub history_contacts: String,
    pub contacts: String,
    pub accounts: String,
    pub users: String,
    pub audit_log: String,
    pub application_history: String,
    pub application_contacts: String,
}

impl Default for ModuleNames {
    fn default() -> Self {
        Self {
            history: "History1".to_string(),
            history_contacts: "History_X_Contacts".to_string(),
            contacts: "Contacts".to_string(),
            accounts: "Accounts".to_string(),
            users: "users".to_string(),
            audit_log: "Log_Module".to_string(),
            application_history: "Application_History".to_string(),
            application_contacts: "ApplicationxContacts".to_string(),
        }
    }
}

impl ModuleNames {
    pub fn first_empty(&self) -> Option<&'static str> {
        [
            ("history", &self.history),
            ("history_contacts", &self.history_contacts),
            ("contacts", &self.contacts),
            ("accounts", &self.accounts),
            ("users", &self.users),
            ("audit_log", &self.audit_log),
            ("application_history", &self.application_history),
            ("application_contacts", &self.application_contacts),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(key, _)| key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RelatedLists {
    /// Join rows of a contact.
    pub contact_history: String,
    /// Join rows of a history record.
    pub history_contacts: String,
}

impl Default for RelatedLists {
    fn default() -> Self {
        Self {
            contact_history: "History3".to_string(),
            history_contacts: "Contacts3".to_string(),
        }
    }
}

impl RelatedLists {
    pub fn first_empty(&self) -> Option<&'static str> {
        if self.contact_history.trim().is_empty() {
            return Some("contact_history");
        }
        if self.history_contacts.trim().is_empty() {
            return Some("history_contacts");
        }
        None
    }
}

pub mod fields {
    pub const ID: &str = "id";
    pub const NAME: &str = "Name";
    pub const HISTORY_TYPE: &str = "History_Type";
    pub const HISTORY_RESULT: &str = "History_Result";
    pub const REGARDING: &str = "Regarding";
    pub const HISTORY_DETAILS: &str = "History_Details";
    pub const DURATION: &str = "duration_min";
    pub const HISTORY_DATE_TIME: &str = "History_Date_Time";
    pub const OWNER: &str = "Owner";
    pub const STAKEHOLDER: &str = "Stakeholder";
    pub const MODIFIED_TIME: &str = "Modified_Time";

    pub const CONTACT_DETAILS: &str = "Contact_Details";
    pub const CONTACT_HISTORY_INFO: &str = "Contact_History_Info";

    pub const FULL_NAME: &str = "Full_Name";
    pub const FIRST_NAME: &str = "First_Name";
    pub const LAST_NAME: &str = "Last_Name";
    pub const EMAIL: &str = "Email";
    pub const MOBILE: &str = "Mobile";
    pub const ID_NUMBER: &str = "ID_Number";

    pub const ACCOUNT_NAME: &str = "Account_Name";

    pub const USER_FULL_NAME: &str = "full_name";
    pub const USER_EMAIL: &str = "email";

    pub const MODULE_NAME: &str = "Module_Name";
    pub const REQUEST_PAYLOAD: &str = "Request_Payload";
    pub const RESPONSE: &str = "Response";
    pub const STATUS: &str = "Status";

    pub const APPLICATION: &str = "Application";
    pub const CONTACT: &str = "Contact";
    pub const APPLICATION_HISTORY: &str = "Application_History";

    pub const FILE_NAME: &str = "File_Name";

    pub const JOIN_FIELDS: [&str; 9] = [
        ID,
        CONTACT_DETAILS,
        CONTACT_HISTORY_INFO,
        HISTORY_TYPE,
        HISTORY_RESULT,
        REGARDING,
        HISTORY_DETAILS,
        DURATION,
        HISTORY_DATE_TIME,
    ];
}
