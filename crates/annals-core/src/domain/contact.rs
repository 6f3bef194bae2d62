use crate::domain::ids::ContactId;
use serde::{Deserialize, Serialize};

pub const UNKNOWN_CONTACT_NAME: &str = "Unknown Name";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub full_name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub id_number: Option<String>,
}

impl Contact {
    pub fn to_ref(&self) -> ContactRef {
        ContactRef {
            id: self.id.clone(),
            name: self.full_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRef {
    pub id: ContactId,
    pub name: String,
}

impl ContactRef {
    pub fn new(id: ContactId, name: impl Into<String>) -> Self {
        let name = name.into();
        let name = if name.trim().is_empty() {
            UNKNOWN_CONTACT_NAME.to_string()
        } else {
            name.trim().to_string()
        };
        Self { id, name }
    }
}

pub fn display_name(first: Option<&str>, last: Option<&str>) -> String {
    let parts: Vec<&str> = [first, last]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();
    if parts.is_empty() {
        UNKNOWN_CONTACT_NAME.to_string()
    } else {
        parts.join(" ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContactSearchField {
    FirstName,
    LastName,
    Email,
    Mobile,
    IdNumber,
}

impl ContactSearchField {
    pub fn api_name(self) -> &'static str {
        match self {
            ContactSearchField::FirstName => "First_Name",
            ContactSearchField::LastName => "Last_Name",
            ContactSearchField::Email => "Email",
            ContactSearchField::Mobile => "Mobile",
            ContactSearchField::IdNumber => "ID_Number",
        }
    }
}

/// Participants of a history record: insertion ordered, unique by contact id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Participants(Vec<ContactRef>);

impl Participants {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn contains(&self, id: &ContactId) -> bool {
        self.0.iter().any(|contact| &contact.id == id)
    }

    pub fn insert(&mut self, contact: ContactRef) -> bool {
        if self.contains(&contact.id) {
            return false;
        }
        self.0.push(contact);
        true
    }

    pub fn remove(&mut self, id: &ContactId) -> Option<ContactRef> {
        let index = self.0.iter().position(|contact| &contact.id == id)?;
        Some(self.0.remove(index))
    }

    /// Adds the contact when absent, removes it when present.
    pub fn toggle(&mut self, contact: ContactRef) {
        if self.remove(&contact.id).is_none() {
            self.0.push(contact);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ContactRef> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[ContactRef] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<ContactRef> {
        self.0
    }

    /// Falls back to the current contact when nothing was selected.
    pub fn or_current(self, current: &ContactRef) -> Self {
        if self.is_empty() {
            Self(vec![current.clone()])
        } else {
            self
        }
    }
}

impl FromIterator<ContactRef> for Participants {
    fn from_iter<T: IntoIterator<Item = ContactRef>>(iter: T) -> Self {
        let mut participants = Participants::new();
        for contact in iter {
            participants.insert(contact);
        }
        participants
    }
}

impl IntoIterator for Participants {
    type Item = ContactRef;
    type IntoIter = std::vec::IntoIter<ContactRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Participants {
    type Item = &'a ContactRef;
    type IntoIter = std::slice::Iter<'a, ContactRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::{display_name, ContactRef, Participants};
    use crate::domain::ids::ContactId;

    fn contact(id: &str, name: &str) -> ContactRef {
        ContactRef::new(ContactId::new(id).unwrap(), name)
    }

    #[test]
    fn participants_dedupe_by_id() {
        let participants: Participants = vec![
            contact("1", "Ada"),
            contact("2", "Grace"),
            contact("1", "Ada Again"),
        ]
        .into_iter()
        .collect();
        assert_eq!(participants.len(), 2);
        assert_eq!(participants.as_slice()[0].name, "Ada");
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut participants = Participants::new();
        participants.toggle(contact("1", "Ada"));
        assert!(participants.contains(&ContactId::new("1").unwrap()));
        participants.toggle(contact("1", "Ada"));
        assert!(participants.is_empty());
    }

    #[test]
    fn empty_selection_falls_back_to_current_contact() {
        let current = contact("C1", "Current");
        let participants = Participants::new().or_current(&current);
        assert_eq!(participants.into_vec(), vec![current]);
    }

    #[test]
    fn blank_names_get_placeholder() {
        assert_eq!(contact("1", "  ").name, "Unknown Name");
        assert_eq!(display_name(Some("Ada"), None), "Ada");
        assert_eq!(display_name(None, Some(" ")), "Unknown Name");
    }
}
