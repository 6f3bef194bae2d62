use crate::domain::{ContactId, ContactRef, JoinRecord};
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParticipantDiff {
    pub to_delete: Vec<JoinRecord>,
    pub to_add: Vec<ContactRef>,
    pub unchanged: Vec<JoinRecord>,
}

impl ParticipantDiff {
    pub fn is_noop(&self) -> bool {
        self.to_delete.is_empty() && self.to_add.is_empty()
    }
}

/// Compares the join rows that exist remotely with the wanted participants.
///
/// Duplicate join rows for one contact are kept once; the extras are scheduled
/// for deletion so the settled state has one row per participant.
pub fn diff_participants(existing: &[JoinRecord], wanted: &[ContactRef]) -> ParticipantDiff {
    let wanted_ids: HashSet<&ContactId> = wanted.iter().map(|contact| &contact.id).collect();
    let mut diff = ParticipantDiff::default();
    let mut kept: HashSet<&ContactId> = HashSet::new();

    for join in existing {
        if wanted_ids.contains(&join.contact.id) && kept.insert(&join.contact.id) {
            diff.unchanged.push(join.clone());
        } else {
            diff.to_delete.push(join.clone());
        }
    }

    let mut added: HashSet<&ContactId> = HashSet::new();
    for contact in wanted {
        if !kept.contains(&contact.id) && added.insert(&contact.id) {
            diff.to_add.push(contact.clone());
        }
    }

    diff
}

#[cfg(test)]
mod tests {
    use super::diff_participants;
    use crate::domain::{ContactId, ContactRef, HistoryId, HistoryRef, JoinId, JoinRecord};

    fn contact(id: &str) -> ContactRef {
        ContactRef::new(ContactId::new(id).unwrap(), format!("Contact {id}"))
    }

    fn join(join_id: &str, contact_id: &str) -> JoinRecord {
        JoinRecord {
            id: JoinId::new(join_id).unwrap(),
            history: HistoryRef {
                id: HistoryId::new("H1").unwrap(),
                name: "History".to_string(),
            },
            contact: contact(contact_id),
            kind: None,
            result: None,
            regarding: None,
            details: None,
            duration_minutes: None,
            occurred_at: None,
        }
    }

    fn contact_ids(contacts: &[ContactRef]) -> Vec<&str> {
        contacts.iter().map(|contact| contact.id.as_str()).collect()
    }

    fn join_ids(joins: &[JoinRecord]) -> Vec<&str> {
        joins.iter().map(|join| join.id.as_str()).collect()
    }

    #[test]
    fn diff_splits_into_delete_add_and_unchanged() {
        let existing = vec![join("J1", "A"), join("J2", "B"), join("J3", "C")];
        let wanted = vec![contact("B"), contact("C"), contact("D")];
        let diff = diff_participants(&existing, &wanted);
        assert_eq!(join_ids(&diff.to_delete), vec!["J1"]);
        assert_eq!(contact_ids(&diff.to_add), vec!["D"]);
        assert_eq!(join_ids(&diff.unchanged), vec!["J2", "J3"]);
    }

    #[test]
    fn same_sets_are_a_noop() {
        let existing = vec![join("J1", "A"), join("J2", "B")];
        let wanted = vec![contact("B"), contact("A")];
        assert!(diff_participants(&existing, &wanted).is_noop());
    }

    #[test]
    fn empty_wanted_deletes_everything() {
        let existing = vec![join("J1", "A"), join("J2", "B")];
        let diff = diff_participants(&existing, &[]);
        assert_eq!(diff.to_delete.len(), 2);
        assert!(diff.to_add.is_empty());
    }

    #[test]
    fn duplicate_join_rows_are_collapsed() {
        let existing = vec![join("J1", "A"), join("J2", "A")];
        let diff = diff_participants(&existing, &[contact("A")]);
        assert_eq!(join_ids(&diff.unchanged), vec!["J1"]);
        assert_eq!(join_ids(&diff.to_delete), vec!["J2"]);
    }

    #[test]
    fn delete_and_insert_counts_match_set_differences() {
        let sets: [&[&str]; 4] = [&[], &["A"], &["A", "B"], &["B", "C", "D"]];
        for old in sets {
            for new in sets {
                let existing: Vec<JoinRecord> = old
                    .iter()
                    .map(|id| join(&format!("J-{id}"), id))
                    .collect();
                let wanted: Vec<ContactRef> = new.iter().map(|id| contact(id)).collect();
                let diff = diff_participants(&existing, &wanted);
                let removed = old.iter().filter(|id| !new.contains(*id)).count();
                let added = new.iter().filter(|id| !old.contains(*id)).count();
                assert_eq!(diff.to_delete.len(), removed, "{old:?} -> {new:?}");
                assert_eq!(diff.to_add.len(), added, "{old:?} -> {new:?}");
            }
        }
    }
}
