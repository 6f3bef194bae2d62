use crate::domain::ContactRef;

pub const MAX_NAME_LEN: usize = 120;
pub const UNTITLED_NAME: &str = "Untitled";

pub fn history_name<'a>(participants: impl IntoIterator<Item = &'a ContactRef>) -> String {
    let names: Vec<&str> = participants
        .into_iter()
        .map(|contact| contact.name.trim())
        .filter(|name| !name.is_empty())
        .collect();
    if names.is_empty() {
        return UNTITLED_NAME.to_string();
    }
    let joined = names.join(", ");
    if joined.chars().count() <= MAX_NAME_LEN {
        return joined;
    }
    joined.chars().take(MAX_NAME_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::{history_name, MAX_NAME_LEN};
    use crate::domain::{ContactId, ContactRef};

    #[test]
    fn names_are_joined() {
        let participants = vec![
            ContactRef::new(ContactId::new("1").unwrap(), "Ada Lovelace"),
            ContactRef::new(ContactId::new("2").unwrap(), "Grace Hopper"),
        ];
        assert_eq!(history_name(&participants), "Ada Lovelace, Grace Hopper");
    }

    #[test]
    fn long_names_are_truncated() {
        let participants: Vec<ContactRef> = (0..40)
            .map(|idx| ContactRef::new(ContactId::new(&idx.to_string()).unwrap(), "Someone"))
            .collect();
        assert_eq!(history_name(&participants).chars().count(), MAX_NAME_LEN);
    }

    #[test]
    fn no_participants_is_untitled() {
        assert_eq!(history_name(&Vec::<ContactRef>::new()), "Untitled");
    }
}
