pub const REGARDING_PRESETS: [&str; 4] = [
    "Hourly Consult $220",
    "Initial Consultation Fee $165",
    "No appointments today",
    "No appointments tonight",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Regarding {
    Preset(&'static str),
    Custom(String),
}

impl Regarding {
    pub fn as_str(&self) -> &str {
        match self {
            Regarding::Preset(value) => value,
            Regarding::Custom(value) => value,
        }
    }
}

/// Returns `None` for blank input.
pub fn classify_regarding(raw: &str) -> Option<Regarding> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let preset = REGARDING_PRESETS
        .iter()
        .find(|preset| preset.eq_ignore_ascii_case(trimmed));
    Some(match preset {
        Some(preset) => Regarding::Preset(preset),
        None => Regarding::Custom(trimmed.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::{classify_regarding, Regarding};

    #[test]
    fn presets_are_recognized() {
        assert_eq!(
            classify_regarding("no appointments today"),
            Some(Regarding::Preset("No appointments today"))
        );
    }

    #[test]
    fn anything_else_is_custom() {
        assert_eq!(
            classify_regarding("  Follow-up on invoice "),
            Some(Regarding::Custom("Follow-up on invoice".to_string()))
        );
        assert_eq!(classify_regarding("   "), None);
    }
}
