use crate::error::invalid_input;
use annals_core::{
    AccountId, ApplicationId, ContactId, HistoryId, StagedFile, UserId,
};
use anyhow::{Context as _, Result};
use std::fs;
use std::path::Path;
use std::str::FromStr;

fn parse_id<T: FromStr>(label: &str, raw: &str) -> Result<T> {
    raw.parse::<T>()
        .map_err(|_| invalid_input(format!("{label} id cannot be empty")))
}

pub fn parse_history_id(raw: &str) -> Result<HistoryId> {
    parse_id("history", raw)
}

pub fn parse_contact_id(raw: &str) -> Result<ContactId> {
    parse_id("contact", raw)
}

pub fn parse_account_id(raw: &str) -> Result<AccountId> {
    parse_id("account", raw)
}

pub fn parse_user_id(raw: &str) -> Result<UserId> {
    parse_id("user", raw)
}

pub fn parse_application_id(raw: &str) -> Result<ApplicationId> {
    parse_id("application", raw)
}

/// Reads a file from disk into an upload staged under its base name.
pub fn stage_file(path: &Path) -> Result<StagedFile> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| invalid_input(format!("invalid attachment path: {}", path.display())))?;
    let content =
        fs::read(path).with_context(|| format!("read attachment {}", path.display()))?;
    Ok(StagedFile::new(file_name, content)?)
}

pub fn or_dash(value: Option<&str>) -> &str {
    match value {
        Some(value) if !value.trim().is_empty() => value,
        _ => "-",
    }
}

#[cfg(test)]
mod tests {
    use super::{or_dash, parse_contact_id, parse_history_id, stage_file};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn ids_are_trimmed_and_must_not_be_blank() {
        assert_eq!(parse_history_id(" 42 ").expect("id").as_str(), "42");
        assert!(parse_contact_id("   ").is_err());
    }

    #[test]
    fn stage_file_uses_base_name() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("minutes.txt");
        fs::write(&path, b"agenda").expect("write");

        let staged = stage_file(&path).expect("stage");
        assert_eq!(staged.file_name(), "minutes.txt");
        assert_eq!(staged.content(), b"agenda");
    }

    #[test]
    fn stage_file_reports_missing_file() {
        let temp = TempDir::new().expect("temp dir");
        assert!(stage_file(&temp.path().join("absent.pdf")).is_err());
    }

    #[test]
    fn blank_values_render_as_dash() {
        assert_eq!(or_dash(None), "-");
        assert_eq!(or_dash(Some("  ")), "-");
        assert_eq!(or_dash(Some("Done")), "Done");
    }
}
