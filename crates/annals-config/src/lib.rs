use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use annals_crm::schema::{ModuleNames, RelatedLists};
use serde::Deserialize;
use thiserror::Error;

const APP_DIR: &str = "annals";
const CONFIG_FILENAME: &str = "config.toml";

pub const ENV_API_BASE_URL: &str = "ANNALS_API_BASE_URL";
pub const ENV_EXTENSION_IDENTIFIER: &str = "ANNALS_EXTENSION_IDENTIFIER";
pub const ENV_ACCESS_TOKEN: &str = "ANNALS_ACCESS_TOKEN";

pub const DEFAULT_PAGE_SIZE: u32 = 200;
pub const MAX_PAGE_SIZE: u32 = 200;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const MAX_HTTP_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_center: DataCenter,
    pub api_base_url: Option<String>,
    pub extension_identifier: Option<String>,
    pub sandbox: bool,
    pub access_token: Option<String>,
    pub page_size: u32,
    pub http_timeout_secs: u64,
    pub conflict_check: bool,
    pub modules: ModuleNames,
    pub related_lists: RelatedLists,
    pub widget: WidgetSize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum DataCenter {
    #[serde(rename = "us", alias = "US")]
    Us,
    #[serde(rename = "eu", alias = "EU")]
    Eu,
    #[serde(rename = "au", alias = "AU")]
    Au,
    #[serde(rename = "in", alias = "IN")]
    In,
    #[serde(rename = "cn", alias = "china", alias = "China")]
    China,
    #[serde(rename = "jp", alias = "JP")]
    Jp,
}

impl DataCenter {
    pub fn base_url(self) -> &'static str {
        match self {
            DataCenter::Us => "https://www.zohoapis.com",
            DataCenter::Eu => "https://www.zohoapis.eu",
            DataCenter::Au => "https://www.zohoapis.com.au",
            DataCenter::In => "https://www.zohoapis.in",
            DataCenter::China => "https://www.zohoapis.com.cn",
            DataCenter::Jp => "https://www.zohoapis.jp",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidgetSize {
    pub height: u32,
    pub width: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_center: DataCenter::Us,
            api_base_url: None,
            extension_identifier: None,
            sandbox: false,
            access_token: None,
            page_size: DEFAULT_PAGE_SIZE,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            conflict_check: false,
            modules: ModuleNames::default(),
            related_lists: RelatedLists::default(),
            widget: WidgetSize {
                height: 600,
                width: 1200,
            },
        }
    }
}

impl AppConfig {
    /// Explicit base URL wins, then the sandbox plugin host, then the data center.
    pub fn resolved_base_url(&self) -> Result<String> {
        if let Some(url) = &self.api_base_url {
            return Ok(url.trim_end_matches('/').to_string());
        }
        if self.sandbox {
            let extension = self
                .extension_identifier
                .as_deref()
                .ok_or(ConfigError::MissingExtensionIdentifier)?;
            return Ok(format!("https://plugin-{extension}.zohosandbox.com"));
        }
        Ok(self.data_center.base_url().to_string())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing home directory")]
    MissingHomeDir,
    #[error("invalid config path: {0}")]
    InvalidConfigPath(PathBuf),
    #[error("config file not found: {0}")]
    MissingConfigFile(PathBuf),
    #[error("config file permissions too permissive: {0}")]
    InsecurePermissions(PathBuf),
    #[error("invalid page_size value: {0}")]
    InvalidPageSize(u32),
    #[error("invalid http_timeout_secs value: {0}")]
    InvalidHttpTimeout(u64),
    #[error("invalid api_base_url: {0}")]
    InvalidBaseUrl(String),
    #[error("invalid {field}: value cannot be empty")]
    EmptyValue { field: String },
    #[error("sandbox mode requires extension_identifier")]
    MissingExtensionIdentifier,
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    data_center: Option<DataCenter>,
    api_base_url: Option<String>,
    extension_identifier: Option<String>,
    sandbox: Option<bool>,
    access_token: Option<String>,
    page_size: Option<u32>,
    http_timeout_secs: Option<u64>,
    conflict_check: Option<bool>,
    modules: Option<ModuleNames>,
    related_lists: Option<RelatedLists>,
    widget: Option<WidgetFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WidgetFile {
    height: Option<u32>,
    width: Option<u32>,
}

pub fn load(config_path: Option<PathBuf>) -> Result<AppConfig> {
    let required = config_path.is_some();
    let mut config = match resolve_config_path(config_path) {
        Ok(path) => load_at_path(&path, required)?.unwrap_or_default(),
        Err(ConfigError::MissingHomeDir) if !required => AppConfig::default(),
        Err(ConfigError::InvalidConfigPath(_)) if !required => AppConfig::default(),
        Err(err) => return Err(err),
    };
    apply_env_overrides(&mut config, |key| env::var(key).ok())?;
    Ok(config)
}

pub fn resolve_config_path(custom: Option<PathBuf>) -> Result<PathBuf> {
    match custom {
        Some(path) => {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::InvalidConfigPath(path));
            }
            Ok(path)
        }
        None => {
            let base = if let Some(dir) = env::var_os("XDG_CONFIG_HOME") {
                let path = PathBuf::from(dir);
                if path.as_os_str().is_empty() {
                    return Err(ConfigError::InvalidConfigPath(path));
                }
                path
            } else {
                let home = dirs::home_dir().ok_or(ConfigError::MissingHomeDir)?;
                home.join(".config")
            };
            Ok(base.join(APP_DIR).join(CONFIG_FILENAME))
        }
    }
}

fn load_at_path(path: &Path, required: bool) -> Result<Option<AppConfig>> {
    if !path.exists() {
        if required {
            return Err(ConfigError::MissingConfigFile(path.to_path_buf()));
        }
        return Ok(None);
    }

    ensure_permissions(path)?;
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: ConfigFile = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(merge_config(parsed)?))
}

fn merge_config(parsed: ConfigFile) -> Result<AppConfig> {
    let mut config = AppConfig::default();

    if let Some(data_center) = parsed.data_center {
        config.data_center = data_center;
    }
    if let Some(url) = parsed.api_base_url {
        config.api_base_url = Some(validate_base_url(&url)?);
    }
    if let Some(extension) = parsed.extension_identifier {
        config.extension_identifier = Some(non_empty("extension_identifier", &extension)?);
    }
    if let Some(sandbox) = parsed.sandbox {
        config.sandbox = sandbox;
    }
    if let Some(token) = parsed.access_token {
        config.access_token = Some(non_empty("access_token", &token)?);
    }
    if let Some(page_size) = parsed.page_size {
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidPageSize(page_size));
        }
        config.page_size = page_size;
    }
    if let Some(timeout) = parsed.http_timeout_secs {
        if timeout == 0 || timeout > MAX_HTTP_TIMEOUT_SECS {
            return Err(ConfigError::InvalidHttpTimeout(timeout));
        }
        config.http_timeout_secs = timeout;
    }
    if let Some(conflict_check) = parsed.conflict_check {
        config.conflict_check = conflict_check;
    }
    if let Some(modules) = parsed.modules {
        if let Some(field) = modules.first_empty() {
            return Err(ConfigError::EmptyValue {
                field: format!("modules.{field}"),
            });
        }
        config.modules = modules;
    }
    if let Some(related_lists) = parsed.related_lists {
        if let Some(field) = related_lists.first_empty() {
            return Err(ConfigError::EmptyValue {
                field: format!("related_lists.{field}"),
            });
        }
        config.related_lists = related_lists;
    }
    if let Some(widget) = parsed.widget {
        if let Some(height) = widget.height {
            config.widget.height = height;
        }
        if let Some(width) = widget.width {
            config.widget.width = width;
        }
    }
    if config.sandbox && config.extension_identifier.is_none() {
        return Err(ConfigError::MissingExtensionIdentifier);
    }

    Ok(config)
}

fn apply_env_overrides(
    config: &mut AppConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    if let Some(url) = lookup(ENV_API_BASE_URL).filter(|value| !value.trim().is_empty()) {
        config.api_base_url = Some(validate_base_url(&url)?);
    }
    if let Some(extension) =
        lookup(ENV_EXTENSION_IDENTIFIER).filter(|value| !value.trim().is_empty())
    {
        config.extension_identifier = Some(extension.trim().to_string());
    }
    if let Some(token) = lookup(ENV_ACCESS_TOKEN).filter(|value| !value.trim().is_empty()) {
        config.access_token = Some(token.trim().to_string());
    }
    Ok(())
}

fn validate_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("https://") || trimmed.starts_with("http://")) {
        return Err(ConfigError::InvalidBaseUrl(raw.to_string()));
    }
    Ok(trimmed.to_string())
}

fn non_empty(field: &str, raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::EmptyValue {
            field: field.to_string(),
        });
    }
    Ok(trimmed.to_string())
}

#[cfg(unix)]
fn ensure_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mode = metadata.permissions().mode();
    if mode & 0o077 != 0 {
        return Err(ConfigError::InsecurePermissions(path.to_path_buf()));
    }
    Ok(())
}

#[cfg(not(unix))]
fn ensure_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
