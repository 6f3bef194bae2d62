use annals_config::ConfigError;
use annals_core::filter::FilterParseError;
use annals_core::time::TimeParseError;
use annals_core::CoreError;
use annals_crm::CrmError;
use annals_sync::SyncError;
use anyhow::Error;
use std::process::ExitCode;
use thiserror::Error as ThisError;

pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_NOT_FOUND: u8 = 2;
pub const EXIT_INVALID_INPUT: u8 = 3;

#[derive(Debug, ThisError)]
pub enum CliError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("not found: {0}")]
    NotFound(String),
}

pub fn invalid_input(message: impl Into<String>) -> Error {
    CliError::InvalidInput(message.into()).into()
}

pub fn not_found(message: impl Into<String>) -> Error {
    CliError::NotFound(message.into()).into()
}

pub fn report_error(err: &Error, verbose: bool) {
    if verbose {
        eprintln!("error: {:#}", err);
    } else {
        eprintln!("error: {}", err);
    }
}

pub fn exit_code_for(err: &Error) -> ExitCode {
    for cause in err.chain() {
        if let Some(cli_err) = cause.downcast_ref::<CliError>() {
            return ExitCode::from(match cli_err {
                CliError::InvalidInput(_) => EXIT_INVALID_INPUT,
                CliError::NotFound(_) => EXIT_NOT_FOUND,
            });
        }
        if let Some(config_err) = cause.downcast_ref::<ConfigError>() {
            return ExitCode::from(config_exit_code(config_err));
        }
        if let Some(sync_err) = cause.downcast_ref::<SyncError>() {
            return ExitCode::from(sync_exit_code(sync_err));
        }
        if let Some(crm_err) = cause.downcast_ref::<CrmError>() {
            return ExitCode::from(crm_exit_code(crm_err));
        }
        if let Some(_core_err) = cause.downcast_ref::<CoreError>() {
            return ExitCode::from(EXIT_INVALID_INPUT);
        }
        if let Some(_parse_err) = cause.downcast_ref::<FilterParseError>() {
            return ExitCode::from(EXIT_INVALID_INPUT);
        }
        if let Some(_parse_err) = cause.downcast_ref::<TimeParseError>() {
            return ExitCode::from(EXIT_INVALID_INPUT);
        }
    }
    ExitCode::from(EXIT_FAILURE)
}

fn config_exit_code(err: &ConfigError) -> u8 {
    match err {
        ConfigError::MissingHomeDir => EXIT_FAILURE,
        ConfigError::InvalidConfigPath(_)
        | ConfigError::MissingConfigFile(_)
        | ConfigError::InsecurePermissions(_)
        | ConfigError::InvalidPageSize(_)
        | ConfigError::InvalidHttpTimeout(_)
        | ConfigError::InvalidBaseUrl(_)
        | ConfigError::EmptyValue { .. }
        | ConfigError::MissingExtensionIdentifier
        | ConfigError::Read { .. }
        | ConfigError::Parse { .. } => EXIT_INVALID_INPUT,
    }
}

fn sync_exit_code(err: &SyncError) -> u8 {
    match err {
        SyncError::NotFound(_) => EXIT_NOT_FOUND,
        SyncError::Core(_) => EXIT_INVALID_INPUT,
        SyncError::Crm(err) => crm_exit_code(err),
        SyncError::CreateFailed(_)
        | SyncError::UpdateFailed { .. }
        | SyncError::DeleteFailed { .. }
        | SyncError::AttachmentOpFailed { .. }
        | SyncError::LinkOpFailed { .. }
        | SyncError::AuditLogFailed(_)
        | SyncError::Conflict(_)
        | SyncError::AlreadyPending(_)
        | SyncError::MissingId => EXIT_FAILURE,
    }
}

fn crm_exit_code(err: &CrmError) -> u8 {
    match err {
        CrmError::Api { status: 404, .. } => EXIT_NOT_FOUND,
        CrmError::MissingToken | CrmError::Url(_) | CrmError::Core(_) => EXIT_INVALID_INPUT,
        CrmError::Http(_)
        | CrmError::Json(_)
        | CrmError::Api { .. }
        | CrmError::UnexpectedResponse(_)
        | CrmError::MissingField { .. }
        | CrmError::InvalidField { .. }
        | CrmError::Unavailable(_) => EXIT_FAILURE,
    }
}
