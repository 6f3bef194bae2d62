mod commands;
mod error;
mod util;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::commands::{history, lookup, options, Context};
use crate::error::{exit_code_for, invalid_input, report_error};
use annals_config::{self as config, AppConfig, ENV_ACCESS_TOKEN};
use annals_crm::{CrmApi, HostEnvironment, PageContext, RestCrm, StaticHost};
use annals_sync::{AuditLog, HistorySync, SyncOptions};

#[derive(Debug, Parser)]
#[command(name = "annals", version, about = "CRM contact history CLI")]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    json: bool,
    #[arg(long, short, global = true)]
    verbose: bool,
    /// OAuth access token; overrides the config file and environment
    #[arg(long, global = true)]
    access_token: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the history of a contact
    List(history::ListArgs),
    Show(history::ShowArgs),
    Add(history::AddArgs),
    Edit(history::EditArgs),
    Delete(history::DeleteArgs),
    /// Move a history record under an application
    Move(history::MoveArgs),
    /// Search contacts for the participant picker
    Contacts(lookup::ContactsArgs),
    /// Search accounts for the stakeholder picker
    Accounts(lookup::AccountsArgs),
    /// Print the form reference tables
    Options,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let verbose = cli.verbose;
    init_logging(verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err, verbose);
            exit_code_for(&err)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let Cli {
        config: config_path,
        json,
        verbose,
        access_token,
        command,
    } = cli;

    if let Command::Options = command {
        return options::print_options(json);
    }

    let app_config = config::load(config_path.clone()).with_context(|| "load config")?;
    if verbose {
        match config::resolve_config_path(config_path) {
            Ok(path) => {
                if path.exists() {
                    debug!(path = %path.display(), "config resolved");
                } else {
                    debug!(path = %path.display(), "config missing, using defaults");
                }
            }
            Err(err) => {
                debug!(error = %err, "config unavailable");
            }
        }
    }

    let crm = connect(&app_config, access_token)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .with_context(|| "start async runtime")?;
    runtime.block_on(dispatch(command, crm, &app_config, json))
}

fn connect(config: &AppConfig, access_token: Option<String>) -> Result<Arc<dyn CrmApi>> {
    let token = access_token
        .or_else(|| config.access_token.clone())
        .filter(|token| !token.trim().is_empty())
        .ok_or_else(|| {
            invalid_input(format!(
                "missing access token: pass --access-token, set {ENV_ACCESS_TOKEN} or access_token in the config file"
            ))
        })?;
    let base_url = config
        .resolved_base_url()
        .with_context(|| "resolve crm base url")?;
    debug!(base_url = %base_url, "crm endpoint resolved");
    let crm = RestCrm::new(
        &base_url,
        &token,
        Duration::from_secs(config.http_timeout_secs),
    )
    .with_context(|| "create crm client")?;
    Ok(Arc::new(crm))
}

async fn dispatch(
    command: Command,
    crm: Arc<dyn CrmApi>,
    config: &AppConfig,
    json: bool,
) -> Result<()> {
    let audit = AuditLog::spawn(crm.clone(), config.modules.audit_log.clone());
    let sync = HistorySync::new(crm, config.modules.clone(), config.related_lists.clone())
        .with_audit(audit)
        .with_options(SyncOptions {
            conflict_check: config.conflict_check,
            page_size: config.page_size,
        });
    let host = StaticHost::new(page_context(&command, config));
    host.resize(config.widget.width, config.widget.height)?;
    let ctx = Context {
        sync: &sync,
        json,
        config,
        host: &host,
    };

    let result = match command {
        Command::List(args) => history::list_history(&ctx, args).await,
        Command::Show(args) => history::show_history(&ctx, args).await,
        Command::Add(args) => history::add_history(&ctx, args).await,
        Command::Edit(args) => history::edit_history(&ctx, args).await,
        Command::Delete(args) => history::delete_history(&ctx, args).await,
        Command::Move(args) => history::move_history(&ctx, args).await,
        Command::Contacts(args) => lookup::search_contacts(&ctx, args).await,
        Command::Accounts(args) => lookup::search_accounts(&ctx, args).await,
        Command::Options => unreachable!("options command handled before connecting"),
    };

    let summary = sync.flush_audit().await;
    debug!(
        written = summary.written,
        failed = summary.failed,
        "audit log flushed"
    );
    result
}

/// The record page a command runs against, as the CRM frame would report it.
fn page_context(command: &Command, config: &AppConfig) -> Option<PageContext> {
    let contact = match command {
        Command::List(args) => &args.contact,
        Command::Add(args) => &args.contact,
        _ => return None,
    };
    Some(PageContext {
        entity: config.modules.contacts.clone(),
        record_id: contact.clone(),
    })
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
