use crate::commands::{print_json, report_warnings, Context, SyncedDto};
use crate::error::{invalid_input, not_found};
use crate::util::{
    or_dash, parse_account_id, parse_application_id, parse_contact_id, parse_history_id,
    parse_user_id, stage_file,
};
use annals_core::time::{now_utc, parse_local_date_time, split_date_time};
use annals_core::view::{SortKey, SortOrder, TableQuery, DEFAULT_ROWS_PER_PAGE, ROWS_PER_PAGE_OPTIONS};
use annals_core::{
    parse_filter, ApplicationId, ContactRef, HistoryDraft, HistoryFields, HistoryId, HistoryKind,
    HistoryRow, HistoryRowDto, Participants,
};
use annals_sync::Synced;
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Contact whose history is shown
    #[arg(long)]
    pub contact: String,
    #[arg(long)]
    pub filter: Option<String>,
    /// date|time|type|result|duration|regarding|owner
    #[arg(long)]
    pub sort: Option<String>,
    #[arg(long)]
    pub desc: bool,
    #[arg(long, default_value_t = 1)]
    pub page: usize,
    #[arg(long, default_value_t = DEFAULT_ROWS_PER_PAGE)]
    pub per_page: usize,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    pub id: String,
}

/// Form fields shared by `add` and `edit`. Omitted flags keep the current value.
#[derive(Debug, Args)]
pub struct FieldArgs {
    #[arg(long = "type")]
    pub kind: Option<String>,
    #[arg(long)]
    pub result: Option<String>,
    #[arg(long)]
    pub regarding: Option<String>,
    #[arg(long)]
    pub details: Option<String>,
    /// Minutes; one of the duration options
    #[arg(long)]
    pub duration: Option<u32>,
    /// YYYY-MM-DD
    #[arg(long)]
    pub date: Option<String>,
    /// HH:MM
    #[arg(long)]
    pub time: Option<String>,
    /// Record manager user id
    #[arg(long)]
    pub owner: Option<String>,
    /// Stakeholder account id; empty clears it
    #[arg(long)]
    pub stakeholder: Option<String>,
    #[arg(long = "participant")]
    pub participants: Vec<String>,
}

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Contact page the record is created from
    #[arg(long)]
    pub contact: String,
    #[command(flatten)]
    pub fields: FieldArgs,
    #[arg(long)]
    pub attach: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct EditArgs {
    pub id: String,
    #[command(flatten)]
    pub fields: FieldArgs,
    #[arg(long, conflicts_with = "drop_attachment")]
    pub attach: Option<PathBuf>,
    #[arg(long)]
    pub drop_attachment: bool,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    pub id: String,
}

#[derive(Debug, Args)]
pub struct MoveArgs {
    pub id: String,
    #[arg(long)]
    pub application: String,
}

#[derive(Debug, Serialize)]
struct HistoryPageDto {
    rows: Vec<HistoryRowDto>,
    total: usize,
    page: usize,
    pages: usize,
    per_page: usize,
}

#[derive(Debug, Serialize)]
struct MovedDto {
    source: HistoryId,
    application: ApplicationId,
    application_history_id: String,
    participants: Vec<ContactRef>,
}

pub async fn list_history(ctx: &Context<'_>, args: ListArgs) -> Result<()> {
    let filter = parse_filter(args.filter.as_deref().unwrap_or_default())?;
    let query = table_query(&args)?;
    let contact = ctx.current_contact()?;

    let book = ctx.sync.load_rows(&contact).await?;
    let page = book.page(&filter, query);
    let dto = HistoryPageDto {
        rows: page.rows.iter().map(|row| HistoryRowDto::from(*row)).collect(),
        total: page.total,
        page: page.page + 1,
        pages: page.page_count(),
        per_page: page.rows_per_page,
    };

    if ctx.json {
        return print_json(&dto);
    }

    if dto.rows.is_empty() {
        println!("no history for contact {contact}");
        return Ok(());
    }
    for row in &dto.rows {
        println!(
            "{}  {} {}  {:<11}  {:<24}  {:>3}m  {}  {}",
            row.id,
            row.date,
            row.time,
            row.kind,
            or_dash(row.result.as_deref()),
            row.duration_minutes,
            or_dash(row.regarding.as_deref()),
            row.name
        );
    }
    println!("page {} of {} ({} records)", dto.page, dto.pages, dto.total);
    Ok(())
}

pub async fn show_history(ctx: &Context<'_>, args: ShowArgs) -> Result<()> {
    let id = parse_history_id(&args.id)?;
    let (row, warnings) = report_warnings(ctx.sync.load_detail(&id).await?);
    let dto = HistoryRowDto::from(&row);

    if ctx.json {
        return print_json(&SyncedDto {
            value: dto,
            warnings,
        });
    }

    println!("{} ({})", dto.name, dto.id);
    println!("when: {} {}", dto.date, dto.time);
    println!("type: {}", dto.kind);
    println!("result: {}", or_dash(dto.result.as_deref()));
    println!("duration: {} minutes", dto.duration_minutes);
    println!("regarding: {}", or_dash(dto.regarding.as_deref()));
    println!("record manager: {}", or_dash(dto.record_manager.as_deref()));
    println!("stakeholder: {}", or_dash(dto.stakeholder.as_deref()));
    println!("attachment: {}", or_dash(dto.attachment.as_deref()));
    println!("participants:");
    for contact in &dto.participants {
        println!("  {} {}", contact.id, contact.name);
    }
    if !dto.details.is_empty() {
        println!();
        println!("{}", dto.details);
    }
    Ok(())
}

pub async fn add_history(ctx: &Context<'_>, args: AddArgs) -> Result<()> {
    let mut draft = HistoryDraft::new(now_utc(), None);
    apply_form_fields(&mut draft.fields, &args.fields)?;
    let staged = args.attach.as_deref().map(stage_file).transpose()?;
    let contact_id = ctx.current_contact()?;

    let current = ctx
        .sync
        .get_contact(&contact_id)
        .await?
        .ok_or_else(|| not_found(format!("contact {contact_id}")))?
        .to_ref();
    apply_lookup_fields(ctx, &mut draft.fields, &args.fields).await?;
    let participants = resolve_participants(ctx, &args.fields.participants).await?;

    let created = ctx
        .sync
        .create_history(&draft, participants, &current, staged.as_ref())
        .await?;
    print_saved(ctx, created, "created")
}

pub async fn edit_history(ctx: &Context<'_>, args: EditArgs) -> Result<()> {
    let id = parse_history_id(&args.id)?;
    let staged = args.attach.as_deref().map(stage_file).transpose()?;
    let (row, _) = report_warnings(ctx.sync.load_detail(&id).await?);

    if let Some(attachment) = &row.attachment {
        if staged.is_none() && !args.drop_attachment {
            return Err(invalid_input(format!(
                "history record {id} has attachment {}: pass --attach to replace it or --drop-attachment to remove it",
                attachment.file_name
            )));
        }
    }

    let mut fields = row.fields.clone();
    apply_form_fields(&mut fields, &args.fields)?;
    apply_lookup_fields(ctx, &mut fields, &args.fields).await?;
    let participants = if args.fields.participants.is_empty() {
        row.participants.clone()
    } else {
        resolve_participants(ctx, &args.fields.participants).await?
    };

    let updated = ctx
        .sync
        .update_history(&row, fields, participants, staged.as_ref())
        .await?;
    print_saved(ctx, updated, "updated")
}

pub async fn delete_history(ctx: &Context<'_>, args: DeleteArgs) -> Result<()> {
    let id = parse_history_id(&args.id)?;
    let (row, _) = report_warnings(ctx.sync.load_detail(&id).await?);
    let (deleted, warnings) = report_warnings(ctx.sync.delete_history(&row).await?);

    if ctx.json {
        return print_json(&SyncedDto {
            value: deleted,
            warnings,
        });
    }
    println!("deleted history {deleted} ({})", row.name());
    Ok(())
}

pub async fn move_history(ctx: &Context<'_>, args: MoveArgs) -> Result<()> {
    let id = parse_history_id(&args.id)?;
    let application = parse_application_id(&args.application)?;
    let (row, _) = report_warnings(ctx.sync.load_detail(&id).await?);
    let (moved, warnings) =
        report_warnings(ctx.sync.move_to_application(&row, &application).await?);

    if ctx.json {
        return print_json(&SyncedDto {
            value: MovedDto {
                source: moved.source,
                application: moved.application,
                application_history_id: moved.application_history_id,
                participants: moved.participants.into_vec(),
            },
            warnings,
        });
    }
    println!(
        "moved history {} to application {} as {}",
        moved.source, moved.application, moved.application_history_id
    );
    Ok(())
}

fn table_query(args: &ListArgs) -> Result<TableQuery> {
    if args.page == 0 {
        return Err(invalid_input("page starts at 1"));
    }
    if !ROWS_PER_PAGE_OPTIONS.contains(&args.per_page) {
        return Err(invalid_input(format!(
            "invalid per-page value {}: expected one of {:?}",
            args.per_page, ROWS_PER_PAGE_OPTIONS
        )));
    }
    let mut query = TableQuery {
        page: args.page - 1,
        rows_per_page: args.per_page,
        ..TableQuery::default()
    };
    if let Some(raw) = &args.sort {
        query.sort = raw.parse::<SortKey>().map_err(invalid_input)?;
        query.order = SortOrder::Asc;
    }
    if args.desc {
        query.order = SortOrder::Desc;
    }
    Ok(query)
}

/// Applies the flags that need no CRM lookup, then validates the result.
fn apply_form_fields(fields: &mut HistoryFields, args: &FieldArgs) -> Result<()> {
    if let Some(raw) = &args.kind {
        let kind: HistoryKind = raw.parse()?;
        // Results are per type.
        if kind != fields.kind {
            fields.result = None;
        }
        fields.kind = kind;
    }
    if let Some(result) = &args.result {
        fields.result = non_blank(result);
    }
    if let Some(regarding) = &args.regarding {
        fields.regarding = non_blank(regarding);
    }
    if let Some(details) = &args.details {
        fields.details = details.trim().to_string();
    }
    if let Some(duration) = args.duration {
        fields.duration_minutes = duration;
    }
    if args.date.is_some() || args.time.is_some() {
        let (date, time) = split_date_time(fields.occurred_at);
        let date = args.date.as_deref().unwrap_or(&date);
        let time = args.time.as_deref().unwrap_or(&time);
        fields.occurred_at = parse_local_date_time(date, Some(time))?;
    }
    fields.validate()?;
    Ok(())
}

async fn apply_lookup_fields(
    ctx: &Context<'_>,
    fields: &mut HistoryFields,
    args: &FieldArgs,
) -> Result<()> {
    if let Some(raw) = &args.owner {
        let id = parse_user_id(raw)?;
        let user = ctx
            .sync
            .get_user(&id)
            .await?
            .ok_or_else(|| not_found(format!("user {id}")))?;
        fields.owner = Some(user.to_ref());
    }
    if let Some(raw) = &args.stakeholder {
        fields.stakeholder = if raw.trim().is_empty() {
            None
        } else {
            let id = parse_account_id(raw)?;
            let account = ctx
                .sync
                .get_account(&id)
                .await?
                .ok_or_else(|| not_found(format!("account {id}")))?;
            Some(account)
        };
    }
    Ok(())
}

async fn resolve_participants(ctx: &Context<'_>, ids: &[String]) -> Result<Participants> {
    let mut participants = Participants::new();
    for raw in ids {
        let id = parse_contact_id(raw)?;
        let contact = ctx
            .sync
            .get_contact(&id)
            .await?
            .ok_or_else(|| not_found(format!("contact {id}")))?;
        participants.insert(contact.to_ref());
    }
    Ok(participants)
}

fn print_saved(ctx: &Context<'_>, synced: Synced<HistoryRow>, verb: &str) -> Result<()> {
    let (row, warnings) = report_warnings(synced);
    let dto = HistoryRowDto::from(&row);
    if ctx.json {
        return print_json(&SyncedDto {
            value: dto,
            warnings,
        });
    }
    println!("{verb} history {} ({})", dto.id, dto.name);
    Ok(())
}

fn non_blank(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{apply_form_fields, table_query, FieldArgs, ListArgs};
    use annals_core::view::{SortKey, SortOrder};
    use annals_core::{HistoryFields, HistoryKind};

    fn field_args() -> FieldArgs {
        FieldArgs {
            kind: None,
            result: None,
            regarding: None,
            details: None,
            duration: None,
            date: None,
            time: None,
            owner: None,
            stakeholder: None,
            participants: Vec::new(),
        }
    }

    fn list_args() -> ListArgs {
        ListArgs {
            contact: "c1".to_string(),
            filter: None,
            sort: None,
            desc: false,
            page: 1,
            per_page: 10,
        }
    }

    #[test]
    fn table_query_defaults_to_newest_first() {
        let query = table_query(&list_args()).expect("query");
        assert_eq!(query.sort, SortKey::Date);
        assert_eq!(query.order, SortOrder::Desc);
        assert_eq!(query.page, 0);
    }

    #[test]
    fn explicit_sort_is_ascending_unless_desc() {
        let mut args = list_args();
        args.sort = Some("duration".to_string());
        assert_eq!(table_query(&args).expect("query").order, SortOrder::Asc);
        args.desc = true;
        assert_eq!(table_query(&args).expect("query").order, SortOrder::Desc);
    }

    #[test]
    fn table_query_rejects_unknown_page_sizes() {
        let mut args = list_args();
        args.per_page = 7;
        assert!(table_query(&args).is_err());
        args.per_page = 25;
        args.page = 0;
        assert!(table_query(&args).is_err());
    }

    #[test]
    fn changing_type_clears_result() {
        let mut fields = HistoryFields::with_defaults(1_900_000_000, None);
        fields.kind = HistoryKind::Call;
        fields.result = Some("Call Completed".to_string());

        let mut args = field_args();
        args.kind = Some("note".to_string());
        args.details = Some("  follow up  ".to_string());
        apply_form_fields(&mut fields, &args).expect("apply");

        assert_eq!(fields.kind, HistoryKind::Note);
        assert_eq!(fields.result, None);
        assert_eq!(fields.details, "follow up");
    }

    #[test]
    fn invalid_duration_is_rejected() {
        let mut fields = HistoryFields::with_defaults(1_900_000_000, None);
        let mut args = field_args();
        args.duration = Some(7);
        assert!(apply_form_fields(&mut fields, &args).is_err());
    }

    #[test]
    fn time_only_keeps_the_date() {
        let mut fields = HistoryFields::with_defaults(1_900_000_000, None);
        let mut args = field_args();
        args.date = Some("2030-03-04".to_string());
        args.time = Some("09:30".to_string());
        apply_form_fields(&mut fields, &args).expect("apply");

        let mut args = field_args();
        args.time = Some("14:15".to_string());
        apply_form_fields(&mut fields, &args).expect("apply");

        let (date, time) = annals_core::time::split_date_time(fields.occurred_at);
        assert_eq!(date, "2030-03-04");
        assert_eq!(time, "14:15");
    }
}
