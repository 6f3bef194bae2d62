use crate::commands::{print_json, Context};
use crate::util::or_dash;
use annals_core::ContactSearchField;
use anyhow::Result;
use clap::{Args, ValueEnum};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SearchBy {
    FirstName,
    LastName,
    Email,
    Mobile,
    IdNumber,
}

impl From<SearchBy> for ContactSearchField {
    fn from(by: SearchBy) -> Self {
        match by {
            SearchBy::FirstName => ContactSearchField::FirstName,
            SearchBy::LastName => ContactSearchField::LastName,
            SearchBy::Email => ContactSearchField::Email,
            SearchBy::Mobile => ContactSearchField::Mobile,
            SearchBy::IdNumber => ContactSearchField::IdNumber,
        }
    }
}

#[derive(Debug, Args)]
pub struct ContactsArgs {
    #[arg(long, value_enum, default_value_t = SearchBy::LastName)]
    pub by: SearchBy,
    pub text: String,
}

#[derive(Debug, Args)]
pub struct AccountsArgs {
    pub text: String,
}

pub async fn search_contacts(ctx: &Context<'_>, args: ContactsArgs) -> Result<()> {
    let contacts = ctx
        .sync
        .search_contacts(args.by.into(), &args.text)
        .await?;
    if ctx.json {
        return print_json(&contacts);
    }
    for contact in &contacts {
        println!(
            "{}  {}  {}  {}",
            contact.id,
            contact.full_name,
            or_dash(contact.email.as_deref()),
            or_dash(contact.mobile.as_deref())
        );
    }
    Ok(())
}

pub async fn search_accounts(ctx: &Context<'_>, args: AccountsArgs) -> Result<()> {
    let accounts = ctx.sync.search_accounts(&args.text).await?;
    if ctx.json {
        return print_json(&accounts);
    }
    for account in &accounts {
        println!("{}  {}", account.id, account.name);
    }
    Ok(())
}
