use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use dp_core::SortKey;

#[derive(Debug, Parser)]
#[command(name = "donor-portal", version, about = "Donor self-service portal")]
pub struct Cli {
    /// Settings file (defaults to ./donor-portal.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Skip confirmation prompts
    #[arg(short, long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Browse the charity directory
    Charities(CharitiesArgs),
    /// Follow or unfollow a charity
    Follow {
        charity_id: i64,
    },
    /// List the charities you follow
    Following {
        /// Follow id (as listed) to remove
        #[arg(long)]
        unfollow: Option<i64>,
    },
    /// Read and send messages
    Messages {
        /// Open the conversation with this user
        #[arg(long = "with")]
        partner: Option<i64>,
        /// Send a message in the open conversation
        #[arg(long, requires = "partner")]
        send: Option<String>,
    },
    /// Show or change notification preferences
    Prefs(PrefsArgs),
    /// List and sign out sessions
    Sessions {
        #[arg(long, conflicts_with = "revoke_all")]
        revoke: Option<i64>,
        /// Sign out every session except this one
        #[arg(long)]
        revoke_all: bool,
    },
    /// Show or edit tax information
    TaxInfo(TaxInfoArgs),
    /// Download a data export or donation statement
    Export {
        #[command(subcommand)]
        kind: ExportCommand,
    },
}

#[derive(Debug, Args)]
pub struct CharitiesArgs {
    #[arg(long, short)]
    pub search: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub region: Option<String>,
    /// name, newest or total_received
    #[arg(long)]
    pub sort: Option<SortKey>,
    #[arg(long, default_value_t = 1)]
    pub page: u32,
}

#[derive(Debug, Args)]
pub struct PrefsArgs {
    /// CATEGORY.CHANNEL to switch on, e.g. security.sms
    #[arg(long, value_name = "CATEGORY.CHANNEL")]
    pub enable: Vec<String>,
    /// CATEGORY.CHANNEL to switch off
    #[arg(long, value_name = "CATEGORY.CHANNEL")]
    pub disable: Vec<String>,
    /// CATEGORY=FREQUENCY, e.g. donations=weekly
    #[arg(long, value_name = "CATEGORY=FREQUENCY")]
    pub frequency: Vec<String>,
}

#[derive(Debug, Args)]
pub struct TaxInfoArgs {
    /// FIELD=VALUE, e.g. city=Leeds
    #[arg(long = "set", value_name = "FIELD=VALUE")]
    pub fields: Vec<String>,
    #[arg(long)]
    pub gift_aid: Option<bool>,
}

#[derive(Debug, Subcommand)]
pub enum ExportCommand {
    /// Archive of all personal data held about you
    Data,
    /// Annual donation statement
    Statement {
        #[arg(long)]
        year: i32,
    },
}
