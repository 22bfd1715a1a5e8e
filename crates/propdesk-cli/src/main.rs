//! `PropDesk` operator command line
//!
//! Signs in against the admin API and moderates listings from a terminal.
//! The session is kept in a file so consecutive invocations stay signed in.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

mod challenge;
mod output;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use challenge::ChallengeFile;
use clap::{Args, Parser, Subcommand, ValueEnum};
use propdesk_client::{ApiClient, FileSessionStore, SessionManager};
use propdesk_core::{
    Config, EditListingForm, ForgotPasswordForm, Listing, ListingAction, ListingQuery,
    ListingStatus, LoginForm, LoginOutcome, OtpForm, RejectForm, ResetPasswordForm,
};
use serde::Serialize;
use std::{path::PathBuf, sync::Arc};
use tracing::debug;
use uuid::Uuid;

/// Command line interface for the `PropDesk` admin API
#[derive(Parser)]
#[command(
    name = "propdesk",
    version = env!("CARGO_PKG_VERSION"),
    about = "Moderate PropDesk property listings from the command line"
)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Enable structured JSON logging
    #[arg(long, global = true)]
    json: bool,

    /// How results are printed
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    output: OutputFormat,

    /// Subcommand
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human readable text
    Text,
    /// Pretty-printed JSON
    Json,
}

/// Available subcommands
#[derive(Subcommand)]
enum Commands {
    /// Sign in with email and password
    Login {
        /// Account email
        #[arg(long)]
        email: String,

        /// Password
        #[arg(long, env = "PROPDESK_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Submit the one-time code of a pending sign-in
    Verify {
        /// Six digit code
        code: String,
    },

    /// Ask for a new one-time code
    ResendOtp,

    /// Send a password reset email
    ForgotPassword {
        /// Account email
        #[arg(long)]
        email: String,
    },

    /// Set a new password with the token from the reset email
    ResetPassword {
        /// Token from the reset link
        #[arg(long)]
        token: String,

        /// New password
        #[arg(long, env = "PROPDESK_NEW_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Show the signed-in administrator
    Whoami,

    /// Browse and moderate listings
    Listings {
        /// Listing subcommand
        #[command(subcommand)]
        action: ListingCommands,
    },
}

/// Listing commands
#[derive(Subcommand)]
enum ListingCommands {
    /// List listings
    List {
        /// Only listings in this status
        #[arg(short, long)]
        status: Option<ListingStatus>,

        /// Free-text search
        #[arg(long)]
        search: Option<String>,

        /// Page number
        #[arg(short, long, default_value = "1")]
        page: u32,

        /// Listings per page
        #[arg(long, default_value = "20")]
        per_page: u32,
    },

    /// Show one listing
    Show {
        /// Listing ID
        id: Uuid,
    },

    /// Approve a pending or rejected listing
    Approve {
        /// Listing ID
        id: Uuid,
    },

    /// Reject a listing with a reason for the owner
    Reject {
        /// Listing ID
        id: Uuid,

        /// Reason shown to the owner
        #[arg(long)]
        reason: String,

        #[command(flatten)]
        confirm: Confirm,
    },

    /// Publish an approved listing
    Publish {
        /// Listing ID
        id: Uuid,
    },

    /// Hide a published listing
    Unpublish {
        /// Listing ID
        id: Uuid,

        #[command(flatten)]
        confirm: Confirm,
    },

    /// Delete a listing permanently
    Delete {
        /// Listing ID
        id: Uuid,

        #[command(flatten)]
        confirm: Confirm,
    },

    /// Change listing details
    Edit {
        /// Listing ID
        id: Uuid,

        #[command(flatten)]
        changes: EditArgs,
    },
}

/// Confirmation flag for actions the dashboard asks about
#[derive(Args)]
struct Confirm {
    /// Do not ask, the action is intended
    #[arg(short, long)]
    yes: bool,
}

/// Fields `listings edit` can change
#[derive(Args)]
struct EditArgs {
    /// New title
    #[arg(long)]
    title: Option<String>,

    /// New description
    #[arg(long)]
    description: Option<String>,

    /// New price
    #[arg(long)]
    price: Option<u64>,

    /// New number of bedrooms
    #[arg(long)]
    bedrooms: Option<u8>,

    /// New number of bathrooms
    #[arg(long)]
    bathrooms: Option<u8>,

    /// New floor area in square metres
    #[arg(long)]
    area_sqm: Option<f64>,
}

impl EditArgs {
    fn apply(self, listing: &Listing) -> EditListingForm {
        let mut form = EditListingForm::from_listing(listing);
        if let Some(title) = self.title {
            form.title = title;
        }
        if let Some(description) = self.description {
            form.description = description;
        }
        if let Some(price) = self.price {
            form.price = price;
        }
        if self.bedrooms.is_some() {
            form.bedrooms = self.bedrooms;
        }
        if self.bathrooms.is_some() {
            form.bathrooms = self.bathrooms;
        }
        if self.area_sqm.is_some() {
            form.area_sqm = self.area_sqm;
        }
        form
    }
}

/// Everything a command needs
struct CommandContext {
    client: ApiClient,
    challenge: ChallengeFile,
    output: OutputFormat,
}

impl CommandContext {
    fn print<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) -> Result<()> {
        match self.output {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
            OutputFormat::Text => print!("{}", text()),
        }
        Ok(())
    }

    fn say(&self, message: &str) {
        if self.output == OutputFormat::Text {
            println!("{message}");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(level) = &cli.log_level {
        config.logging.level.clone_from(level);
    }
    if cli.json {
        config.logging.format = "json".to_string();
    }
    propdesk_core::init_logging(&config.logging)?;

    let session_path = config.session.resolve_path()?;
    debug!(path = %session_path.display(), base_url = %config.api.base_url, "Starting");

    let session = Arc::new(SessionManager::new(FileSessionStore::new(&session_path)));
    let client = ApiClient::new(&config.api, session)?;
    if let Some(user) = client.restore_session() {
        debug!(user = %user.email, "Using stored session");
    }

    let ctx = CommandContext {
        client,
        challenge: ChallengeFile::beside(&session_path),
        output: cli.output,
    };

    let result = run(&ctx, cli.command).await;
    if let Err(e) = &result
        && let Some(hint) = e.downcast_ref::<propdesk_core::Error>().and_then(hint_for)
    {
        eprintln!("{hint}");
    }
    result
}

/// Follow-up advice printed under an API error
const fn hint_for(err: &propdesk_core::Error) -> Option<&'static str> {
    if err.is_session_failure() {
        Some("Not signed in. Run `propdesk login` first.")
    } else if err.is_retryable() {
        Some("The API did not complete the request; try again in a moment.")
    } else {
        None
    }
}

async fn run(ctx: &CommandContext, command: Commands) -> Result<()> {
    match command {
        Commands::Login { email, password } => login(ctx, &email, password).await,
        Commands::Verify { code } => verify(ctx, &code).await,
        Commands::ResendOtp => resend_otp(ctx).await,
        Commands::ForgotPassword { email } => {
            let form = ForgotPasswordForm::new(email);
            ctx.client.request_password_reset(&form).await?;
            ctx.say(&format!(
                "If an account exists for {}, a reset link is on its way.",
                form.email
            ));
            Ok(())
        }
        Commands::ResetPassword { token, password } => {
            let form = ResetPasswordForm::new(token, password.clone(), password);
            ctx.client.reset_password(&form).await?;
            ctx.say("Password updated. Sign in with `propdesk login`.");
            Ok(())
        }
        Commands::Logout => {
            ctx.client.logout().await;
            ctx.challenge.clear()?;
            ctx.say("Signed out.");
            Ok(())
        }
        Commands::Whoami => {
            let user = ctx.client.current_user().await?;
            ctx.print(&user, || format!("{}\n", output::user_line(&user)))
        }
        Commands::Listings { action } => listings(ctx, action).await,
    }
}

async fn login(ctx: &CommandContext, email: &str, password: String) -> Result<()> {
    match ctx.client.login(&LoginForm::new(email, password)).await? {
        LoginOutcome::Authenticated(user) => {
            ctx.challenge.clear()?;
            ctx.print(&user, || format!("Signed in as {}\n", output::user_line(&user)))
        }
        LoginOutcome::OtpRequired(challenge) => {
            ctx.challenge.save(&challenge)?;
            ctx.print(&challenge, || {
                format!(
                    "A verification code was sent to {}. Run `propdesk verify <code>` \
                     within {}.\n",
                    challenge.email,
                    output::countdown(challenge.seconds_remaining(Utc::now()))
                )
            })
        }
    }
}

async fn verify(ctx: &CommandContext, code: &str) -> Result<()> {
    let Some(challenge) = ctx.challenge.load()? else {
        bail!("no sign-in is waiting for a code; run `propdesk login` first");
    };

    let user = ctx.client.verify_otp(&challenge, &OtpForm::new(code)).await?;
    ctx.challenge.clear()?;
    ctx.print(&user, || format!("Signed in as {}\n", output::user_line(&user)))
}

async fn resend_otp(ctx: &CommandContext) -> Result<()> {
    let Some(challenge) = ctx.challenge.load()? else {
        bail!("no sign-in is waiting for a code; run `propdesk login` first");
    };

    let fresh = ctx.client.resend_otp(&challenge).await?;
    ctx.challenge.save(&fresh)?;
    ctx.print(&fresh, || {
        format!(
            "A new code was sent to {}. It expires in {}.\n",
            fresh.email,
            output::countdown(fresh.seconds_remaining(Utc::now()))
        )
    })
}

fn require_confirmation(confirm: &Confirm, action: ListingAction) -> Result<()> {
    if confirm.yes || !action.requires_confirmation() {
        return Ok(());
    }
    bail!("`{action}` needs confirmation; re-run with --yes")
}

async fn listings(ctx: &CommandContext, command: ListingCommands) -> Result<()> {
    let (id, action, reason) = match command {
        ListingCommands::List {
            status,
            search,
            page,
            per_page,
        } => {
            let query = ListingQuery::new()
                .with_status(status)
                .with_search(search.unwrap_or_default())
                .with_page(page)
                .with_per_page(per_page);
            let page = ctx.client.list_listings(&query).await?;
            return ctx.print(&page, || output::listing_table(&page));
        }
        ListingCommands::Show { id } => {
            let listing = ctx.client.get_listing(id).await?;
            return ctx.print(&listing, || output::listing_details(&listing));
        }
        ListingCommands::Edit { id, changes } => {
            let listing = ctx.client.get_listing(id).await?;
            let form = changes.apply(&listing);
            let updated = ctx.client.update_listing(&listing, &form).await?;
            return ctx.print(&updated, || {
                format!("Saved changes to \"{}\".\n", updated.title)
            });
        }
        ListingCommands::Delete { id, confirm } => {
            require_confirmation(&confirm, ListingAction::Delete)?;
            let listing = ctx.client.get_listing(id).await?;
            ctx.client.delete_listing(&listing).await?;
            ctx.say(&format!("Deleted \"{}\".", listing.title));
            return Ok(());
        }
        ListingCommands::Approve { id } => (id, ListingAction::Approve, None),
        ListingCommands::Publish { id } => (id, ListingAction::Publish, None),
        ListingCommands::Unpublish { id, confirm } => {
            require_confirmation(&confirm, ListingAction::Unpublish)?;
            (id, ListingAction::Unpublish, None)
        }
        ListingCommands::Reject {
            id,
            reason,
            confirm,
        } => {
            require_confirmation(&confirm, ListingAction::Reject)?;
            validate_reason(&reason)?;
            (id, ListingAction::Reject, Some(reason))
        }
    };

    let listing = ctx.client.get_listing(id).await?;
    let updated = ctx
        .client
        .apply_action(&listing, action, reason.as_deref())
        .await?;
    ctx.print(&updated, || {
        format!("\"{}\" is now {}.\n", updated.title, updated.status.label())
    })
}

/// Fail before any request when the reason would be refused anyway
fn validate_reason(reason: &str) -> Result<()> {
    propdesk_core::validate_form(&RejectForm::new(reason))?;
    Ok(())
}
