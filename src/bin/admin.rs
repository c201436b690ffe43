//! CLI administration tool for url-redirector.
//!
//! Issues principal tokens, lists links and shows statistics without going
//! through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Issue a bearer token for an owner
//! cargo run --bin admin -- token issue --owner alice
//!
//! # List an owner's links
//! cargo run --bin admin -- links list --owner alice
//!
//! # View statistics
//! cargo run --bin admin -- stats
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `TOKEN_SIGNING_SECRET`: required by `token issue`
//! - `DATABASE_URL` (or `DB_*` components): required by every other command

use url_redirector::application::services::AuthService;
use url_redirector::config::{Config, mask_connection_string};
use url_redirector::domain::repositories::LinkRepository;
use url_redirector::infrastructure::persistence::PgLinkRepository;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Input;
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing url-redirector.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Manage principal tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// Inspect links
    Links {
        #[command(subcommand)]
        action: LinksAction,
    },

    /// Show statistics
    Stats,

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Issue a bearer token for an owner
    Issue {
        /// Owner id the token acts for (prompted if omitted)
        #[arg(short, long)]
        owner: Option<String>,
    },
}

#[derive(Subcommand)]
enum LinksAction {
    /// List an owner's links, newest first
    List {
        #[arg(short, long)]
        owner: String,
    },
}

#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Token { action } => handle_token_action(action)?,
        Commands::Links { action } => handle_links_action(action, &connect().await?).await?,
        Commands::Stats => handle_stats(&connect().await?).await?,
        Commands::Db { action } => handle_db_action(action, &connect().await?).await?,
    }

    Ok(())
}

async fn connect() -> Result<PgPool> {
    let database_url = Config::load_database_url()?;

    PgPool::connect(&database_url)
        .await
        .with_context(|| {
            format!(
                "Failed to connect to database at {}",
                mask_connection_string(&database_url)
            )
        })
}

/// Issues a principal token.
///
/// Tokens are derived from the owner id and `TOKEN_SIGNING_SECRET`; issuing
/// twice for the same owner yields the same token, and nothing is stored.
fn handle_token_action(action: TokenAction) -> Result<()> {
    let TokenAction::Issue { owner } = action;

    let secret = std::env::var("TOKEN_SIGNING_SECRET")
        .context("TOKEN_SIGNING_SECRET must be set")?;
    if secret.is_empty() {
        anyhow::bail!("TOKEN_SIGNING_SECRET must not be empty");
    }

    println!("{}", "🔑 Issue Principal Token".bright_blue().bold());
    println!();

    let owner = match owner {
        Some(owner) => owner,
        None => Input::new().with_prompt("Owner id").interact_text()?,
    };
    let owner = owner.trim().to_string();
    if owner.is_empty() {
        anyhow::bail!("Owner id must not be empty");
    }

    let token = AuthService::new(secret).issue_token(&owner);

    println!("  Owner: {}", owner.cyan());
    println!("  Token: {}", token.bright_yellow().bold());
    println!();
    println!("{}", "Add this to your requests:".bright_white());
    println!(
        "  {}: Bearer {}",
        "Authorization".bright_cyan(),
        token.bright_yellow()
    );
    println!();
    println!("{}", "Example:".bright_white());
    println!(
        "  curl -H \"Authorization: Bearer {}\" http://localhost:3000/urls",
        token.bright_yellow()
    );
    println!();

    Ok(())
}

/// Lists an owner's links.
///
/// # Output Format
///
/// ```text
/// 📋 Links for alice
///
///   Slug         Created            Target
///   ───────────────────────────────────────────────────────────
///   promo        2024-01-16 14:20   https://example.com/sale
///   x7Yk2a       2024-01-15 10:30   https://example.com
/// ```
async fn handle_links_action(action: LinksAction, pool: &PgPool) -> Result<()> {
    let LinksAction::List { owner } = action;
    let repo = PgLinkRepository::new(Arc::new(pool.clone()));

    println!("{}", format!("📋 Links for {owner}").bright_blue().bold());
    println!();

    let links = repo
        .find_by_owner(&owner)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list links: {}", e))?;

    if links.is_empty() {
        println!("{}", "  No links found".yellow());
        return Ok(());
    }

    println!(
        "  {:<12} {:<18} {}",
        "Slug".bright_white().bold(),
        "Created".bright_white().bold(),
        "Target".bright_white().bold()
    );
    println!("  {}", "─".repeat(75).bright_black());

    for link in &links {
        println!(
            "  {:<12} {:<18} {}",
            link.slug.cyan(),
            link.created_at
                .format("%Y-%m-%d %H:%M")
                .to_string()
                .bright_black(),
            link.target
        );
    }

    println!();
    println!("  Total: {}", links.len().to_string().bright_white().bold());
    println!();

    Ok(())
}

/// Displays link and click totals.
async fn handle_stats(pool: &PgPool) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let links_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM short_links")
        .fetch_one(pool)
        .await?;

    let owners_count: i64 =
        sqlx::query_scalar("SELECT COUNT(DISTINCT owner_id) FROM short_links")
            .fetch_one(pool)
            .await?;

    let clicks_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM link_clicks")
        .fetch_one(pool)
        .await?;

    println!(
        "  Links:   {}",
        links_count.to_string().bright_green().bold()
    );
    println!(
        "  Owners:  {}",
        owners_count.to_string().bright_green().bold()
    );
    println!(
        "  Clicks:  {}",
        clicks_count.to_string().bright_green().bold()
    );
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            let repo = PgLinkRepository::new(Arc::new(pool.clone()));
            repo.ping()
                .await
                .map_err(|e| anyhow::anyhow!("Database check failed: {}", e))?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
    }

    Ok(())
}
