//! CLI administration tool for the gacha backend.
//!
//! Manages players and the card catalog directly against the database,
//! without going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Register a player
//! cargo run --bin admin -- user create --username alice --email alice@example.com
//!
//! # Top up balances
//! cargo run --bin admin -- user grant 1 --coins 900 --gems 10
//!
//! # Add a card interactively
//! cargo run --bin admin -- card add
//!
//! # Verify the COMMON and RARE fallback pools are stocked
//! cargo run --bin admin -- catalog check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` (required): PostgreSQL connection string
//! - `REDIS_URL` (optional): the server's pool cache. Card changes clear it so
//!   running servers stop drawing a retired card immediately.

use gacha_backend::application::services::{CardService, UserService};
use gacha_backend::config::{CacheConfig, DatabaseConfig};
use gacha_backend::domain::entities::{Card, Element, NewCard, NewUser, Rarity};
use gacha_backend::infrastructure::cache::CachedCardCatalog;
use gacha_backend::infrastructure::persistence::{PgCardCatalog, PgUserLedger};
use gacha_backend::server::connect_cache;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Input, Select};
use std::sync::Arc;

type Cards = CardService<CachedCardCatalog<PgCardCatalog>>;

/// CLI tool for managing the gacha backend.
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
    /// Manage players
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Manage catalog cards
    Card {
        #[command(subcommand)]
        action: CardAction,
    },

    /// Catalog diagnostics
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Register a player with the starting balances
    Create {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        email: String,
    },

    /// Show a player's profile
    Show { id: i64 },

    /// Add coins and/or gems to a player's balances
    Grant {
        id: i64,

        #[arg(long, default_value_t = 0)]
        coins: i64,

        #[arg(long, default_value_t = 0)]
        gems: i64,
    },
}

#[derive(Subcommand)]
enum CardAction {
    /// Add a card (interactive)
    Add,

    /// Show a card, including retired ones
    Show { id: i64 },

    /// List active cards
    List {
        /// Only show one rarity (COMMON, RARE, EPIC, LEGENDARY)
        #[arg(short, long)]
        rarity: Option<Rarity>,
    },

    /// Enable or disable a card for draws
    Toggle {
        id: i64,

        #[arg(long, action = clap::ArgAction::Set)]
        active: bool,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// Check that the COMMON and RARE fallback pools have active cards
    Check,
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

    let db_config = DatabaseConfig::from_env()?;
    let cache_config = CacheConfig::from_env()?;

    let pool = db_config
        .pool_options()
        .connect(&db_config.url)
        .await
        .context("Failed to connect to database")?;
    let pool = Arc::new(pool);

    let cache = connect_cache(&cache_config).await;
    let cards = CardService::new(Arc::new(CachedCardCatalog::new(
        Arc::new(PgCardCatalog::new(pool.clone())),
        cache,
        cache_config.pool_ttl_seconds,
    )));
    let users = UserService::new(Arc::new(PgUserLedger::new(pool.clone())));

    match cli.command {
        Commands::User { action } => handle_user_action(action, &users).await?,
        Commands::Card { action } => handle_card_action(action, &cards).await?,
        Commands::Catalog {
            action: CatalogAction::Check,
        } => check_catalog(&cards).await?,
        Commands::Db {
            action: DbAction::Check,
        } => {
            println!("{}", "🔍 Checking database connection...".bright_blue());
            sqlx::query("SELECT 1").fetch_one(pool.as_ref()).await?;
            println!("{}", "✅ Database connection OK".green().bold());
        }
    }

    Ok(())
}

async fn handle_user_action(
    action: UserAction,
    users: &UserService<PgUserLedger>,
) -> Result<()> {
    match action {
        UserAction::Create { username, email } => {
            let user = users
                .create_user(NewUser { username, email })
                .await
                .map_err(|e| anyhow::anyhow!("Failed to create user: {}", e))?;
            println!("{}", "✅ User created".green().bold());
            println!("  ID:    {}", user.id.to_string().bright_white());
            println!("  Coins: {}", user.coins.to_string().yellow());
            println!("  Gems:  {}", user.gems.to_string().magenta());
        }
        UserAction::Show { id } => {
            let user = users
                .get_user(id)
                .await
                .map_err(|e| anyhow::anyhow!("{}", e))?;
            println!("{}", format!("👤 {}", user.username).bright_blue().bold());
            println!("  Email: {}", user.email);
            println!("  Coins: {}", user.coins.to_string().yellow());
            println!("  Gems:  {}", user.gems.to_string().magenta());
            println!("  Level: {} ({} xp)", user.level, user.experience_points);
        }
        UserAction::Grant { id, coins, gems } => {
            if coins == 0 && gems == 0 {
                println!("{}", "Nothing to grant".yellow());
                return Ok(());
            }

            let updated = users
                .grant_currency(id, coins, gems)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to update balances: {}", e))?;

            println!("{}", "✅ Balances updated".green().bold());
            println!(
                "  Coins: {} ({:+})",
                updated.coins.to_string().yellow(),
                coins
            );
            println!(
                "  Gems:  {} ({:+})",
                updated.gems.to_string().magenta(),
                gems
            );
        }
    }

    Ok(())
}

async fn handle_card_action(action: CardAction, cards: &Cards) -> Result<()> {
    match action {
        CardAction::Add => add_card(cards).await?,
        CardAction::Show { id } => {
            let card = cards
                .find_card(id)
                .await
                .map_err(|e| anyhow::anyhow!("{}", e))?;
            print_cards(std::slice::from_ref(&card));
            if !card.is_active {
                println!("  {}", "Retired: excluded from draws".red());
            }
        }
        CardAction::List { rarity } => {
            let list = cards
                .list_active(rarity, None)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to list cards: {}", e))?;
            print_cards(&list);
        }
        CardAction::Toggle { id, active } => {
            let card = cards
                .set_active(id, active)
                .await
                .map_err(|e| anyhow::anyhow!("{}", e))?;
            let state = if card.is_active {
                "ACTIVE".green()
            } else {
                "INACTIVE".red()
            };
            println!("  {} is now {}", card.name.cyan(), state);
        }
    }

    Ok(())
}

/// Prompts for every card field, then confirms before inserting.
async fn add_card(cards: &Cards) -> Result<()> {
    println!("{}", "🃏 Add Card".bright_blue().bold());
    println!();

    let name: String = Input::new().with_prompt("Name").interact_text()?;
    let description: String = Input::new()
        .with_prompt("Description (optional)")
        .allow_empty(true)
        .interact_text()?;
    let attack: i32 = Input::new().with_prompt("Attack").interact_text()?;
    let defense: i32 = Input::new().with_prompt("Defense").interact_text()?;
    let cost: i32 = Input::new().with_prompt("Cost").interact_text()?;

    let rarity_labels: Vec<&str> = Rarity::ALL.iter().map(Rarity::as_str).collect();
    let rarity = Rarity::ALL[Select::new()
        .with_prompt("Rarity")
        .items(&rarity_labels)
        .default(0)
        .interact()?];

    let element_labels: Vec<&str> = Element::ALL.iter().map(Element::as_str).collect();
    let element = Element::ALL[Select::new()
        .with_prompt("Element")
        .items(&element_labels)
        .default(0)
        .interact()?];

    let image_url: String = Input::new()
        .with_prompt("Image URL (optional)")
        .allow_empty(true)
        .interact_text()?;

    println!();
    println!(
        "  {} [{}] {} ATK {} / DEF {} / COST {}",
        name.cyan(),
        rarity_colored(rarity),
        element.as_str().bright_black(),
        attack,
        defense,
        cost
    );
    println!();

    let confirmed = Confirm::new()
        .with_prompt("Add this card?")
        .default(true)
        .interact()?;

    if !confirmed {
        println!("{}", "❌ Cancelled".red());
        return Ok(());
    }

    let non_empty = |s: String| (!s.trim().is_empty()).then_some(s);
    let card = cards
        .create_card(NewCard {
            name,
            description: non_empty(description),
            attack,
            defense,
            cost,
            rarity,
            element,
            image_url: non_empty(image_url),
        })
        .await
        .map_err(|e| anyhow::anyhow!("Failed to add card: {}", e))?;

    println!(
        "{}",
        format!("✅ Card #{} added", card.id).green().bold()
    );
    Ok(())
}

async fn check_catalog(cards: &Cards) -> Result<()> {
    println!("{}", "🔍 Checking catalog fallback pools...".bright_blue());

    let report = cards
        .check_provisioning()
        .await
        .map_err(|e| anyhow::anyhow!("Catalog check failed: {}", e))?;

    println!("  COMMON: {}", report.active_common.to_string().bright_white());
    println!("  RARE:   {}", report.active_rare.to_string().bright_white());

    if report.is_ready() {
        println!("{}", "✅ Catalog can serve every draw".green().bold());
        Ok(())
    } else {
        println!(
            "{}",
            "⚠️  Draws will fail until COMMON and RARE each have an active card"
                .red()
                .bold()
        );
        anyhow::bail!("catalog is not provisioned")
    }
}

fn print_cards(cards: &[Card]) {
    if cards.is_empty() {
        println!("{}", "  No active cards".yellow());
        return;
    }

    println!(
        "  {:<5} {:<30} {:<10} {:<7} {}",
        "ID".bright_white().bold(),
        "Name".bright_white().bold(),
        "Rarity".bright_white().bold(),
        "Element".bright_white().bold(),
        "ATK/DEF/COST".bright_white().bold()
    );
    println!("  {}", "─".repeat(70).bright_black());

    for card in cards {
        println!(
            "  {:<5} {:<30} {:<10} {:<7} {}/{}/{}",
            card.id.to_string().bright_black(),
            card.name.cyan(),
            rarity_colored(card.rarity),
            card.element.as_str(),
            card.attack,
            card.defense,
            card.cost
        );
    }

    println!();
    println!("  Total: {}", cards.len().to_string().bright_white().bold());
}

fn rarity_colored(rarity: Rarity) -> ColoredString {
    match rarity {
        Rarity::Common => rarity.as_str().white(),
        Rarity::Rare => rarity.as_str().blue(),
        Rarity::Epic => rarity.as_str().magenta(),
        Rarity::Legendary => rarity.as_str().yellow().bold(),
    }
}
