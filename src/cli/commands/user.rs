//! User administration command handlers
//!
//! These run against the database directly and exist because the service
//! intentionally has no admin HTTP surface.

use crate::cli::UserCommands;
use crate::config::Config;
use crate::db::Store;
use crate::services::auth_service::{validate_email, validate_password_strength};
use crate::services::{AuthService, SeaOrmAuthService};
use crate::tiers::Tier;

fn auth_service(config: &Config, store: &Store) -> SeaOrmAuthService {
    // Throwaway bus: CLI invocations have no log listener attached.
    let (event_bus, _) = tokio::sync::broadcast::channel(16);
    SeaOrmAuthService::new(
        store.clone(),
        config.security.clone(),
        config.sessions.clone(),
        event_bus,
    )
}

pub async fn cmd_user(config: &Config, command: UserCommands) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;

    match command {
        UserCommands::Add {
            email,
            display_name,
            tier,
            password,
        } => cmd_user_add(config, &store, &email, &display_name, &tier, password).await,
        UserCommands::List => cmd_user_list(&store).await,
        UserCommands::SetTier { email, tier } => {
            cmd_user_set_tier(config, &store, &email, &tier).await
        }
        UserCommands::Deactivate { email } => cmd_user_deactivate(config, &store, &email).await,
        UserCommands::Activate { email } => cmd_user_activate(&store, &email).await,
    }
}

async fn cmd_user_add(
    config: &Config,
    store: &Store,
    email: &str,
    display_name: &str,
    tier_str: &str,
    password: Option<String>,
) -> anyhow::Result<()> {
    if let Err(e) = validate_email(email) {
        println!("Invalid email: {e}");
        return Ok(());
    }

    let Some(tier) = Tier::parse(tier_str) else {
        println!("Unknown tier: {tier_str}");
        println!("Valid tiers: free, basic, premium, enterprise");
        return Ok(());
    };

    if store.get_user_by_email(email).await?.is_some() {
        println!("A user with email {email} already exists.");
        return Ok(());
    }

    let password = match password {
        Some(p) => p,
        None => {
            println!("Password for {email}:");
            let mut input = String::new();
            std::io::stdin().read_line(&mut input)?;
            input.trim().to_string()
        }
    };

    if let Err(e) = validate_password_strength(&password) {
        println!("Rejected: {e}");
        return Ok(());
    }

    let user = store
        .create_user(email, &password, display_name, tier, &config.security)
        .await?;

    println!("✓ Created user {} (ID: {})", user.email, user.id);
    println!("  Tier: {}", user.tier);

    Ok(())
}

async fn cmd_user_list(store: &Store) -> anyhow::Result<()> {
    let users = store.list_users().await?;

    if users.is_empty() {
        println!("No users yet.");
        println!();
        println!("Add one with: vestor user add <email>");
        return Ok(());
    }

    println!("Users ({} total)", users.len());
    println!("{:-<70}", "");

    for user in users {
        let status = if user.is_active { "✓" } else { "⏸" };
        let verified = if user.email_verified { "verified" } else { "unverified" };
        let last_login = user.last_login_at.as_deref().unwrap_or("never");

        println!("{} {} [{}]", status, user.email, user.tier);
        println!(
            "  ID: {} | {} | Last login: {}",
            user.id, verified, last_login
        );
    }

    println!();
    println!("Legend: ✓ Active | ⏸ Deactivated");

    Ok(())
}

async fn cmd_user_set_tier(
    config: &Config,
    store: &Store,
    email: &str,
    tier_str: &str,
) -> anyhow::Result<()> {
    let Some(tier) = Tier::parse(tier_str) else {
        println!("Unknown tier: {tier_str}");
        println!("Valid tiers: free, basic, premium, enterprise");
        return Ok(());
    };

    let Some(user) = store.get_user_by_email(email).await? else {
        println!("No user with email {email}.");
        return Ok(());
    };

    auth_service(config, store)
        .set_tier(user.id, tier)
        .await
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    println!("✓ {} moved from {} to {}", user.email, user.tier, tier);

    Ok(())
}

async fn cmd_user_deactivate(config: &Config, store: &Store, email: &str) -> anyhow::Result<()> {
    let Some(user) = store.get_user_by_email(email).await? else {
        println!("No user with email {email}.");
        return Ok(());
    };

    if !user.is_active {
        println!("{} is already deactivated.", user.email);
        return Ok(());
    }

    auth_service(config, store)
        .deactivate(user.id)
        .await
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    println!("✓ Deactivated {} (sessions revoked)", user.email);

    Ok(())
}

async fn cmd_user_activate(store: &Store, email: &str) -> anyhow::Result<()> {
    let Some(user) = store.get_user_by_email(email).await? else {
        println!("No user with email {email}.");
        return Ok(());
    };

    if user.is_active {
        println!("{} is already active.", user.email);
        return Ok(());
    }

    store.set_user_active(user.id, true).await?;
    println!("✓ Reactivated {}", user.email);

    Ok(())
}
