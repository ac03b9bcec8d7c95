//! CLI module - Command-line interface for Vestor
//!
//! This module provides a structured CLI using clap for argument parsing.

pub mod commands;

use clap::{Parser, Subcommand};

/// Vestor - authentication and tier-based access control service
#[derive(Parser)]
#[command(name = "vestor")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the API server with the maintenance scheduler
    #[command(alias = "daemon", alias = "-d")]
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Manage user accounts
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Create a user account
    Add {
        /// Email address (unique)
        email: String,
        /// Display name shown to the user
        #[arg(long, default_value = "")]
        display_name: String,
        /// Tier: free, basic, premium, or enterprise
        #[arg(long, default_value = "free")]
        tier: String,
        /// Password; prompted on stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// List all user accounts
    #[command(alias = "ls")]
    List,

    /// Move a user to a different tier
    SetTier {
        /// Email address of the user
        email: String,
        /// Tier: free, basic, premium, or enterprise
        tier: String,
    },

    /// Soft-deactivate a user and revoke their sessions
    Deactivate {
        /// Email address of the user
        email: String,
    },

    /// Reactivate a previously deactivated user
    Activate {
        /// Email address of the user
        email: String,
    },
}
