//! CLI module - the application shell's account management surface.
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Finledger - personal finance ledger
/// Account, role and secret-key management
#[derive(Parser)]
#[command(name = "finledger")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Use this config file instead of the search path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create default config file
    Init,

    /// Create a new account and write its secret key file
    Register {
        username: String,
        /// Prompted on stdin when omitted
        #[arg(long)]
        password: Option<String>,
        /// Directory for the key file (defaults to keys.key_dir)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Check a username, password and key file
    Login {
        username: String,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        key_file: PathBuf,
    },

    /// Manage accounts
    Users {
        #[command(subcommand)]
        command: UserCommands,
    },
}

/// Credentials that open a session before a privileged command runs.
#[derive(Args, Clone)]
pub struct SessionArgs {
    /// Username to act as
    #[arg(long = "as", value_name = "USERNAME")]
    pub username: String,
    #[arg(long)]
    pub password: Option<String>,
    #[arg(long)]
    pub key_file: PathBuf,
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// List accounts
    #[command(alias = "ls")]
    List {
        /// Only names containing this text (case-insensitive)
        #[arg(long)]
        search: Option<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Issue a new secret key; the old one stops working
    RotateKey {
        /// Target user ID
        id: i32,
        /// Directory for the new key file (defaults to keys.key_dir)
        #[arg(long)]
        out: Option<PathBuf>,
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Grant the admin role
    Promote {
        id: i32,
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Revoke the admin role
    Demote {
        id: i32,
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Delete an account
    #[command(alias = "rm")]
    Delete {
        id: i32,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Change your own password
    Passwd {
        /// Prompted on stdin when omitted
        #[arg(long)]
        new_password: Option<String>,
        #[command(flatten)]
        session: SessionArgs,
    },
}

pub use commands::*;
