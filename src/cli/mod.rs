// src/cli/mod.rs
//! CLI definitions for pkgrepo
//!
//! This module contains all command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.

use clap::{Parser, Subcommand};
use pkgrepo::config::DEFAULT_CONFIG_PATH;

mod repo;

pub use repo::RepoCommands;

#[derive(Parser)]
#[command(name = "pkgrepo")]
#[command(author = "pkgrepo Contributors")]
#[command(version)]
#[command(about = "Build farm and repository manager for PKGBUILD trees", long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the pkgrepo database
    Init,

    /// Scan the package tree and refresh base package metadata
    Refresh {
        /// Queue builds for every repository afterwards
        #[arg(long)]
        build: bool,

        /// Rebuild even when a matching build is recorded
        #[arg(short, long, requires = "build")]
        force: bool,
    },

    /// Repository management
    #[command(subcommand)]
    Repo(RepoCommands),

    /// Build the packages of a repository, or one package in it
    Build {
        /// Repository name
        repository: String,

        /// Package name (builds the whole repository if omitted)
        package: Option<String>,

        /// Rebuild even when a matching build is recorded
        #[arg(short, long)]
        force: bool,
    },

    /// Build every repository
    BuildAll {
        /// Rebuild even when a matching build is recorded
        #[arg(short, long)]
        force: bool,
    },

    /// List base packages and their build state
    List,

    /// Show the build history of a base package
    History {
        /// Base package name (pkgbase)
        name: String,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
