// src/commands/system.rs
//! System commands (init, completions)

use super::load_context;
use crate::cli::Cli;
use anyhow::{Context as _, Result};
use clap::CommandFactory;
use std::fs;
use tracing::info;

/// Initialize the database and the configured directory roots
pub fn cmd_init(config_path: &str) -> Result<()> {
    let ctx = load_context(config_path)?;
    let db_path = ctx.config.db_path();

    info!("Initializing pkgrepo database at: {}", db_path);
    pkgrepo::db::init(&db_path)?;
    println!("Database initialized successfully at: {}", db_path);

    for dir in [
        &ctx.config.paths.packages_root,
        &ctx.config.paths.repositories_root,
    ] {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        println!("  {}", dir.display());
    }
    Ok(())
}

/// Print shell completions to stdout
pub fn cmd_completions(shell: clap_complete::Shell) -> Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "pkgrepo", &mut std::io::stdout());
    Ok(())
}
