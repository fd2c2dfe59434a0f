// src/commands/mod.rs
//! Command handlers for the pkgrepo CLI

mod build;
mod package;
mod refresh;
mod repo;
mod system;

// Re-export all command handlers
pub use build::{cmd_build, cmd_build_all};
pub use package::{cmd_history, cmd_list};
pub use refresh::cmd_refresh;
pub use repo::{
    cmd_repo_add, cmd_repo_add_package, cmd_repo_arch, cmd_repo_available, cmd_repo_list,
    cmd_repo_remove, cmd_repo_remove_package, cmd_repo_show, cmd_repo_update,
};
pub use system::{cmd_completions, cmd_init};

use anyhow::{Context as _, Result};
use pkgrepo::{Config, Context};
use std::path::Path;

/// Load the configuration and build the run context
pub fn load_context(config_path: &str) -> Result<Context> {
    let config = Config::load_or_default(Path::new(config_path))
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;
    Ok(Context::from_config(config))
}
