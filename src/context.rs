// src/context.rs

//! Shared run context: configuration plus the external tools in use

use crate::config::Config;
use crate::db;
use crate::error::Result;
use crate::tools::Toolchain;
use rusqlite::Connection;

/// Everything an operation needs besides its database connection
#[derive(Debug, Clone)]
pub struct Context {
    pub config: Config,
    pub tools: Toolchain,
}

impl Context {
    pub fn new(config: Config, tools: Toolchain) -> Self {
        Self { config, tools }
    }

    /// Context using the subprocess tools named in `config`
    pub fn from_config(config: Config) -> Self {
        let tools = Toolchain::from_config(&config);
        Self::new(config, tools)
    }

    /// Open the configured database, applying pending migrations
    pub fn open_db(&self) -> Result<Connection> {
        db::open(&self.config.db_path())
    }
}
