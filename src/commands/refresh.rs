// src/commands/refresh.rs
//! Package tree refresh

use super::build::run_queue;
use super::load_context;
use anyhow::Result;
use pkgrepo::BuildQueue;
use std::sync::Arc;
use tracing::info;

/// Scan the package tree, optionally queueing builds for every repository afterwards
pub fn cmd_refresh(config_path: &str, build: bool, force: bool) -> Result<()> {
    let ctx = Arc::new(load_context(config_path)?);
    let mut conn = ctx.open_db()?;

    info!("Refreshing {}", ctx.config.paths.packages_root.display());
    let report = pkgrepo::scanner::refresh(&mut conn, &ctx)?;

    println!("Refreshed {}", ctx.config.paths.packages_root.display());
    println!("  New:       {}", report.registered);
    println!("  Refreshed: {}", report.refreshed);
    println!("  Removed:   {}", report.removed);
    if report.failed > 0 {
        println!("  Failed:    {} (see log)", report.failed);
    }

    if build {
        let mut queue = BuildQueue::new(Arc::clone(&ctx));
        pkgrepo::build::build_all(&mut queue, &conn, force)?;
        drop(conn);
        run_queue(queue)?;
    }
    Ok(())
}
