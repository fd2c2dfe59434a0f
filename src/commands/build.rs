// src/commands/build.rs
//! Build commands

use super::load_context;
use anyhow::{Context as _, Result, anyhow};
use pkgrepo::db::models::{Package, Repository};
use pkgrepo::{BuildOutcome, BuildQueue};
use std::sync::Arc;
use tracing::info;

/// Run a queue to completion on a fresh runtime and print a summary
pub(super) fn run_queue(queue: BuildQueue) -> Result<()> {
    if queue.is_empty() {
        println!("Nothing to build");
        return Ok(());
    }

    info!("Running {} build tasks", queue.len());
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start build runtime")?;
    let reports = rt.block_on(queue.run());

    let mut failed = 0;
    for report in &reports {
        match &report.outcome {
            Ok(outcome) => {
                let published = if report.published { " (published)" } else { "" };
                println!("  [{}] {}: {}{}", report.group, report.name, outcome, published);
                if *outcome == BuildOutcome::Failed {
                    failed += 1;
                }
            }
            Err(e) => {
                println!("  [{}] {}: error: {}", report.group, report.name, e);
                failed += 1;
            }
        }
    }

    println!("{} tasks, {} failed", reports.len(), failed);
    Ok(())
}

/// Build a whole repository, or one package of it
pub fn cmd_build(config_path: &str, repository: &str, package: Option<&str>, force: bool) -> Result<()> {
    let ctx = Arc::new(load_context(config_path)?);
    let conn = ctx.open_db()?;
    let repo = pkgrepo::repository::find_repository(&conn, repository)?;
    let mut queue = BuildQueue::new(Arc::clone(&ctx));

    match package {
        Some(name) => {
            let published = Repository::packages(&conn, repo.require_id()?)?;
            let pkg = match published.into_iter().find(|p| p.name == name) {
                Some(pkg) => pkg,
                None => Package::find_real_by_name(&conn, name)?
                    .into_iter()
                    .next()
                    .ok_or_else(|| anyhow!("Package '{}' not found", name))?,
            };
            pkgrepo::build::submit_package(&mut queue, &conn, &pkg, &repo, force)?;
        }
        None => {
            pkgrepo::build::build_repository(&mut queue, &conn, &repo, force)?;
        }
    }

    drop(conn);
    run_queue(queue)
}

/// Build every repository
pub fn cmd_build_all(config_path: &str, force: bool) -> Result<()> {
    let ctx = Arc::new(load_context(config_path)?);
    let conn = ctx.open_db()?;
    let mut queue = BuildQueue::new(Arc::clone(&ctx));

    pkgrepo::build::build_all(&mut queue, &conn, force)?;
    drop(conn);
    run_queue(queue)
}
