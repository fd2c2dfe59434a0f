// src/commands/repo.rs
//! Repository management commands

use super::load_context;
use anyhow::{Result, anyhow};
use pkgrepo::db::models::{Package, Repository, Target};
use pkgrepo::repository::find_repository;
use rusqlite::Connection;
use tracing::info;

/// Resolve package names to IDs of real packages
fn resolve_packages(conn: &Connection, names: &[String]) -> Result<Vec<i64>> {
    let mut ids = Vec::new();
    for name in names {
        let matches = Package::find_real_by_name(conn, name)?;
        if matches.is_empty() {
            return Err(anyhow!("Package '{}' not found", name));
        }
        for pkg in matches {
            ids.push(pkg.require_id()?);
        }
    }
    Ok(ids)
}

/// Create a repository
pub fn cmd_repo_add(
    config_path: &str,
    name: &str,
    target: &str,
    description: &str,
    multilib: bool,
    architectures: &[String],
) -> Result<()> {
    info!("Creating repository: {}", name);
    let ctx = load_context(config_path)?;
    let mut conn = ctx.open_db()?;

    let mut repo = Repository::new(name.to_string(), target.parse::<Target>()?);
    repo.description = description.to_string();
    repo.multilib = multilib;

    let repo = pkgrepo::repository::create_repository(&mut conn, &ctx.config, repo, architectures)?;
    println!("Created repository: {}", repo.name);
    println!("  Target: {}", repo.target.label());
    println!(
        "  Directory: {}",
        repo.base_directory(&ctx.config.paths.repositories_root).display()
    );
    Ok(())
}

/// List repositories
pub fn cmd_repo_list(config_path: &str) -> Result<()> {
    let ctx = load_context(config_path)?;
    let conn = ctx.open_db()?;
    let repos = Repository::list_all(&conn)?;

    if repos.is_empty() {
        println!("No repositories configured");
        return Ok(());
    }

    println!("Repositories:");
    for repo in repos {
        let id = repo.require_id()?;
        let archs: Vec<String> = Repository::architectures(&conn, id)?
            .into_iter()
            .map(|a| a.name)
            .collect();
        let count = Repository::package_ids(&conn, id)?.len();
        let multilib = if repo.multilib { " multilib" } else { "" };
        println!(
            "  {} ({}{}) [{}] {} packages",
            repo.name,
            repo.target.label(),
            multilib,
            archs.join(" "),
            count
        );
        if !repo.description.is_empty() {
            println!("      {}", repo.description);
        }
    }
    Ok(())
}

/// Show one repository
pub fn cmd_repo_show(config_path: &str, name: &str) -> Result<()> {
    let ctx = load_context(config_path)?;
    let conn = ctx.open_db()?;
    let repo = find_repository(&conn, name)?;
    let id = repo.require_id()?;

    println!("Repository: {}", repo.name);
    if !repo.description.is_empty() {
        println!("  Description: {}", repo.description);
    }
    println!("  Target: {}", repo.target.label());
    println!("  Multilib: {}", repo.multilib);
    for arch in Repository::architectures(&conn, id)? {
        println!(
            "  {}: {}",
            arch.name,
            repo.directory(&ctx.config.paths.repositories_root, &arch.name)
                .join(repo.db_filename())
                .display()
        );
    }

    let packages = Repository::packages(&conn, id)?;
    println!("  Packages ({}):", packages.len());
    for pkg in packages {
        let base = pkg.base_package(&conn)?;
        println!(
            "    {} {}",
            pkg.name,
            base.version.as_deref().unwrap_or("?")
        );
    }
    Ok(())
}

/// Delete a repository
pub fn cmd_repo_remove(config_path: &str, name: &str) -> Result<()> {
    info!("Deleting repository: {}", name);
    let ctx = load_context(config_path)?;
    let conn = ctx.open_db()?;
    pkgrepo::repository::delete_repository(&conn, name)?;
    println!("Deleted repository: {}", name);
    Ok(())
}

/// Change repository settings
pub fn cmd_repo_update(
    config_path: &str,
    name: &str,
    target: Option<&str>,
    description: Option<&str>,
    multilib: Option<bool>,
    rename: Option<&str>,
) -> Result<()> {
    let ctx = load_context(config_path)?;
    let mut conn = ctx.open_db()?;
    let mut repo = find_repository(&conn, name)?;

    if let Some(target) = target {
        repo.target = target.parse()?;
    }
    if let Some(description) = description {
        repo.description = description.to_string();
    }
    if let Some(multilib) = multilib {
        repo.multilib = multilib;
    }
    if let Some(rename) = rename {
        repo.name = rename.to_string();
    }

    pkgrepo::repository::update_repository(&mut conn, &ctx.config, &repo)?;
    println!("Updated repository: {}", repo.name);
    Ok(())
}

/// Replace the architecture set
pub fn cmd_repo_arch(config_path: &str, name: &str, architectures: &[String]) -> Result<()> {
    let ctx = load_context(config_path)?;
    let mut conn = ctx.open_db()?;
    let repo = find_repository(&conn, name)?;

    let archs = pkgrepo::repository::set_architectures(&mut conn, &ctx.config, &repo, architectures)?;
    let names: Vec<&str> = archs.iter().map(|a| a.name.as_str()).collect();
    println!("Repository {} architectures: {}", repo.name, names.join(" "));
    Ok(())
}

/// List packages that can be published
pub fn cmd_repo_available(config_path: &str, name: &str) -> Result<()> {
    let ctx = load_context(config_path)?;
    let conn = ctx.open_db()?;
    let repo = find_repository(&conn, name)?;

    let available = pkgrepo::graph::available_packages(&conn, repo.require_id()?)?;
    if available.is_empty() {
        println!("No packages available for {}", repo.name);
        return Ok(());
    }
    for pkg in available {
        println!("{}", pkg.name);
    }
    Ok(())
}

/// Publish packages and their build dependencies
pub fn cmd_repo_add_package(config_path: &str, name: &str, packages: &[String]) -> Result<()> {
    let ctx = load_context(config_path)?;
    let mut conn = ctx.open_db()?;
    let repo = find_repository(&conn, name)?;
    let ids = resolve_packages(&conn, packages)?;

    let added = pkgrepo::repository::add_packages(&mut conn, &repo, &ids)?;
    if added.is_empty() {
        println!("Nothing to add, {} already publishes these packages", repo.name);
        return Ok(());
    }
    println!("Added to {}:", repo.name);
    for pkg in added {
        println!("  {}", pkg.name);
    }
    Ok(())
}

/// Withdraw packages
pub fn cmd_repo_remove_package(config_path: &str, name: &str, packages: &[String]) -> Result<()> {
    let ctx = load_context(config_path)?;
    let mut conn = ctx.open_db()?;
    let repo = find_repository(&conn, name)?;
    let ids = resolve_packages(&conn, packages)?;

    let removed = pkgrepo::repository::remove_packages(&mut conn, &ctx, &repo, &ids)?;
    if removed.is_empty() {
        println!("None of these packages are published in {}", repo.name);
        return Ok(());
    }
    println!("Removed from {}:", repo.name);
    for pkg in removed {
        println!("  {}", pkg.name);
    }
    Ok(())
}
