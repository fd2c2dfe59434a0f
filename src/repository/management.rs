// src/repository/management.rs

//! Repository lifecycle and architecture sets

use crate::config::Config;
use crate::db;
use crate::db::models::{ANY_ARCH, Architecture, Repository};
use crate::error::{Error, Result};
use rusqlite::Connection;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Create a directory, treating "already exists" as success
fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| {
        Error::IoError(format!("Failed to create {}: {}", path.display(), e))
    })
}

/// Move a renamed repository's tree, keeping its published artifacts
fn move_directory(from: &Path, to: &Path) -> Result<()> {
    if !from.is_dir() || to.exists() {
        return Ok(());
    }
    fs::rename(from, to).map_err(|e| {
        Error::IoError(format!("Failed to move {} to {}: {}", from.display(), to.display(), e))
    })?;
    info!("Moved {} to {}", from.display(), to.display());
    Ok(())
}

/// Repositories carry concrete architectures only
fn check_architectures(repo: &Repository, names: &[String]) -> Result<()> {
    match names.iter().find(|name| name.as_str() == ANY_ARCH) {
        Some(name) => Err(Error::InvalidArgument(format!(
            "Repository '{}' cannot carry architecture '{}'",
            repo.name, name
        ))),
        None => Ok(()),
    }
}

/// Register a new repository and create its directories
pub fn create_repository(
    conn: &mut Connection,
    config: &Config,
    mut repo: Repository,
    architectures: &[String],
) -> Result<Repository> {
    if Repository::find_by_name(conn, &repo.name)?.is_some() {
        return Err(Error::ConflictError(format!(
            "Repository '{}' already exists",
            repo.name
        )));
    }
    check_architectures(&repo, architectures)?;

    ensure_dir(&repo.base_directory(&config.paths.repositories_root))?;
    let id = repo.insert(conn)?;

    if let Err(e) = set_architectures(conn, config, &repo, architectures) {
        Repository::delete(conn, id)?;
        return Err(e);
    }

    info!("Created repository {} ({})", repo.name, repo.target.label());
    Ok(repo)
}

/// Persist changed repository settings
///
/// Turning on multilib trims the architecture set to the multilib
/// architecture. A rename moves the repository's directory tree, and every
/// architecture directory exists afterwards.
pub fn update_repository(conn: &mut Connection, config: &Config, repo: &Repository) -> Result<()> {
    let id = repo.require_id()?;
    if let Some(other) = Repository::find_by_name(conn, &repo.name)?
        && other.id != Some(id)
    {
        return Err(Error::ConflictError(format!(
            "Repository '{}' already exists",
            repo.name
        )));
    }

    let previous = Repository::find_by_id(conn, id)?
        .ok_or_else(|| Error::NotFoundError(format!("Repository {} not found", id)))?;
    repo.update(conn)?;

    let root = &config.paths.repositories_root;
    if previous.name != repo.name {
        move_directory(&previous.base_directory(root), &repo.base_directory(root))?;
    }

    let current: Vec<String> = Repository::architectures(conn, id)?
        .into_iter()
        .map(|a| a.name)
        .collect();
    if repo.multilib {
        set_architectures(conn, config, repo, &current)?;
    } else {
        ensure_dir(&repo.base_directory(root))?;
        for arch in &current {
            ensure_dir(&repo.directory(root, arch))?;
        }
    }

    info!("Updated repository {}", repo.name);
    Ok(())
}

/// Delete a repository; published artifacts stay on disk
pub fn delete_repository(conn: &Connection, name: &str) -> Result<()> {
    let repo = super::find_repository(conn, name)?;
    Repository::delete(conn, repo.require_id()?)?;
    info!("Deleted repository {}", name);
    Ok(())
}

/// Replace the architecture set of a repository
///
/// Multilib repositories always end up with exactly the configured multilib
/// architecture, whatever was requested. Directories are created for every
/// resulting architecture.
pub fn set_architectures(
    conn: &mut Connection,
    config: &Config,
    repo: &Repository,
    names: &[String],
) -> Result<Vec<Architecture>> {
    let id = repo.require_id()?;
    let multilib_arch = &config.build.multilib_architecture;

    check_architectures(repo, names)?;

    let mut wanted: Vec<&str> = Vec::new();
    for name in names {
        if !wanted.contains(&name.as_str()) {
            wanted.push(name);
        }
    }

    if repo.multilib {
        let dropped: Vec<&str> = wanted
            .iter()
            .copied()
            .filter(|name| *name != multilib_arch.as_str())
            .collect();
        if !dropped.is_empty() {
            warn!(
                "Multilib repository {} only carries {}, dropping {:?}",
                repo.name, multilib_arch, dropped
            );
        }
        wanted = vec![multilib_arch.as_str()];
    }

    let archs = db::transaction(conn, |tx| {
        let mut archs = Vec::with_capacity(wanted.len());
        for name in &wanted {
            archs.push(Architecture::get_or_create(tx, name)?);
        }

        for current in Repository::architectures(tx, id)? {
            if !archs.iter().any(|a| a.id == current.id) {
                Repository::remove_architecture(tx, id, current.require_id()?)?;
            }
        }
        for arch in &archs {
            Repository::add_architecture(tx, id, arch.require_id()?)?;
        }

        Ok(archs)
    })?;

    let root = &config.paths.repositories_root;
    for arch in &archs {
        ensure_dir(&repo.directory(root, &arch.name))?;
    }

    info!(
        "Repository {} architectures: {}",
        repo.name,
        archs
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(archs)
}
