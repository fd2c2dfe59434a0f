// src/repository/publish.rs

//! Artifact publication into per-architecture repository directories

use crate::context::Context;
use crate::db::models::{Architecture, Package, Repository};
use crate::error::{Error, Result};
use crate::graph;
use rusqlite::Connection;
use std::fs;
use tracing::{info, warn};

/// Copy a built artifact into the repository and add it to the index
///
/// Returns whether the index tool succeeded.
pub fn publish_artifact(
    conn: &Connection,
    ctx: &Context,
    package: &Package,
    architecture: &Architecture,
    repo: &Repository,
) -> Result<bool> {
    let source = graph::package_artifact_path(conn, package, &architecture.name)?;
    let Some(filename) = source.file_name() else {
        return Err(Error::InvalidArgument(format!(
            "Artifact path {} has no filename",
            source.display()
        )));
    };

    let dir = repo.directory(&ctx.config.paths.repositories_root, &architecture.name);
    fs::create_dir_all(&dir)?;
    fs::copy(&source, dir.join(filename)).map_err(|e| {
        Error::IoError(format!(
            "Failed to copy {} to {}: {}",
            source.display(),
            dir.display(),
            e
        ))
    })?;

    let filename = filename.to_string_lossy();
    let indexed = ctx
        .tools
        .indexer
        .add(&dir, &repo.db_filename(), &filename, ctx.config.build.delta)?;

    if indexed {
        info!("Published {} to {}/{}", filename, repo.name, architecture.name);
    } else {
        warn!("Index update failed for {} in {}/{}", filename, repo.name, architecture.name);
    }
    Ok(indexed)
}

/// Remove a package from one architecture's index, best effort
pub fn unpublish_package(ctx: &Context, repo: &Repository, architecture: &str, package_name: &str) -> bool {
    let dir = repo.directory(&ctx.config.paths.repositories_root, architecture);
    if !dir.is_dir() {
        return false;
    }

    match ctx
        .tools
        .indexer
        .remove(&dir, &repo.db_filename(), package_name)
    {
        Ok(true) => {
            info!("Removed {} from {}/{}", package_name, repo.name, architecture);
            true
        }
        Ok(false) => {
            warn!("Index tool could not remove {} from {}/{}", package_name, repo.name, architecture);
            false
        }
        Err(e) => {
            warn!("Failed to remove {} from {}/{}: {}", package_name, repo.name, architecture, e);
            false
        }
    }
}
