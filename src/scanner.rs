// src/scanner.rs

//! Package tree refresh
//!
//! Discovers base packages under the packages root (two levels deep, hidden
//! entries skipped), registers and extracts them, then revisits every known
//! base package: those whose PKGBUILD disappeared are deleted, the rest are
//! extracted again so dependencies on packages registered later in the same
//! run resolve.

use crate::context::Context;
use crate::db::models::{BasePackage, PKGBUILD, TRUNK};
use crate::error::{Error, Result};
use crate::graph;
use crate::metadata;
use crate::static_index;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Counts from one refresh
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Base packages seen for the first time
    pub registered: usize,
    /// Base packages extracted again in the second pass
    pub refreshed: usize,
    /// Base packages deleted because their PKGBUILD is gone
    pub removed: usize,
    /// Extractions that failed (logged, not fatal)
    pub failed: usize,
}

/// A base package directory found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovered {
    pub base_directory: PathBuf,
    pub official: bool,
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

/// Visible subdirectories of `dir`, sorted; unreadable entries are skipped
fn subdirectories(dir: &Path) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e));

    for entry in walker {
        match entry {
            Ok(entry) if entry.file_type().is_dir() => dirs.push(entry.into_path()),
            Ok(_) => {}
            Err(e) => debug!("Skipping unreadable entry under {}: {}", dir.display(), e),
        }
    }
    dirs
}

/// Layout of a candidate directory: `Some(false)` for a PKGBUILD directly
/// inside, `Some(true)` for one under `trunk/`
fn layout(dir: &Path) -> Option<bool> {
    if dir.join(PKGBUILD).is_file() {
        Some(false)
    } else if dir.join(TRUNK).join(PKGBUILD).is_file() {
        Some(true)
    } else {
        None
    }
}

/// Find base package directories under `root`
pub fn discover(root: &Path) -> Vec<Discovered> {
    let mut found = Vec::new();

    for first in subdirectories(root) {
        match layout(&first) {
            Some(true) => {
                // Official trees are never nested
                found.push(Discovered {
                    base_directory: first,
                    official: true,
                });
                continue;
            }
            Some(false) => found.push(Discovered {
                base_directory: first.clone(),
                official: false,
            }),
            None => {}
        }

        for second in subdirectories(&first) {
            if second.join(PKGBUILD).is_file() {
                found.push(Discovered {
                    base_directory: second,
                    official: false,
                });
            }
        }
    }

    found
}

/// Re-scan the packages root and bring the database in line with it
pub fn refresh(conn: &mut Connection, ctx: &Context) -> Result<RefreshReport> {
    let root = &ctx.config.paths.packages_root;
    if !root.is_dir() {
        return Err(Error::NotFoundError(format!(
            "Packages root {} does not exist",
            root.display()
        )));
    }

    if let Err(e) = ctx.tools.vcs.update_tree(root) {
        warn!("Could not update {}: {}", root.display(), e);
    }

    let mut report = RefreshReport::default();
    let generator = ctx.tools.srcinfo.as_ref();

    for found in discover(root) {
        let dir = found.base_directory.to_string_lossy().to_string();
        if BasePackage::find_by_directory(conn, &dir)?.is_none() {
            report.registered += 1;
        }

        let mut base = BasePackage::get_or_create(conn, &dir, found.official)?;
        if let Err(e) = metadata::extract(conn, &mut base, generator) {
            warn!("Skipping {}: {}", dir, e);
        }
    }

    for mut base in BasePackage::list_all(conn)? {
        if !base.pkgbuild_path().is_file() {
            info!("Removing {}: {} is gone", base, base.pkgbuild_path().display());
            BasePackage::delete(conn, base.require_id()?)?;
            report.removed += 1;
            continue;
        }

        match metadata::extract(conn, &mut base, generator) {
            Ok(()) => report.refreshed += 1,
            Err(e) => {
                warn!("Could not extract {}: {}", base, e);
                report.failed += 1;
            }
        }
    }

    graph::resolve_all(conn)?;

    if ctx.config.build.static_index
        && let Err(e) = static_index::write_index(conn, &ctx.config)
    {
        warn!("Cannot write static index: {}", e);
    }

    info!(
        "Refresh: {} new, {} refreshed, {} removed, {} failed",
        report.registered, report.refreshed, report.removed, report.failed
    );
    Ok(report)
}
