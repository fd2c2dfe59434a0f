// src/repository/membership.rs

//! Published package sets
//!
//! Publishing is closed under build dependency: adding a package also adds
//! whatever its base package build-depends on, unless the dependency (or,
//! for a virtual dependency, one of its providers) is already there.

use super::publish::unpublish_package;
use crate::context::Context;
use crate::db;
use crate::db::models::{BasePackage, Package, Repository};
use crate::error::{Error, Result};
use rusqlite::Connection;
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info};

fn load_real_package(conn: &Connection, id: i64) -> Result<Package> {
    let package = Package::find_by_id(conn, id)?
        .ok_or_else(|| Error::NotFoundError(format!("Package {} not found", id)))?;
    if package.is_virtual {
        return Err(Error::InvalidArgument(format!(
            "'{}' is a virtual package and cannot be published",
            package.name
        )));
    }
    Ok(package)
}

/// Build dependencies that must be published alongside `frontier`
///
/// `present` holds every package already published or scheduled; virtual
/// dependencies resolve to their providers and are satisfied when any
/// provider is present.
fn required_dependencies(
    conn: &Connection,
    frontier: &BTreeSet<i64>,
    present: &HashSet<i64>,
) -> Result<BTreeSet<i64>> {
    let mut bases = BTreeSet::new();
    for id in frontier {
        if let Some(package) = Package::find_by_id(conn, *id)? {
            bases.insert(package.base_package_id);
        }
    }

    let mut deps = Vec::new();
    for base_id in bases {
        deps.extend(BasePackage::build_depends(conn, base_id)?);
    }

    // Real dependencies count as present when judging virtual ones
    let real_deps: HashSet<i64> = deps
        .iter()
        .filter(|d| !d.is_virtual)
        .filter_map(|d| d.id)
        .collect();

    let mut required = BTreeSet::new();
    for dep in deps {
        let dep_id = dep.require_id()?;
        if present.contains(&dep_id) {
            continue;
        }

        if dep.is_virtual {
            let providers = Package::providers(conn, dep_id)?;
            let satisfied = providers.iter().any(|p| {
                p.id.is_some_and(|id| present.contains(&id) || real_deps.contains(&id))
            });
            if satisfied {
                continue;
            }
            for provider in providers {
                let provider_id = provider.require_id()?;
                if !present.contains(&provider_id) {
                    required.insert(provider_id);
                }
            }
        } else {
            required.insert(dep_id);
        }
    }

    Ok(required)
}

/// Publish packages in a repository together with their build dependencies
///
/// Returns every package newly linked, requested ones first.
pub fn add_packages(
    conn: &mut Connection,
    repo: &Repository,
    package_ids: &[i64],
) -> Result<Vec<Package>> {
    let repo_id = repo.require_id()?;

    db::transaction(conn, |tx| {
        let mut present = Repository::package_ids(tx, repo_id)?;
        let mut added = Vec::new();
        let mut frontier = BTreeSet::new();

        for id in package_ids {
            let package = load_real_package(tx, *id)?;
            if present.insert(*id) {
                frontier.insert(*id);
                added.push(package);
            }
        }

        while !frontier.is_empty() {
            let required = required_dependencies(tx, &frontier, &present)?;
            for id in &required {
                let package = load_real_package(tx, *id)?;
                debug!("{} pulls in build dependency {}", repo.name, package.name);
                present.insert(*id);
                added.push(package);
            }
            frontier = required;
        }

        for package in &added {
            Repository::add_package(tx, repo_id, package.require_id()?)?;
        }

        Ok(added)
    })
    .inspect(|added| {
        if !added.is_empty() {
            info!("Added {} packages to {}", added.len(), repo.name);
        }
    })
}

/// Withdraw packages from a repository
///
/// The links are removed first; then each package is dropped from the index
/// of every architecture the repository carries. Index failures are logged
/// and do not undo the removal.
pub fn remove_packages(
    conn: &mut Connection,
    ctx: &Context,
    repo: &Repository,
    package_ids: &[i64],
) -> Result<Vec<Package>> {
    let repo_id = repo.require_id()?;

    let (removed, archs) = db::transaction(conn, |tx| {
        let mut removed = Vec::new();
        for id in package_ids {
            let Some(package) = Package::find_by_id(tx, *id)? else {
                continue;
            };
            if Repository::remove_package(tx, repo_id, *id)? {
                removed.push(package);
            }
        }
        Ok((removed, Repository::architectures(tx, repo_id)?))
    })?;

    for arch in &archs {
        for package in &removed {
            unpublish_package(ctx, repo, &arch.name, &package.name);
        }
    }

    if !removed.is_empty() {
        info!("Removed {} packages from {}", removed.len(), repo.name);
    }
    Ok(removed)
}
