// src/graph.rs

//! Dependency graph over base packages
//!
//! Build dependencies are recorded per base package as a set of packages.
//! The graph loaded here answers the three questions the rest of the crate
//! asks of that relation: the transitive closure of a base package's
//! dependencies, which virtual dependencies are already satisfied by a real
//! package in the same set, and the order a batch of packages must build in.

use crate::db::models::{ANY_ARCH, BasePackage, Package};
use crate::error::{Error, Result};
use rusqlite::Connection;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Snapshot of packages, their owners, provides links and build dependencies
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// package id -> owning base package id
    owners: HashMap<i64, i64>,
    /// base package id -> packages it build-depends on
    depends: HashMap<i64, BTreeSet<i64>>,
    /// virtual package id -> real packages providing it
    providers: HashMap<i64, BTreeSet<i64>>,
    virtual_ids: HashSet<i64>,
}

impl DependencyGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the whole relation from the database
    pub fn build_from_db(conn: &Connection) -> Result<Self> {
        let mut graph = Self::new();

        for package in Package::list_all(conn)? {
            let id = package.require_id()?;
            graph.add_package(id, package.base_package_id, package.is_virtual);
        }

        let mut stmt = conn.prepare("SELECT base_package_id, package_id FROM build_depends")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))?;
        for row in rows {
            let (base_id, package_id) = row?;
            graph.add_depend(base_id, package_id);
        }

        let mut stmt = conn.prepare("SELECT package_id, provided_id FROM package_provides")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))?;
        for row in rows {
            let (provider_id, provided_id) = row?;
            graph.add_provides(provider_id, provided_id);
        }

        Ok(graph)
    }

    pub fn add_package(&mut self, id: i64, base_package_id: i64, is_virtual: bool) {
        self.owners.insert(id, base_package_id);
        if is_virtual {
            self.virtual_ids.insert(id);
        }
    }

    pub fn add_depend(&mut self, base_package_id: i64, package_id: i64) {
        self.depends
            .entry(base_package_id)
            .or_default()
            .insert(package_id);
    }

    pub fn add_provides(&mut self, provider_id: i64, provided_id: i64) {
        self.providers
            .entry(provided_id)
            .or_default()
            .insert(provider_id);
    }

    /// Direct build dependencies of a base package
    pub fn direct_depends(&self, base_package_id: i64) -> BTreeSet<i64> {
        self.depends
            .get(&base_package_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Transitive closure of a base package's build dependencies
    ///
    /// A dependency on a package pulls in the build dependencies of that
    /// package's owner, repeated until the set stops growing. Packages owned
    /// by the base package itself never enter the set, which also keeps
    /// dependency cycles from feeding a unit back into its own closure.
    /// This is the one exception to closure: when A depends on B's package
    /// and B depends on A's, A's set holds B's package but none of its own.
    pub fn closure(&self, base_package_id: i64) -> BTreeSet<i64> {
        let mut closed: BTreeSet<i64> = self
            .direct_depends(base_package_id)
            .into_iter()
            .filter(|id| self.owners.get(id) != Some(&base_package_id))
            .collect();
        let mut visited_owners = HashSet::new();

        loop {
            let before = closed.len();

            let owners: Vec<i64> = closed
                .iter()
                .filter_map(|id| self.owners.get(id).copied())
                .filter(|owner| *owner != base_package_id)
                .collect();

            for owner in owners {
                if !visited_owners.insert(owner) {
                    continue;
                }
                if let Some(deps) = self.depends.get(&owner) {
                    closed.extend(
                        deps.iter()
                            .filter(|id| self.owners.get(id) != Some(&base_package_id)),
                    );
                }
            }

            if closed.len() == before {
                break;
            }
        }

        closed
    }

    /// Drop virtual packages that some real package in the set already provides
    pub fn prune_provided(&self, set: &BTreeSet<i64>) -> BTreeSet<i64> {
        set.iter()
            .copied()
            .filter(|id| {
                if !self.virtual_ids.contains(id) {
                    return true;
                }
                !self
                    .providers
                    .get(id)
                    .is_some_and(|providers| providers.iter().any(|p| set.contains(p)))
            })
            .collect()
    }

    /// Order packages so every package comes after the packages its owner build-depends on
    ///
    /// Among packages that are ready at the same time the input order is
    /// kept. Packages caught in a dependency cycle are appended in input
    /// order once nothing else can be scheduled.
    pub fn build_order(&self, packages: &[Package]) -> Vec<Package> {
        let ids: Vec<Option<i64>> = packages.iter().map(|p| p.id).collect();

        // prerequisites[i] = indices that must be emitted before i
        let prerequisites: Vec<HashSet<usize>> = packages
            .iter()
            .enumerate()
            .map(|(i, package)| {
                let deps = self.depends.get(&package.base_package_id);
                ids.iter()
                    .enumerate()
                    .filter(|(j, id)| {
                        *j != i
                            && id.is_some_and(|id| {
                                deps.is_some_and(|deps| deps.contains(&id))
                                    && self.owners.get(&id) != Some(&package.base_package_id)
                            })
                    })
                    .map(|(j, _)| j)
                    .collect()
            })
            .collect();

        let mut emitted = vec![false; packages.len()];
        let mut order = Vec::with_capacity(packages.len());

        while order.len() < packages.len() {
            let next = (0..packages.len()).find(|&i| {
                !emitted[i] && prerequisites[i].iter().all(|&j| emitted[j])
            });

            match next {
                Some(i) => {
                    emitted[i] = true;
                    order.push(packages[i].clone());
                }
                None => {
                    let stuck: Vec<&str> = (0..packages.len())
                        .filter(|&i| !emitted[i])
                        .map(|i| packages[i].name.as_str())
                        .collect();
                    warn!("Dependency cycle among {:?}, building in listed order", stuck);
                    for i in 0..packages.len() {
                        if !emitted[i] {
                            emitted[i] = true;
                            order.push(packages[i].clone());
                        }
                    }
                }
            }
        }

        order
    }
}

/// Recompute the stored build dependencies of a base package
///
/// Expands the direct dependencies to their transitive closure, then drops
/// virtual dependencies satisfied within the set.
pub fn resolve_build_depends(conn: &Connection, base_package_id: i64) -> Result<BTreeSet<i64>> {
    let graph = DependencyGraph::build_from_db(conn)?;
    let closed = graph.closure(base_package_id);
    let resolved = graph.prune_provided(&closed);

    BasePackage::clear_build_depends(conn, base_package_id)?;
    for package_id in &resolved {
        BasePackage::add_build_depend(conn, base_package_id, *package_id)?;
    }

    debug!(
        "Base package {} resolved to {} build dependencies",
        base_package_id,
        resolved.len()
    );
    Ok(resolved)
}

/// Re-close the build dependencies of every base package
///
/// Extraction closes a unit over whatever its dependencies had recorded at
/// that moment, so a unit scanned before its dependencies may miss entries
/// further down the chain. Closing all units over one snapshot fixes that.
pub fn resolve_all(conn: &Connection) -> Result<usize> {
    let graph = DependencyGraph::build_from_db(conn)?;
    let mut changed = 0;

    for base in BasePackage::list_all(conn)? {
        let base_id = base.require_id()?;
        let resolved = graph.prune_provided(&graph.closure(base_id));
        if resolved == graph.direct_depends(base_id) {
            continue;
        }

        BasePackage::clear_build_depends(conn, base_id)?;
        for package_id in &resolved {
            BasePackage::add_build_depend(conn, base_id, *package_id)?;
        }
        changed += 1;
    }

    debug!("Re-closed build dependencies of {} base packages", changed);
    Ok(changed)
}

/// Order packages for building
pub fn build_order(conn: &Connection, packages: &[Package]) -> Result<Vec<Package>> {
    let graph = DependencyGraph::build_from_db(conn)?;
    Ok(graph.build_order(packages))
}

/// Real packages that may be added to a repository
///
/// A package qualifies when its base package declares `any` or one of the
/// repository's architectures and it is not published there yet.
pub fn available_packages(conn: &Connection, repository_id: i64) -> Result<Vec<Package>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT p.id, p.base_package_id, p.name, p.virtual FROM packages p
         JOIN base_package_architectures bpa ON bpa.base_package_id = p.base_package_id
         JOIN architectures a ON a.id = bpa.architecture_id
         WHERE p.virtual = 0
           AND (a.name = ?2 OR a.id IN (
                SELECT architecture_id FROM repository_architectures WHERE repository_id = ?1))
           AND p.id NOT IN (
                SELECT package_id FROM repository_packages WHERE repository_id = ?1)
         ORDER BY p.name, p.id",
    )?;
    let packages = stmt
        .query_map(rusqlite::params![repository_id, ANY_ARCH], Package::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(packages)
}

/// Artifact filename produced by makepkg
pub fn artifact_filename(name: &str, version: &str, architecture: &str) -> String {
    format!("{}-{}-{}.pkg.tar.xz", name, version, architecture)
}

/// Artifact filename of a package when built for an architecture
///
/// Architecture-independent base packages always produce `any` artifacts.
pub fn package_filename(conn: &Connection, package: &Package, architecture: &str) -> Result<String> {
    let base = package.base_package(conn)?;
    let base_id = base.require_id()?;
    let version = base.version.as_deref().ok_or_else(|| {
        Error::MetadataError(format!("Base package '{}' has no version", base))
    })?;

    let token = if BasePackage::supports_architecture(conn, base_id, architecture)? {
        architecture
    } else {
        ANY_ARCH
    };

    Ok(artifact_filename(&package.name, version, token))
}

/// Full path of a package's artifact inside its base package directory
pub fn package_artifact_path(
    conn: &Connection,
    package: &Package,
    architecture: &str,
) -> Result<PathBuf> {
    let base = package.base_package(conn)?;
    let filename = package_filename(conn, package, architecture)?;
    Ok(base.directory().join(filename))
}
