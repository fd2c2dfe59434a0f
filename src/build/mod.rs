// src/build/mod.rs

//! Build orchestration
//!
//! Decides whether a package needs building for an (architecture,
//! repository) pair, runs the builder with the artifacts of its build
//! dependencies, and records the outcome on the base package and in the
//! build history.

pub mod queue;

pub use queue::{BuildQueue, BuildTask, TaskReport};

use crate::context::Context;
use crate::db::models::{ANY_ARCH, Architecture, BasePackage, Build, Package, Repository};
use crate::error::{Error, Result};
use crate::graph;
use crate::metadata;
use crate::tools::BuildRequest;
use rusqlite::Connection;
use tracing::{debug, info, warn};

/// Result of one build attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    /// A matching build exists and nothing forced a rebuild
    Skipped,
    /// The builder succeeded and the build was recorded
    Built,
    /// The builder failed
    Failed,
}

impl std::fmt::Display for BuildOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildOutcome::Skipped => write!(f, "skipped"),
            BuildOutcome::Built => write!(f, "built"),
            BuildOutcome::Failed => write!(f, "failed"),
        }
    }
}

/// Stable task identifier: `{package}-{version}-{target}-{arch}`
pub fn task_name(package: &Package, version: &str, repo: &Repository, architecture: &str) -> String {
    format!("{}-{}-{}-{}", package.name, version, repo.target, architecture)
}

/// Build a package for an architecture and repository if needed
///
/// The base package's `building` flag is set for the duration of the
/// attempt and cleared afterwards whatever the outcome.
pub fn build_package(
    conn: &mut Connection,
    ctx: &Context,
    package: &Package,
    architecture: &Architecture,
    repo: &Repository,
    force: bool,
) -> Result<BuildOutcome> {
    let mut base = package.base_package(conn)?;
    let base_id = base.require_id()?;

    BasePackage::set_building(conn, base_id, true)?;
    let outcome = run_build(conn, ctx, &mut base, package, architecture, repo, force);
    BasePackage::set_building(conn, base_id, false)?;

    let outcome = outcome?;
    info!("{} for {}/{}: {}", package.name, repo.name, architecture.name, outcome);
    Ok(outcome)
}

fn run_build(
    conn: &mut Connection,
    ctx: &Context,
    base: &mut BasePackage,
    package: &Package,
    architecture: &Architecture,
    repo: &Repository,
    force: bool,
) -> Result<BuildOutcome> {
    let base_id = base.require_id()?;
    let version = base
        .version
        .clone()
        .ok_or_else(|| Error::MetadataError(format!("Base package '{}' has no version", base)))?;

    // Architecture-independent base packages are built once for all architectures
    let build_arch = if BasePackage::is_any(conn, base_id)? {
        Architecture::get_or_create(conn, ANY_ARCH)?
    } else {
        architecture.clone()
    };
    let build_arch_id = build_arch.require_id()?;

    let existing = Build::find_matching(conn, base_id, &version, build_arch_id, repo.target.as_str())?;
    let behind = ctx.tools.vcs.is_behind(base);
    debug!(
        "{} {} for {}: recorded={}, behind={}, force={}",
        package.name,
        version,
        build_arch,
        existing.is_some(),
        behind,
        force
    );

    if existing.is_some() && !behind && !force {
        return Ok(BuildOutcome::Skipped);
    }

    let mut dependencies = Vec::new();
    for dep in BasePackage::build_depends(conn, base_id)? {
        dependencies.push(graph::package_artifact_path(conn, &dep, &architecture.name)?);
    }

    let request = BuildRequest {
        directory: base.directory(),
        command: repo.build_command(&architecture.name),
        dependencies,
    };

    let success = match ctx.tools.builder.build(&request) {
        Ok(success) => success,
        Err(e) => {
            warn!("Could not run {} for {}: {}", request.command, package.name, e);
            false
        }
    };

    if !success {
        BasePackage::set_builds(conn, base_id, false)?;
        return Ok(BuildOutcome::Failed);
    }

    BasePackage::set_builds(conn, base_id, true)?;

    // The build may have bumped pkgver (VCS packages); record what was built
    if let Err(e) = metadata::extract(conn, base, ctx.tools.srcinfo.as_ref()) {
        warn!("Could not refresh metadata of {} after build: {}", base, e);
    }
    let built_version = base.version.clone().unwrap_or(version);

    let mut build = Build::get_or_create(conn, base_id, &built_version, build_arch_id)?;
    build.target = Some(repo.target.as_str().to_string());
    build.date = Some(chrono::Local::now().format("%Y-%m-%d").to_string());
    build.update(conn)?;

    Ok(BuildOutcome::Built)
}

/// Queue a package for every architecture of a repository
pub fn submit_package(
    queue: &mut BuildQueue,
    conn: &Connection,
    package: &Package,
    repo: &Repository,
    force: bool,
) -> Result<usize> {
    let mut submitted = 0;
    for arch in Repository::architectures(conn, repo.require_id()?)? {
        let task = BuildTask::new(conn, package, &arch, repo, force)?;
        if queue.submit(task) {
            submitted += 1;
        }
    }
    Ok(submitted)
}

/// Queue every published package of a repository in dependency order
pub fn build_repository(
    queue: &mut BuildQueue,
    conn: &Connection,
    repo: &Repository,
    force: bool,
) -> Result<usize> {
    let packages = Repository::packages(conn, repo.require_id()?)?;
    let ordered = graph::build_order(conn, &packages)?;

    let mut submitted = 0;
    for package in &ordered {
        match submit_package(queue, conn, package, repo, force) {
            Ok(count) => submitted += count,
            Err(e) => warn!("Skipping {} in {}: {}", package.name, repo.name, e),
        }
    }

    info!("Queued {} builds for {}", submitted, repo.name);
    Ok(submitted)
}

/// Queue every repository
pub fn build_all(queue: &mut BuildQueue, conn: &Connection, force: bool) -> Result<usize> {
    let mut submitted = 0;
    for repo in Repository::list_all(conn)? {
        submitted += build_repository(queue, conn, &repo, force)?;
    }
    Ok(submitted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::Target;

    #[test]
    fn test_task_name() {
        let package = Package::new(1, "test-package".to_string(), false);
        let repo = Repository::new("test".to_string(), Target::Staging);
        assert_eq!(
            task_name(&package, "1:1.0.0-1", &repo, "x86_64"),
            "test-package-1:1.0.0-1-stg-x86_64"
        );
    }
}
