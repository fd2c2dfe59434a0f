// src/tools/mod.rs

//! External tool capabilities
//!
//! Everything pkgrepo runs outside its own process goes through one of the
//! traits here: generating .SRCINFO, building in a chroot, maintaining a
//! repository database, and asking a VCS whether upstream moved. The
//! production implementations shell out; tests substitute recording fakes.

mod command;

pub use command::{CommandBuilder, CommandIndexer, CommandSrcinfo};

use crate::config::Config;
use crate::db::models::BasePackage;
use crate::error::Result;
use crate::vcs::VcsChecker;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Regenerates the .SRCINFO of a base package directory
pub trait SrcinfoGenerator: Send + Sync {
    fn generate(&self, directory: &Path) -> Result<()>;
}

/// One chroot build invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    /// Directory containing the PKGBUILD, used as working directory
    pub directory: PathBuf,
    /// Build helper, e.g. `extra-x86_64-build`
    pub command: String,
    /// Artifacts of the build dependencies to preinstall into the chroot
    pub dependencies: Vec<PathBuf>,
}

/// Runs a build, reporting whether it succeeded
pub trait Builder: Send + Sync {
    fn build(&self, request: &BuildRequest) -> Result<bool>;
}

/// Maintains the package database of one repository directory
pub trait Indexer: Send + Sync {
    /// Add an artifact (already copied into `directory`) to `db_filename`
    fn add(&self, directory: &Path, db_filename: &str, artifact: &str, delta: bool) -> Result<bool>;

    /// Remove a package by name from `db_filename`
    fn remove(&self, directory: &Path, db_filename: &str, package_name: &str) -> Result<bool>;
}

/// Version control queries
pub trait SourceControl: Send + Sync {
    /// True when syncing the base package's working copy changed its revision
    ///
    /// Never fails: any problem is logged and reported as "not behind".
    fn is_behind(&self, base: &BasePackage) -> bool;

    /// Pull the package source tree if it is itself under version control
    fn update_tree(&self, root: &Path) -> Result<()>;
}

/// The set of external tools a run uses
#[derive(Clone)]
pub struct Toolchain {
    pub srcinfo: Arc<dyn SrcinfoGenerator>,
    pub builder: Arc<dyn Builder>,
    pub indexer: Arc<dyn Indexer>,
    pub vcs: Arc<dyn SourceControl>,
}

impl Toolchain {
    /// Subprocess-backed tools configured from `config`
    pub fn from_config(config: &Config) -> Self {
        Self {
            srcinfo: Arc::new(CommandSrcinfo::new(config.tools.srcinfo.clone())),
            builder: Arc::new(CommandBuilder::new(config.build.sudo, config.build.debug)),
            indexer: Arc::new(CommandIndexer::new(
                config.tools.index_add.clone(),
                config.tools.index_remove.clone(),
            )),
            vcs: Arc::new(VcsChecker::new(config.paths.srcdest.clone())),
        }
    }
}

impl std::fmt::Debug for Toolchain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolchain").finish_non_exhaustive()
    }
}
