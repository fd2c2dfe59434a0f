// src/vcs.rs

//! VCS staleness detection
//!
//! VCS packages follow the `name-git` / `name-svn` / `name-hg` / `name-bzr`
//! naming convention. Their working copy lives in SRCDEST (or the base
//! package directory) under the name with the suffix removed. A package is
//! behind when syncing that working copy changes its revision.

use crate::db::models::BasePackage;
use crate::error::{Error, Result};
use crate::tools::SourceControl;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info, warn};

/// Supported version control systems
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VcsBackend {
    Bzr,
    Git,
    Hg,
    Svn,
}

impl VcsBackend {
    /// Checking order
    pub const ALL: [VcsBackend; 4] = [
        VcsBackend::Bzr,
        VcsBackend::Git,
        VcsBackend::Hg,
        VcsBackend::Svn,
    ];

    /// Package name suffix marking this backend
    pub fn suffix(&self) -> &'static str {
        match self {
            VcsBackend::Bzr => "-bzr",
            VcsBackend::Git => "-git",
            VcsBackend::Hg => "-hg",
            VcsBackend::Svn => "-svn",
        }
    }

    /// Backend a package name selects, if any
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| name.ends_with(b.suffix()))
    }

    /// Command printing the current revision
    pub fn revision_command(&self) -> &'static [&'static str] {
        match self {
            VcsBackend::Bzr => &["bzr", "revno"],
            VcsBackend::Git => &["git", "rev-list", "--count", "HEAD"],
            VcsBackend::Hg => &["hg", "id", "-n"],
            VcsBackend::Svn => &["svnversion"],
        }
    }

    /// Command syncing the working copy with upstream
    pub fn sync_command(&self) -> &'static [&'static str] {
        match self {
            VcsBackend::Bzr => &["bzr", "pull"],
            // makepkg keeps git sources as bare mirrors
            VcsBackend::Git => &["git", "fetch", "--all", "-p"],
            VcsBackend::Hg => &["hg", "pull"],
            VcsBackend::Svn => &["svn", "up"],
        }
    }
}

/// Name of the working copy directory for a VCS package name
pub fn working_copy_name(name: &str) -> &str {
    name.rsplit_once('-').map_or(name, |(stem, _)| stem)
}

/// Run a command in `dir`, returning trimmed stdout
fn run_in(dir: &Path, argv: &[&str]) -> Result<String> {
    let Some((program, args)) = argv.split_first() else {
        return Err(Error::InvalidArgument("empty command".to_string()));
    };
    let program = which::which(program).map_err(|_| Error::ToolNotFound(program.to_string()))?;

    let output = Command::new(&program)
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| Error::IoError(format!("Failed to run {}: {}", argv.join(" "), e)))?;

    if !output.status.success() {
        return Err(Error::IoError(format!(
            "{} failed in {}: {}",
            argv.join(" "),
            dir.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Subprocess-backed source control queries
#[derive(Debug, Clone, Default)]
pub struct VcsChecker {
    srcdest: Option<PathBuf>,
}

impl VcsChecker {
    pub fn new(srcdest: Option<PathBuf>) -> Self {
        Self { srcdest }
    }

    /// Working copy of a base package, if its name selects a backend
    pub fn working_copy(&self, base: &BasePackage) -> Option<(VcsBackend, PathBuf)> {
        let name = base.name.as_deref()?;
        let backend = VcsBackend::from_name(name)?;
        let root = self.srcdest.clone().unwrap_or_else(|| base.directory());
        Some((backend, root.join(working_copy_name(name))))
    }

    fn check(&self, backend: VcsBackend, dir: &Path) -> Result<bool> {
        let before = run_in(dir, backend.revision_command())?;
        run_in(dir, backend.sync_command())?;
        let after = run_in(dir, backend.revision_command())?;
        debug!("{} revision {} -> {}", dir.display(), before, after);
        Ok(before != after)
    }
}

impl SourceControl for VcsChecker {
    fn is_behind(&self, base: &BasePackage) -> bool {
        let Some((backend, dir)) = self.working_copy(base) else {
            return false;
        };
        if !dir.is_dir() {
            debug!("No working copy at {}", dir.display());
            return false;
        }

        match self.check(backend, &dir) {
            Ok(behind) => {
                if behind {
                    info!("{} is behind upstream", base);
                }
                behind
            }
            Err(e) => {
                warn!("Could not check {} for upstream changes: {}", base, e);
                false
            }
        }
    }

    fn update_tree(&self, root: &Path) -> Result<()> {
        if !root.join(".git").is_dir() {
            return Ok(());
        }
        info!("Pulling {}", root.display());
        run_in(root, &["git", "pull"])?;
        Ok(())
    }
}
