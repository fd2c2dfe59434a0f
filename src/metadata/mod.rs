// src/metadata/mod.rs

//! Metadata extraction
//!
//! Turns a base package directory into model state: regenerate .SRCINFO,
//! parse it, then rewrite the base package's name, version, architectures,
//! packages, provides and build dependencies. Build dependencies are then
//! closed transitively and pruned of virtuals satisfied within the set.

pub mod srcinfo;

pub use srcinfo::{SrcInfo, SrcInfoPackage};

use crate::db;
use crate::db::models::{Architecture, BasePackage, Package};
use crate::error::{Error, Result};
use crate::graph;
use crate::tools::SrcinfoGenerator;
use rusqlite::Connection;
use std::fs;
use tracing::{debug, warn};

/// Read and parse the .SRCINFO of a base package
pub fn read_srcinfo(base: &BasePackage) -> Result<SrcInfo> {
    let path = base.srcinfo_path();
    let content = fs::read_to_string(&path).map_err(|e| {
        Error::MetadataError(format!("Cannot read {}: {}", path.display(), e))
    })?;
    SrcInfo::parse(&content)
        .map_err(|e| Error::MetadataError(format!("{}: {}", path.display(), e)))
}

/// Regenerate, parse and apply the metadata of a base package
///
/// A generator failure is logged and the existing .SRCINFO is used. When no
/// usable .SRCINFO exists the base package is left unchanged and a
/// `MetadataError` is returned.
pub fn extract(
    conn: &mut Connection,
    base: &mut BasePackage,
    generator: &dyn SrcinfoGenerator,
) -> Result<()> {
    if let Err(e) = generator.generate(&base.directory()) {
        warn!("Could not regenerate metadata of {}: {}", base, e);
    }

    let info = read_srcinfo(base)?;
    db::transaction(conn, |tx| apply(tx, base, &info))
}

/// Rewrite a base package from parsed metadata
pub fn apply(conn: &Connection, base: &mut BasePackage, info: &SrcInfo) -> Result<()> {
    let base_id = base.require_id()?;

    BasePackage::clear_build_depends(conn, base_id)?;
    BasePackage::clear_architectures(conn, base_id)?;

    base.name = info.pkgbase.clone();
    base.version = info.version();

    for arch_name in &info.architectures {
        let arch = Architecture::get_or_create(conn, arch_name)?;
        BasePackage::add_architecture(conn, base_id, arch.require_id()?)?;
    }

    // Dependencies resolve against real packages already known; a dependency
    // registered later is picked up on the next extraction.
    for dep_name in &info.depends {
        for dep in Package::find_real_by_name(conn, dep_name)? {
            if dep.base_package_id == base_id {
                continue;
            }
            BasePackage::add_build_depend(conn, base_id, dep.require_id()?)?;
        }
    }

    let mut base_provides = Vec::new();
    for name in &info.provides {
        let alias = Package::get_or_create(conn, base_id, name, true)?;
        base_provides.push(alias.require_id()?);
    }

    for output in &info.packages {
        let package = Package::get_or_create(conn, base_id, &output.name, false)?;
        let package_id = package.require_id()?;

        Package::clear_provides(conn, package_id)?;
        for alias_id in &base_provides {
            Package::add_provides(conn, package_id, *alias_id)?;
        }
        for name in &output.provides {
            let alias = Package::get_or_create(conn, base_id, name, true)?;
            Package::add_provides(conn, package_id, alias.require_id()?)?;
        }
    }

    BasePackage::update_metadata(conn, base_id, base.name.as_deref(), base.version.as_deref())?;

    let resolved = graph::resolve_build_depends(conn, base_id)?;
    debug!(
        "Extracted {} {} ({} packages, {} build dependencies)",
        base,
        base.version.as_deref().unwrap_or("?"),
        info.packages.len(),
        resolved.len()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory;
    use crate::db::models::ANY_ARCH;

    fn register(conn: &Connection, dir: &str, content: &str) -> BasePackage {
        let mut base = BasePackage::get_or_create(conn, dir, false).unwrap();
        let info = SrcInfo::parse(content).unwrap();
        apply(conn, &mut base, &info).unwrap();
        base
    }

    fn dep_names(conn: &Connection, base: &BasePackage) -> Vec<String> {
        BasePackage::build_depends(conn, base.id.unwrap())
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect()
    }

    #[test]
    fn test_apply_sets_identity_and_architectures() {
        let conn = open_memory();
        let base = register(
            &conn,
            "/pkgs/test-package",
            "pkgbase = test-package\npkgver = 1.0.0\npkgrel = 1\nepoch = 1\narch = i686\narch = x86_64\npkgname = test-package\n",
        );

        assert_eq!(base.name.as_deref(), Some("test-package"));
        assert_eq!(base.version.as_deref(), Some("1:1.0.0-1"));
        let archs: Vec<_> = BasePackage::architectures(&conn, base.id.unwrap())
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(archs, vec!["i686", "x86_64"]);
    }

    #[test]
    fn test_unknown_dependencies_are_skipped() {
        let conn = open_memory();
        let base = register(
            &conn,
            "/pkgs/foo",
            "pkgbase = foo\npkgver = 1\npkgrel = 1\narch = any\ndepends = not-registered\npkgname = foo\n",
        );
        assert!(dep_names(&conn, &base).is_empty());
    }

    #[test]
    fn test_transitive_closure_on_extraction() {
        let conn = open_memory();
        register(&conn, "/pkgs/a", "pkgbase = a\npkgver = 1\narch = any\npkgname = a\n");
        register(
            &conn,
            "/pkgs/b",
            "pkgbase = b\npkgver = 1\narch = any\ndepends = a\npkgname = b\n",
        );
        let c = register(
            &conn,
            "/pkgs/c",
            "pkgbase = c\npkgver = 1\narch = any\nmakedepends = b\npkgname = c\n",
        );

        assert_eq!(dep_names(&conn, &c), vec!["a", "b"]);
    }

    #[test]
    fn test_provides_are_rewritten() {
        let conn = open_memory();
        let base = register(
            &conn,
            "/pkgs/foo",
            "pkgbase = foo\npkgver = 1\narch = x86_64\nprovides = shared-alias\npkgname = foo\nprovides = foo-alias\npkgname = foo-extra\n",
        );
        let base_id = base.id.unwrap();

        let packages = BasePackage::packages(&conn, base_id).unwrap();
        let foo = packages.iter().find(|p| p.name == "foo" && !p.is_virtual).unwrap();
        let extra = packages
            .iter()
            .find(|p| p.name == "foo-extra" && !p.is_virtual)
            .unwrap();

        let foo_provides: Vec<_> = Package::provides(&conn, foo.id.unwrap())
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(foo_provides, vec!["foo-alias", "shared-alias"]);

        let extra_provides: Vec<_> = Package::provides(&conn, extra.id.unwrap())
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(extra_provides, vec!["shared-alias"]);

        // Re-applying without the per-package alias drops the link
        let mut base = base;
        let info = SrcInfo::parse(
            "pkgbase = foo\npkgver = 1\narch = x86_64\nprovides = shared-alias\npkgname = foo\npkgname = foo-extra\n",
        )
        .unwrap();
        apply(&conn, &mut base, &info).unwrap();
        assert_eq!(Package::provides(&conn, foo.id.unwrap()).unwrap().len(), 1);
    }

    #[test]
    fn test_reapply_is_idempotent() {
        let conn = open_memory();
        register(&conn, "/pkgs/a", "pkgbase = a\npkgver = 1\narch = any\npkgname = a\n");
        let content = "pkgbase = b\npkgver = 1\narch = any\ndepends = a\npkgname = b\n";
        let mut b = register(&conn, "/pkgs/b", content);

        let before = (
            dep_names(&conn, &b),
            BasePackage::packages(&conn, b.id.unwrap()).unwrap(),
        );
        apply(&conn, &mut b, &SrcInfo::parse(content).unwrap()).unwrap();
        let after = (
            dep_names(&conn, &b),
            BasePackage::packages(&conn, b.id.unwrap()).unwrap(),
        );
        assert_eq!(before, after);
        assert!(BasePackage::is_any(&conn, b.id.unwrap()).unwrap());
        assert!(Architecture::find_by_name(&conn, ANY_ARCH).unwrap().is_some());
    }

    #[test]
    fn test_apply_keeps_build_flags() {
        let conn = open_memory();
        let content = "pkgbase = test-package\npkgver = 1.0.0\npkgrel = 1\narch = x86_64\npkgname = test-package\n";
        let mut stale = register(&conn, "/pkgs/test-package", content);
        let id = stale.id.unwrap();

        BasePackage::set_building(&conn, id, true).unwrap();
        BasePackage::set_builds(&conn, id, true).unwrap();
        apply(&conn, &mut stale, &SrcInfo::parse(content).unwrap()).unwrap();

        let current = BasePackage::find_by_id(&conn, id).unwrap().unwrap();
        assert!(current.building);
        assert!(current.builds);
        assert_eq!(current.version.as_deref(), Some("1.0.0-1"));
    }

    #[test]
    fn test_read_srcinfo_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let base = BasePackage::new(dir.path().display().to_string(), false);
        assert!(matches!(read_srcinfo(&base), Err(Error::MetadataError(_))));
    }
}
