// tests/refresh.rs

//! Integration tests for scanning the package tree and extracting metadata

mod common;

use common::{TestEnv, base_package, build_depend_names, real_package};
use pkgrepo::db::models::{Architecture, BasePackage, Build, Package};
use pkgrepo::graph;
use std::fs;

fn arch_names(conn: &rusqlite::Connection, base: &BasePackage) -> Vec<String> {
    let mut names: Vec<String> = BasePackage::architectures(conn, base.id.unwrap())
        .unwrap()
        .into_iter()
        .map(|a| a.name)
        .collect();
    names.sort();
    names
}

#[test]
fn test_refresh_registers_fixture_units() {
    let env = TestEnv::new();
    env.write_fixtures();

    let report = env.refresh();
    assert_eq!(report.registered, 5);
    assert_eq!(report.refreshed, 5);
    assert_eq!(report.removed, 0);
    assert_eq!(report.failed, 0);

    let conn = env.conn();
    assert_eq!(BasePackage::list_all(&conn).unwrap().len(), 5);

    let base = base_package(&conn, "test-package");
    assert_eq!(base.version.as_deref(), Some("1:1.0.0-1"));
    assert!(!base.official);
    assert!(!base.building);
    assert!(!base.builds);
    assert_eq!(arch_names(&conn, &base), vec!["i686", "x86_64"]);
}

#[test]
fn test_official_layout() {
    let env = TestEnv::with_fixtures();
    let conn = env.conn();

    let base = base_package(&conn, "test-official-package");
    assert!(base.official);
    assert_eq!(base.version.as_deref(), Some("1.1.0-3"));
    assert_eq!(
        base.directory(),
        env.packages_root().join("test-official-package").join("trunk")
    );
    assert!(BasePackage::is_any(&conn, base.id.unwrap()).unwrap());
}

#[test]
fn test_split_package_outputs() {
    let env = TestEnv::with_fixtures();
    let conn = env.conn();

    let base = base_package(&conn, "test-split-package");
    let mut names: Vec<String> = BasePackage::packages(&conn, base.id.unwrap())
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    names.sort();
    assert_eq!(names, vec!["test-first-package", "test-second-package"]);

    // No output is named after the pkgbase itself
    assert!(Package::find_by_name(&conn, "test-split-package").unwrap().is_empty());
}

#[test]
fn test_provides_creates_virtual_package() {
    let env = TestEnv::with_fixtures();
    let conn = env.conn();

    let provider = real_package(&conn, "test-provides-package");
    let provided = Package::provides(&conn, provider.id.unwrap()).unwrap();
    assert_eq!(provided.len(), 1);
    assert_eq!(provided[0].name, "test-virtual-package");
    assert!(provided[0].is_virtual);

    let providers = Package::providers(&conn, provided[0].id.unwrap()).unwrap();
    assert_eq!(providers.len(), 1);
    assert_eq!(providers[0].name, "test-provides-package");

    // Virtual packages never show up as real ones
    assert!(Package::find_real_by_name(&conn, "test-virtual-package").unwrap().is_empty());
}

#[test]
fn test_dependency_registered_later_resolves() {
    // test-depends-package sorts before test-package, so its dependency is
    // unknown during the first pass and resolved by the second
    let env = TestEnv::with_fixtures();
    let conn = env.conn();

    let base = base_package(&conn, "test-depends-package");
    assert_eq!(build_depend_names(&conn, &base), vec!["test-package"]);

    let leaf = base_package(&conn, "test-package");
    assert!(build_depend_names(&conn, &leaf).is_empty());
}

#[test]
fn test_unknown_dependency_is_ignored() {
    let env = TestEnv::new();
    env.write_unit(
        "needs-system",
        "pkgbase = needs-system\n\tpkgver = 1\n\tpkgrel = 1\n\tarch = any\n\tdepends = glibc\n\tdepends = bash>=5\n\npkgname = needs-system\n",
    );
    env.refresh();

    let conn = env.conn();
    let base = base_package(&conn, "needs-system");
    assert!(build_depend_names(&conn, &base).is_empty());
}

#[test]
fn test_transitive_closure() {
    let env = TestEnv::new();
    env.write_unit(
        "chain-a",
        "pkgbase = chain-a\n\tpkgver = 1\n\tpkgrel = 1\n\tarch = any\n\tdepends = chain-b\n\npkgname = chain-a\n",
    );
    env.write_unit(
        "chain-b",
        "pkgbase = chain-b\n\tpkgver = 1\n\tpkgrel = 1\n\tarch = any\n\tdepends = chain-c>=1.0\n\npkgname = chain-b\n",
    );
    env.write_unit(
        "chain-c",
        "pkgbase = chain-c\n\tpkgver = 1\n\tpkgrel = 1\n\tarch = any\n\npkgname = chain-c\n",
    );
    env.refresh();

    let conn = env.conn();
    let mut deps = build_depend_names(&conn, &base_package(&conn, "chain-a"));
    deps.sort();
    assert_eq!(deps, vec!["chain-b", "chain-c"]);
    assert_eq!(build_depend_names(&conn, &base_package(&conn, "chain-b")), vec!["chain-c"]);
}

#[test]
fn test_dependency_cycle_terminates() {
    let env = TestEnv::new();
    env.write_unit(
        "cycle-a",
        "pkgbase = cycle-a\n\tpkgver = 1\n\tpkgrel = 1\n\tarch = any\n\tdepends = cycle-b\n\npkgname = cycle-a\n",
    );
    env.write_unit(
        "cycle-b",
        "pkgbase = cycle-b\n\tpkgver = 1\n\tpkgrel = 1\n\tarch = any\n\tdepends = cycle-a\n\npkgname = cycle-b\n",
    );
    env.refresh();

    let conn = env.conn();
    // Closure stops at a unit's own outputs: cycle-a reaches cycle-b, whose
    // dependency on cycle-a is not carried back into cycle-a's set
    let a = base_package(&conn, "cycle-a");
    let b = base_package(&conn, "cycle-b");
    assert_eq!(build_depend_names(&conn, &a), vec!["cycle-b"]);
    assert_eq!(build_depend_names(&conn, &b), vec!["cycle-a"]);
    assert!(!build_depend_names(&conn, &a).contains(&"cycle-a".to_string()));
    assert!(!build_depend_names(&conn, &b).contains(&"cycle-b".to_string()));
}

#[test]
fn test_refresh_is_idempotent() {
    let env = TestEnv::with_fixtures();

    let snapshot = |conn: &rusqlite::Connection| {
        let mut rows = Vec::new();
        for base in BasePackage::list_all(conn).unwrap() {
            let id = base.id.unwrap();
            let mut packages: Vec<(String, bool)> = BasePackage::packages(conn, id)
                .unwrap()
                .into_iter()
                .map(|p| (p.name, p.is_virtual))
                .collect();
            packages.sort();
            rows.push((
                base.name.clone(),
                base.version.clone(),
                arch_names(conn, &base),
                packages,
                build_depend_names(conn, &base),
            ));
        }
        rows.sort();
        rows
    };

    let before = snapshot(&env.conn());
    let package_count = Package::list_all(&env.conn()).unwrap().len();

    let report = env.refresh();
    assert_eq!(report.registered, 0);
    assert_eq!(report.refreshed, 5);

    let conn = env.conn();
    assert_eq!(snapshot(&conn), before);
    assert_eq!(Package::list_all(&conn).unwrap().len(), package_count);
}

#[test]
fn test_removed_pkgbuild_deletes_unit() {
    let env = TestEnv::with_fixtures();

    let (base_id, package_id) = {
        let conn = env.conn();
        let base = base_package(&conn, "test-package");
        let base_id = base.id.unwrap();
        let arch = Architecture::get_or_create(&conn, "x86_64").unwrap();
        Build::get_or_create(&conn, base_id, "1:1.0.0-1", arch.id.unwrap()).unwrap();
        (base_id, real_package(&conn, "test-package").id.unwrap())
    };

    fs::remove_file(env.packages_root().join("test-package").join("PKGBUILD")).unwrap();
    let report = env.refresh();
    assert_eq!(report.removed, 1);
    assert_eq!(report.refreshed, 4);

    let conn = env.conn();
    assert!(BasePackage::find_by_id(&conn, base_id).unwrap().is_none());
    assert!(Package::find_by_id(&conn, package_id).unwrap().is_none());
    assert!(Build::list_for_base_package(&conn, base_id).unwrap().is_empty());

    // The dependent loses its build dependency with the package
    let dependent = base_package(&conn, "test-depends-package");
    assert!(build_depend_names(&conn, &dependent).is_empty());
}

#[test]
fn test_malformed_srcinfo_keeps_unit_unnamed() {
    let env = TestEnv::new();
    env.write_fixtures();
    env.write_unit("broken", "this is not metadata\n");

    let report = env.refresh();
    assert_eq!(report.registered, 6);
    assert_eq!(report.failed, 1);
    assert_eq!(report.refreshed, 5);

    let conn = env.conn();
    let dir = env.packages_root().join("broken");
    let broken = BasePackage::find_by_directory(&conn, &dir.to_string_lossy())
        .unwrap()
        .unwrap();
    assert!(broken.name.is_none());
    assert!(broken.version.is_none());
    assert!(BasePackage::packages(&conn, broken.id.unwrap()).unwrap().is_empty());
}

#[test]
fn test_failed_extraction_keeps_previous_metadata() {
    let env = TestEnv::with_fixtures();
    let dir = env.packages_root().join("test-package");
    fs::write(dir.join(".SRCINFO"), "pkgbase = test-package\n").unwrap();

    let report = env.refresh();
    assert_eq!(report.failed, 1);

    let conn = env.conn();
    let base = base_package(&conn, "test-package");
    assert_eq!(base.version.as_deref(), Some("1:1.0.0-1"));
    assert_eq!(arch_names(&conn, &base), vec!["i686", "x86_64"]);
}

#[test]
fn test_nested_units_and_hidden_directories() {
    let env = TestEnv::new();
    env.write_unit(
        "group/nested",
        "pkgbase = nested\n\tpkgver = 1\n\tpkgrel = 1\n\tarch = any\n\npkgname = nested\n",
    );
    env.write_unit(
        ".git/hidden",
        "pkgbase = hidden\n\tpkgver = 1\n\tpkgrel = 1\n\tarch = any\n\npkgname = hidden\n",
    );

    let report = env.refresh();
    assert_eq!(report.registered, 1);

    let conn = env.conn();
    let nested = base_package(&conn, "nested");
    assert_eq!(nested.directory(), env.packages_root().join("group").join("nested"));
    assert!(BasePackage::find_by_name(&conn, "hidden").unwrap().is_none());
}

#[test]
fn test_refresh_updates_source_tree_first() {
    let env = TestEnv::with_fixtures();

    let pulled = env.vcs.pulled.lock().unwrap().clone();
    assert_eq!(pulled, vec![env.packages_root().to_path_buf()]);

    // Each unit is regenerated once per pass
    assert_eq!(env.srcinfo.calls.lock().unwrap().len(), 10);
}

#[test]
fn test_refresh_requires_packages_root() {
    let env = TestEnv::new();
    fs::remove_dir_all(env.packages_root()).unwrap();

    let mut conn = env.conn();
    let err = pkgrepo::scanner::refresh(&mut conn, &env.ctx).unwrap_err();
    assert!(matches!(err, pkgrepo::Error::NotFoundError(_)));
}

#[test]
fn test_provided_virtual_is_pruned_from_build_depends() {
    let env = TestEnv::with_fixtures();
    let conn = env.conn();

    // A hand-written dependency on both the alias and its provider
    let consumer = base_package(&conn, "test-split-package");
    let consumer_id = consumer.id.unwrap();
    let provider = real_package(&conn, "test-provides-package");
    let alias = Package::find_by_name(&conn, "test-virtual-package").unwrap().remove(0);

    BasePackage::add_build_depend(&conn, consumer_id, provider.id.unwrap()).unwrap();
    BasePackage::add_build_depend(&conn, consumer_id, alias.id.unwrap()).unwrap();

    let resolved = graph::resolve_build_depends(&conn, consumer_id).unwrap();
    assert!(resolved.contains(&provider.id.unwrap()));
    assert!(!resolved.contains(&alias.id.unwrap()));
    assert_eq!(build_depend_names(&conn, &consumer), vec!["test-provides-package"]);
}

#[test]
fn test_static_index_written_after_refresh() {
    let env = TestEnv::with_config(|config| config.build.static_index = true);
    env.write_fixtures();
    env.refresh();

    let path = env
        .repositories_root()
        .join(pkgrepo::static_index::INDEX_FILENAME);
    let content = fs::read_to_string(path).unwrap();
    let index: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert!(index["repositories"].as_array().unwrap().is_empty());
}
