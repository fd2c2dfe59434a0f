// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.
//!
//! `TestEnv` lays out a package tree, a repositories root and a database in
//! a temporary directory, and wires a context whose tools are recording
//! fakes instead of makepkg, devtools and repo-add.

#![allow(dead_code)]

use pkgrepo::config::Config;
use pkgrepo::db;
use pkgrepo::db::models::{BasePackage, Package};
use pkgrepo::metadata::SrcInfo;
use pkgrepo::{BuildRequest, Builder, Context, Indexer, SourceControl, SrcinfoGenerator, Toolchain};
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const TEST_PACKAGE: &str = "\
pkgbase = test-package
\tpkgdesc = Test package
\tpkgver = 1.0.0
\tpkgrel = 1
\tepoch = 1
\tarch = i686
\tarch = x86_64

pkgname = test-package
";

pub const TEST_OFFICIAL_PACKAGE: &str = "\
pkgbase = test-official-package
\tpkgver = 1.1.0
\tpkgrel = 3
\tarch = any

pkgname = test-official-package
";

pub const TEST_DEPENDS_PACKAGE: &str = "\
pkgbase = test-depends-package
\tpkgver = 1.0.1
\tpkgrel = 1
\tarch = i686
\tarch = x86_64
\tdepends = test-package

pkgname = test-depends-package
";

pub const TEST_PROVIDES_PACKAGE: &str = "\
pkgbase = test-provides-package
\tpkgver = 1.3.2
\tpkgrel = 2
\tarch = x86_64
\tprovides = test-virtual-package

pkgname = test-provides-package
";

pub const TEST_SPLIT_PACKAGE: &str = "\
pkgbase = test-split-package
\tpkgver = 2.1.0
\tpkgrel = 2
\tarch = x86_64

pkgname = test-first-package

pkgname = test-second-package
";

/// Leaves the .SRCINFO written by the test in place
#[derive(Debug, Default)]
pub struct StaticSrcinfo {
    pub calls: Mutex<Vec<PathBuf>>,
}

impl SrcinfoGenerator for StaticSrcinfo {
    fn generate(&self, directory: &Path) -> pkgrepo::Result<()> {
        self.calls.lock().unwrap().push(directory.to_path_buf());
        Ok(())
    }
}

/// Records build requests and writes the artifacts a real build would produce
#[derive(Debug)]
pub struct RecordingBuilder {
    db_path: String,
    pub succeed: AtomicBool,
    pub requests: Mutex<Vec<BuildRequest>>,
    /// `building` flag of the base package as seen while the build runs
    pub observed_building: Mutex<Vec<bool>>,
}

impl RecordingBuilder {
    pub fn new(db_path: String) -> Self {
        Self {
            db_path,
            succeed: AtomicBool::new(true),
            requests: Mutex::new(Vec::new()),
            observed_building: Mutex::new(Vec::new()),
        }
    }

    pub fn fail(&self) {
        self.succeed.store(false, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<BuildRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn write_artifacts(directory: &Path) {
        let Ok(content) = fs::read_to_string(directory.join(".SRCINFO")) else {
            return;
        };
        let Ok(info) = SrcInfo::parse(&content) else {
            return;
        };
        let version = info.version().unwrap();
        for package in &info.packages {
            for arch in &info.architectures {
                let filename = pkgrepo::graph::artifact_filename(&package.name, &version, arch);
                fs::write(directory.join(filename), b"artifact").unwrap();
            }
        }
    }
}

impl Builder for RecordingBuilder {
    fn build(&self, request: &BuildRequest) -> pkgrepo::Result<bool> {
        let conn = db::open(&self.db_path)?;
        let building: i64 = conn.query_row(
            "SELECT COUNT(*) FROM base_packages WHERE building = 1",
            [],
            |row| row.get(0),
        )?;
        self.observed_building.lock().unwrap().push(building > 0);
        self.requests.lock().unwrap().push(request.clone());

        let success = self.succeed.load(Ordering::SeqCst);
        if success {
            Self::write_artifacts(&request.directory);
        }
        Ok(success)
    }
}

/// One index tool invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexCall {
    pub directory: PathBuf,
    pub db_filename: String,
    pub argument: String,
    pub delta: bool,
}

/// Records repo-add / repo-remove calls
#[derive(Debug, Default)]
pub struct RecordingIndexer {
    pub added: Mutex<Vec<IndexCall>>,
    pub removed: Mutex<Vec<IndexCall>>,
}

impl RecordingIndexer {
    pub fn added(&self) -> Vec<IndexCall> {
        self.added.lock().unwrap().clone()
    }

    pub fn removed(&self) -> Vec<IndexCall> {
        self.removed.lock().unwrap().clone()
    }
}

impl Indexer for RecordingIndexer {
    fn add(&self, directory: &Path, db_filename: &str, artifact: &str, delta: bool) -> pkgrepo::Result<bool> {
        self.added.lock().unwrap().push(IndexCall {
            directory: directory.to_path_buf(),
            db_filename: db_filename.to_string(),
            argument: artifact.to_string(),
            delta,
        });
        Ok(true)
    }

    fn remove(&self, directory: &Path, db_filename: &str, package_name: &str) -> pkgrepo::Result<bool> {
        self.removed.lock().unwrap().push(IndexCall {
            directory: directory.to_path_buf(),
            db_filename: db_filename.to_string(),
            argument: package_name.to_string(),
            delta: false,
        });
        Ok(true)
    }
}

/// Source control whose answer is set by the test
#[derive(Debug, Default)]
pub struct StaticVcs {
    pub behind: AtomicBool,
    pub pulled: Mutex<Vec<PathBuf>>,
}

impl SourceControl for StaticVcs {
    fn is_behind(&self, _base: &BasePackage) -> bool {
        self.behind.load(Ordering::SeqCst)
    }

    fn update_tree(&self, root: &Path) -> pkgrepo::Result<()> {
        self.pulled.lock().unwrap().push(root.to_path_buf());
        Ok(())
    }
}

/// Temporary package tree, repositories root and database with fake tools
pub struct TestEnv {
    pub dir: TempDir,
    pub ctx: Arc<Context>,
    pub srcinfo: Arc<StaticSrcinfo>,
    pub builder: Arc<RecordingBuilder>,
    pub indexer: Arc<RecordingIndexer>,
    pub vcs: Arc<StaticVcs>,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Environment with extra configuration applied on top of the test paths
    pub fn with_config(adjust: impl FnOnce(&mut Config)) -> Self {
        let dir = tempfile::tempdir().unwrap();

        let mut config = Config::default();
        config.paths.packages_root = dir.path().join("packages");
        config.paths.repositories_root = dir.path().join("repos");
        config.paths.database = dir.path().join("pkgrepo.db");
        adjust(&mut config);

        fs::create_dir_all(&config.paths.packages_root).unwrap();
        db::init(&config.db_path()).unwrap();

        let srcinfo = Arc::new(StaticSrcinfo::default());
        let builder = Arc::new(RecordingBuilder::new(config.db_path()));
        let indexer = Arc::new(RecordingIndexer::default());
        let vcs = Arc::new(StaticVcs::default());

        let tools = Toolchain {
            srcinfo: srcinfo.clone(),
            builder: builder.clone(),
            indexer: indexer.clone(),
            vcs: vcs.clone(),
        };

        Self {
            dir,
            ctx: Arc::new(Context::new(config, tools)),
            srcinfo,
            builder,
            indexer,
            vcs,
        }
    }

    pub fn conn(&self) -> Connection {
        self.ctx.open_db().unwrap()
    }

    pub fn packages_root(&self) -> &Path {
        &self.ctx.config.paths.packages_root
    }

    pub fn repositories_root(&self) -> &Path {
        &self.ctx.config.paths.repositories_root
    }

    /// Write a PKGBUILD and .SRCINFO under `relative` (unofficial layout)
    pub fn write_unit(&self, relative: &str, srcinfo: &str) -> PathBuf {
        let dir = self.packages_root().join(relative);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("PKGBUILD"), "# test PKGBUILD\n").unwrap();
        fs::write(dir.join(".SRCINFO"), srcinfo).unwrap();
        dir
    }

    /// Write a PKGBUILD and .SRCINFO under `relative/trunk` (official layout)
    pub fn write_official_unit(&self, relative: &str, srcinfo: &str) -> PathBuf {
        self.write_unit(&format!("{}/trunk", relative), srcinfo);
        self.packages_root().join(relative)
    }

    /// The five fixture base packages
    pub fn write_fixtures(&self) {
        self.write_unit("test-package", TEST_PACKAGE);
        self.write_official_unit("test-official-package", TEST_OFFICIAL_PACKAGE);
        self.write_unit("test-depends-package", TEST_DEPENDS_PACKAGE);
        self.write_unit("test-provides-package", TEST_PROVIDES_PACKAGE);
        self.write_unit("test-split-package", TEST_SPLIT_PACKAGE);
    }

    pub fn refresh(&self) -> pkgrepo::RefreshReport {
        let mut conn = self.conn();
        pkgrepo::scanner::refresh(&mut conn, &self.ctx).unwrap()
    }

    /// Fixtures written and scanned
    pub fn with_fixtures() -> Self {
        let env = Self::new();
        env.write_fixtures();
        env.refresh();
        env
    }
}

/// The real package with this name
pub fn real_package(conn: &Connection, name: &str) -> Package {
    let mut found = Package::find_real_by_name(conn, name).unwrap();
    assert_eq!(found.len(), 1, "expected exactly one real package '{}'", name);
    found.remove(0)
}

/// Base package by pkgbase
pub fn base_package(conn: &Connection, name: &str) -> BasePackage {
    BasePackage::find_by_name(conn, name)
        .unwrap()
        .unwrap_or_else(|| panic!("base package '{}' not registered", name))
}

/// Names of a base package's build dependencies
pub fn build_depend_names(conn: &Connection, base: &BasePackage) -> Vec<String> {
    BasePackage::build_depends(conn, base.id.unwrap())
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect()
}
