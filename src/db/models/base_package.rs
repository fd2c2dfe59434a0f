// src/db/models/base_package.rs

//! BasePackage model - one PKGBUILD source tree (a build unit)
//!
//! A base package owns its packages and its build history. Its architectures
//! and build dependencies are many-to-many links that metadata extraction
//! rewrites wholesale.

use super::architecture::{ANY_ARCH, Architecture};
use super::package::Package;
use crate::error::{Error, Result};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::PathBuf;

/// Build description file inside a base package directory
pub const PKGBUILD: &str = "PKGBUILD";

/// Generated metadata file inside a base package directory
pub const SRCINFO: &str = ".SRCINFO";

/// Subdirectory holding the PKGBUILD of official (svn-layout) packages
pub const TRUNK: &str = "trunk";

const COLUMNS: &str = "id, base_directory, name, version, building, builds, official";

/// A buildable source tree producing one or more packages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasePackage {
    pub id: Option<i64>,
    /// Directory registered by the scanner (parent of `trunk` for official packages)
    pub base_directory: String,
    /// `pkgbase` from the metadata, unset until the first extraction
    pub name: Option<String>,
    /// Composed `epoch:pkgver-pkgrel`, unset until the first extraction
    pub version: Option<String>,
    /// A build is currently in flight
    pub building: bool,
    /// The last build attempt succeeded
    pub builds: bool,
    /// PKGBUILD lives under `trunk/`
    pub official: bool,
}

impl BasePackage {
    /// Create a new BasePackage
    pub fn new(base_directory: String, official: bool) -> Self {
        Self {
            id: None,
            base_directory,
            name: None,
            version: None,
            building: false,
            builds: false,
            official,
        }
    }

    /// Insert this base package into the database
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO base_packages (base_directory, name, version, building, builds, official)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                &self.base_directory,
                &self.name,
                &self.version,
                self.building as i32,
                self.builds as i32,
                self.official as i32,
            ],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// Find a base package by ID
    pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Self>> {
        let sql = format!("SELECT {} FROM base_packages WHERE id = ?1", COLUMNS);
        let base = conn.query_row(&sql, [id], Self::from_row).optional()?;
        Ok(base)
    }

    /// Find a base package by its registered directory
    pub fn find_by_directory(conn: &Connection, base_directory: &str) -> Result<Option<Self>> {
        let sql = format!("SELECT {} FROM base_packages WHERE base_directory = ?1", COLUMNS);
        let base = conn
            .query_row(&sql, [base_directory], Self::from_row)
            .optional()?;
        Ok(base)
    }

    /// Find a base package by its `pkgbase` name
    pub fn find_by_name(conn: &Connection, name: &str) -> Result<Option<Self>> {
        let sql = format!(
            "SELECT {} FROM base_packages WHERE name = ?1 ORDER BY id LIMIT 1",
            COLUMNS
        );
        let base = conn.query_row(&sql, [name], Self::from_row).optional()?;
        Ok(base)
    }

    /// Register a directory, reusing an existing row and refreshing its layout flag
    pub fn get_or_create(conn: &Connection, base_directory: &str, official: bool) -> Result<Self> {
        if let Some(mut base) = Self::find_by_directory(conn, base_directory)? {
            if base.official != official {
                base.official = official;
                base.update(conn)?;
            }
            return Ok(base);
        }

        let mut base = Self::new(base_directory.to_string(), official);
        base.insert(conn)?;
        Ok(base)
    }

    /// List all base packages
    pub fn list_all(conn: &Connection) -> Result<Vec<Self>> {
        let sql = format!("SELECT {} FROM base_packages ORDER BY name, base_directory", COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let bases = stmt
            .query_map([], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(bases)
    }

    /// Persist every column of this base package
    pub fn update(&self, conn: &Connection) -> Result<()> {
        let id = self.require_id()?;

        conn.execute(
            "UPDATE base_packages SET base_directory = ?1, name = ?2, version = ?3,
             building = ?4, builds = ?5, official = ?6 WHERE id = ?7",
            params![
                &self.base_directory,
                &self.name,
                &self.version,
                self.building as i32,
                self.builds as i32,
                self.official as i32,
                id,
            ],
        )?;

        Ok(())
    }

    /// Persist only the extracted metadata, leaving the build flags alone
    pub fn update_metadata(conn: &Connection, id: i64, name: Option<&str>, version: Option<&str>) -> Result<()> {
        conn.execute(
            "UPDATE base_packages SET name = ?1, version = ?2 WHERE id = ?3",
            params![name, version, id],
        )?;
        Ok(())
    }

    /// Delete a base package; packages and build history go with it
    pub fn delete(conn: &Connection, id: i64) -> Result<()> {
        conn.execute("DELETE FROM base_packages WHERE id = ?1", [id])?;
        Ok(())
    }

    /// Persist only the in-flight flag
    pub fn set_building(conn: &Connection, id: i64, building: bool) -> Result<()> {
        conn.execute(
            "UPDATE base_packages SET building = ?1 WHERE id = ?2",
            params![building as i32, id],
        )?;
        Ok(())
    }

    /// Persist only the last-build-succeeded flag
    pub fn set_builds(conn: &Connection, id: i64, builds: bool) -> Result<()> {
        conn.execute(
            "UPDATE base_packages SET builds = ?1 WHERE id = ?2",
            params![builds as i32, id],
        )?;
        Ok(())
    }

    /// Directory containing the PKGBUILD
    pub fn directory(&self) -> PathBuf {
        let base = PathBuf::from(&self.base_directory);
        if self.official { base.join(TRUNK) } else { base }
    }

    /// Path of the PKGBUILD
    pub fn pkgbuild_path(&self) -> PathBuf {
        self.directory().join(PKGBUILD)
    }

    /// Path of the generated .SRCINFO
    pub fn srcinfo_path(&self) -> PathBuf {
        self.directory().join(SRCINFO)
    }

    /// `pkgbase` if known, otherwise the directory
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.base_directory)
    }

    /// Database ID, failing for base packages that were never persisted
    pub fn require_id(&self) -> Result<i64> {
        self.id.ok_or_else(|| {
            Error::InitError(format!("Base package '{}' has no ID", self.base_directory))
        })
    }

    /// Architectures this base package declares
    pub fn architectures(conn: &Connection, id: i64) -> Result<Vec<Architecture>> {
        let mut stmt = conn.prepare(
            "SELECT a.id, a.name FROM architectures a
             JOIN base_package_architectures bpa ON bpa.architecture_id = a.id
             WHERE bpa.base_package_id = ?1 ORDER BY a.name",
        )?;
        let archs = stmt
            .query_map([id], |row| {
                Ok(Architecture {
                    id: Some(row.get(0)?),
                    name: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(archs)
    }

    /// Link an architecture (no-op when already linked)
    pub fn add_architecture(conn: &Connection, id: i64, architecture_id: i64) -> Result<()> {
        conn.execute(
            "INSERT OR IGNORE INTO base_package_architectures (base_package_id, architecture_id)
             VALUES (?1, ?2)",
            params![id, architecture_id],
        )?;
        Ok(())
    }

    /// Unlink every architecture
    pub fn clear_architectures(conn: &Connection, id: i64) -> Result<()> {
        conn.execute(
            "DELETE FROM base_package_architectures WHERE base_package_id = ?1",
            [id],
        )?;
        Ok(())
    }

    /// True when the base package declares the named architecture
    pub fn supports_architecture(conn: &Connection, id: i64, name: &str) -> Result<bool> {
        let found: i64 = conn.query_row(
            "SELECT COUNT(*) FROM base_package_architectures bpa
             JOIN architectures a ON a.id = bpa.architecture_id
             WHERE bpa.base_package_id = ?1 AND a.name = ?2",
            params![id, name],
            |row| row.get(0),
        )?;
        Ok(found > 0)
    }

    /// True when the base package is architecture independent
    pub fn is_any(conn: &Connection, id: i64) -> Result<bool> {
        Self::supports_architecture(conn, id, ANY_ARCH)
    }

    /// Packages (real and virtual) owned by this base package
    pub fn packages(conn: &Connection, id: i64) -> Result<Vec<Package>> {
        Package::list_for_base_package(conn, id)
    }

    /// Packages this base package build-depends on
    pub fn build_depends(conn: &Connection, id: i64) -> Result<Vec<Package>> {
        let mut stmt = conn.prepare(
            "SELECT p.id, p.base_package_id, p.name, p.virtual FROM packages p
             JOIN build_depends bd ON bd.package_id = p.id
             WHERE bd.base_package_id = ?1 ORDER BY p.name",
        )?;
        let packages = stmt
            .query_map([id], Package::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(packages)
    }

    /// Link a build dependency (no-op when already linked)
    pub fn add_build_depend(conn: &Connection, id: i64, package_id: i64) -> Result<()> {
        conn.execute(
            "INSERT OR IGNORE INTO build_depends (base_package_id, package_id) VALUES (?1, ?2)",
            params![id, package_id],
        )?;
        Ok(())
    }

    /// Unlink a build dependency
    pub fn remove_build_depend(conn: &Connection, id: i64, package_id: i64) -> Result<()> {
        conn.execute(
            "DELETE FROM build_depends WHERE base_package_id = ?1 AND package_id = ?2",
            params![id, package_id],
        )?;
        Ok(())
    }

    /// Unlink every build dependency
    pub fn clear_build_depends(conn: &Connection, id: i64) -> Result<()> {
        conn.execute("DELETE FROM build_depends WHERE base_package_id = ?1", [id])?;
        Ok(())
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            base_directory: row.get(1)?,
            name: row.get(2)?,
            version: row.get(3)?,
            building: row.get::<_, i32>(4)? != 0,
            builds: row.get::<_, i32>(5)? != 0,
            official: row.get::<_, i32>(6)? != 0,
        })
    }
}

impl std::fmt::Display for BasePackage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}
