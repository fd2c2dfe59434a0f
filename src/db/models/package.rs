// src/db/models/package.rs

//! Package model - real outputs and virtual aliases of a base package

use super::base_package::BasePackage;
use crate::error::{Error, Result};
use rusqlite::{Connection, OptionalExtension, Row, params};

const COLUMNS: &str = "id, base_package_id, name, virtual";

/// One installable output, or a virtual name satisfied by real outputs
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Package {
    pub id: Option<i64>,
    pub base_package_id: i64,
    pub name: String,
    /// Alias/capability rather than an installable artifact
    pub is_virtual: bool,
}

impl Package {
    /// Create a new Package
    pub fn new(base_package_id: i64, name: String, is_virtual: bool) -> Self {
        Self {
            id: None,
            base_package_id,
            name,
            is_virtual,
        }
    }

    /// Insert this package into the database
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO packages (base_package_id, name, virtual) VALUES (?1, ?2, ?3)",
            params![self.base_package_id, &self.name, self.is_virtual as i32],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// Look up the package with this identity under a base package, creating it if needed
    pub fn get_or_create(
        conn: &Connection,
        base_package_id: i64,
        name: &str,
        is_virtual: bool,
    ) -> Result<Self> {
        let sql = format!(
            "SELECT {} FROM packages WHERE base_package_id = ?1 AND name = ?2 AND virtual = ?3",
            COLUMNS
        );
        let existing = conn
            .query_row(
                &sql,
                params![base_package_id, name, is_virtual as i32],
                Self::from_row,
            )
            .optional()?;

        if let Some(pkg) = existing {
            return Ok(pkg);
        }

        let mut pkg = Self::new(base_package_id, name.to_string(), is_virtual);
        pkg.insert(conn)?;
        Ok(pkg)
    }

    /// Find a package by ID
    pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Self>> {
        let sql = format!("SELECT {} FROM packages WHERE id = ?1", COLUMNS);
        let pkg = conn.query_row(&sql, [id], Self::from_row).optional()?;
        Ok(pkg)
    }

    /// Find every package (real or virtual, any base package) with this name
    pub fn find_by_name(conn: &Connection, name: &str) -> Result<Vec<Self>> {
        let sql = format!("SELECT {} FROM packages WHERE name = ?1 ORDER BY id", COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let packages = stmt
            .query_map([name], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(packages)
    }

    /// Find the non-virtual packages with this name
    pub fn find_real_by_name(conn: &Connection, name: &str) -> Result<Vec<Self>> {
        let sql = format!(
            "SELECT {} FROM packages WHERE name = ?1 AND virtual = 0 ORDER BY id",
            COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let packages = stmt
            .query_map([name], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(packages)
    }

    /// List all packages
    pub fn list_all(conn: &Connection) -> Result<Vec<Self>> {
        let sql = format!("SELECT {} FROM packages ORDER BY name, id", COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let packages = stmt
            .query_map([], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(packages)
    }

    /// List the packages owned by a base package
    pub fn list_for_base_package(conn: &Connection, base_package_id: i64) -> Result<Vec<Self>> {
        let sql = format!(
            "SELECT {} FROM packages WHERE base_package_id = ?1 ORDER BY name, virtual",
            COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let packages = stmt
            .query_map([base_package_id], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(packages)
    }

    /// Virtual packages provided by this package
    pub fn provides(conn: &Connection, id: i64) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT p.id, p.base_package_id, p.name, p.virtual FROM packages p
             JOIN package_provides pp ON pp.provided_id = p.id
             WHERE pp.package_id = ?1 ORDER BY p.name",
        )?;
        let packages = stmt
            .query_map([id], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(packages)
    }

    /// Real packages providing this (virtual) package
    pub fn providers(conn: &Connection, id: i64) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT p.id, p.base_package_id, p.name, p.virtual FROM packages p
             JOIN package_provides pp ON pp.package_id = p.id
             WHERE pp.provided_id = ?1 ORDER BY p.name",
        )?;
        let packages = stmt
            .query_map([id], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(packages)
    }

    /// Record that this package provides `provided_id`
    pub fn add_provides(conn: &Connection, id: i64, provided_id: i64) -> Result<()> {
        conn.execute(
            "INSERT OR IGNORE INTO package_provides (package_id, provided_id) VALUES (?1, ?2)",
            params![id, provided_id],
        )?;
        Ok(())
    }

    /// Forget everything this package provides
    pub fn clear_provides(conn: &Connection, id: i64) -> Result<()> {
        conn.execute("DELETE FROM package_provides WHERE package_id = ?1", [id])?;
        Ok(())
    }

    /// Load the owning base package
    pub fn base_package(&self, conn: &Connection) -> Result<BasePackage> {
        BasePackage::find_by_id(conn, self.base_package_id)?.ok_or_else(|| {
            Error::NotFoundError(format!(
                "Base package {} of '{}'",
                self.base_package_id, self.name
            ))
        })
    }

    /// Database ID, failing for packages that were never persisted
    pub fn require_id(&self) -> Result<i64> {
        self.id
            .ok_or_else(|| Error::InitError(format!("Package '{}' has no ID", self.name)))
    }

    pub(crate) fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            base_package_id: row.get(1)?,
            name: row.get(2)?,
            is_virtual: row.get::<_, i32>(3)? != 0,
        })
    }
}
