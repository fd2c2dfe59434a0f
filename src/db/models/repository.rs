// src/db/models/repository.rs

//! Repository model - publication channels and their membership
//!
//! The raw link operations here do not enforce any repository rule; callers
//! go through `crate::repository` which applies the consistency cascades.

use super::architecture::Architecture;
use super::package::Package;
use crate::error::{Error, Result};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const COLUMNS: &str = "id, name, description, target, multilib";

/// Publication track a repository builds for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Extra,
    Testing,
    Staging,
}

impl Target {
    /// Stored form, also the prefix of the devtools build helper
    pub fn as_str(&self) -> &str {
        match self {
            Target::Extra => "extra",
            Target::Testing => "testing",
            Target::Staging => "stg",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &str {
        match self {
            Target::Extra => "extra",
            Target::Testing => "testing",
            Target::Staging => "staging",
        }
    }

    /// All targets, in display order
    pub fn all() -> [Target; 3] {
        [Target::Extra, Target::Testing, Target::Staging]
    }
}

impl FromStr for Target {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "extra" => Ok(Target::Extra),
            "testing" => Ok(Target::Testing),
            "stg" | "staging" => Ok(Target::Staging),
            _ => Err(Error::ParseError(format!("Invalid target: {}", s))),
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named publication channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub id: Option<i64>,
    pub name: String,
    pub description: String,
    pub target: Target,
    /// Single-architecture repository carrying multilib packages
    pub multilib: bool,
}

impl Repository {
    /// Create a new Repository
    pub fn new(name: String, target: Target) -> Self {
        Self {
            id: None,
            name,
            description: String::new(),
            target,
            multilib: false,
        }
    }

    /// Insert this repository into the database
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO repositories (name, description, target, multilib) VALUES (?1, ?2, ?3, ?4)",
            params![
                &self.name,
                &self.description,
                self.target.as_str(),
                self.multilib as i32,
            ],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// Find a repository by ID
    pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Self>> {
        let sql = format!("SELECT {} FROM repositories WHERE id = ?1", COLUMNS);
        let repo = conn.query_row(&sql, [id], Self::from_row).optional()?;
        Ok(repo)
    }

    /// Find a repository by name
    pub fn find_by_name(conn: &Connection, name: &str) -> Result<Option<Self>> {
        let sql = format!("SELECT {} FROM repositories WHERE name = ?1", COLUMNS);
        let repo = conn.query_row(&sql, [name], Self::from_row).optional()?;
        Ok(repo)
    }

    /// List all repositories
    pub fn list_all(conn: &Connection) -> Result<Vec<Self>> {
        let sql = format!("SELECT {} FROM repositories ORDER BY name", COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let repos = stmt
            .query_map([], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(repos)
    }

    /// Update repository metadata
    pub fn update(&self, conn: &Connection) -> Result<()> {
        let id = self.require_id()?;

        conn.execute(
            "UPDATE repositories SET name = ?1, description = ?2, target = ?3, multilib = ?4
             WHERE id = ?5",
            params![
                &self.name,
                &self.description,
                self.target.as_str(),
                self.multilib as i32,
                id,
            ],
        )?;

        Ok(())
    }

    /// Delete a repository by ID
    pub fn delete(conn: &Connection, id: i64) -> Result<()> {
        conn.execute("DELETE FROM repositories WHERE id = ?1", [id])?;
        Ok(())
    }

    /// Architectures this repository is published for
    pub fn architectures(conn: &Connection, id: i64) -> Result<Vec<Architecture>> {
        let mut stmt = conn.prepare(
            "SELECT a.id, a.name FROM architectures a
             JOIN repository_architectures ra ON ra.architecture_id = a.id
             WHERE ra.repository_id = ?1 ORDER BY a.name",
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
            "INSERT OR IGNORE INTO repository_architectures (repository_id, architecture_id)
             VALUES (?1, ?2)",
            params![id, architecture_id],
        )?;
        Ok(())
    }

    /// Unlink an architecture
    pub fn remove_architecture(conn: &Connection, id: i64, architecture_id: i64) -> Result<()> {
        conn.execute(
            "DELETE FROM repository_architectures WHERE repository_id = ?1 AND architecture_id = ?2",
            params![id, architecture_id],
        )?;
        Ok(())
    }

    /// Published packages
    pub fn packages(conn: &Connection, id: i64) -> Result<Vec<Package>> {
        let mut stmt = conn.prepare(
            "SELECT p.id, p.base_package_id, p.name, p.virtual FROM packages p
             JOIN repository_packages rp ON rp.package_id = p.id
             WHERE rp.repository_id = ?1 ORDER BY p.name",
        )?;
        let packages = stmt
            .query_map([id], Package::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(packages)
    }

    /// IDs of the published packages
    pub fn package_ids(conn: &Connection, id: i64) -> Result<HashSet<i64>> {
        let mut stmt =
            conn.prepare("SELECT package_id FROM repository_packages WHERE repository_id = ?1")?;
        let ids = stmt
            .query_map([id], |row| row.get(0))?
            .collect::<std::result::Result<HashSet<i64>, _>>()?;
        Ok(ids)
    }

    /// Link a package (no-op when already linked)
    pub fn add_package(conn: &Connection, id: i64, package_id: i64) -> Result<bool> {
        let rows = conn.execute(
            "INSERT OR IGNORE INTO repository_packages (repository_id, package_id) VALUES (?1, ?2)",
            params![id, package_id],
        )?;
        Ok(rows > 0)
    }

    /// Unlink a package, reporting whether it was published
    pub fn remove_package(conn: &Connection, id: i64, package_id: i64) -> Result<bool> {
        let rows = conn.execute(
            "DELETE FROM repository_packages WHERE repository_id = ?1 AND package_id = ?2",
            params![id, package_id],
        )?;
        Ok(rows > 0)
    }

    /// Directory holding this repository under the repositories root
    pub fn base_directory(&self, repositories_root: &Path) -> PathBuf {
        repositories_root.join(&self.name)
    }

    /// Directory holding the database and artifacts for one architecture
    pub fn directory(&self, repositories_root: &Path, architecture: &str) -> PathBuf {
        self.base_directory(repositories_root).join(architecture)
    }

    /// Repository database filename
    pub fn db_filename(&self) -> String {
        format!("{}.db.tar.gz", self.name)
    }

    /// devtools build helper for this repository and architecture
    pub fn build_command(&self, architecture: &str) -> String {
        if self.multilib {
            format!("multilib-{}-build", self.target)
        } else {
            format!("{}-{}-build", self.target, architecture)
        }
    }

    /// Database ID, failing for repositories that were never persisted
    pub fn require_id(&self) -> Result<i64> {
        self.id
            .ok_or_else(|| Error::InitError(format!("Repository '{}' has no ID", self.name)))
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let target_str: String = row.get(3)?;
        let target = target_str.parse::<Target>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                rusqlite::types::Type::Text,
                Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())),
            )
        })?;

        Ok(Self {
            id: Some(row.get(0)?),
            name: row.get(1)?,
            description: row.get(2)?,
            target,
            multilib: row.get::<_, i32>(4)? != 0,
        })
    }
}

impl std::fmt::Display for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}
