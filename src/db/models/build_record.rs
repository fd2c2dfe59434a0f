// src/db/models/build_record.rs

//! Build model - history of successful builds
//!
//! A build row is the idempotence key of the orchestrator: an existing row
//! for (base package, version, architecture, target) means there is nothing
//! to do unless forced or the upstream source moved.

use crate::error::{Error, Result};
use rusqlite::{Connection, OptionalExtension, Row, params};

const COLUMNS: &str = "id, base_package_id, version, architecture_id, target, date";

/// A recorded successful build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Build {
    pub id: Option<i64>,
    pub base_package_id: i64,
    pub version: String,
    /// `any` for architecture-independent base packages
    pub architecture_id: i64,
    pub target: Option<String>,
    /// ISO date (YYYY-MM-DD) of the build
    pub date: Option<String>,
}

impl Build {
    /// Create a new Build
    pub fn new(base_package_id: i64, version: String, architecture_id: i64) -> Self {
        Self {
            id: None,
            base_package_id,
            version,
            architecture_id,
            target: None,
            date: None,
        }
    }

    /// Insert this build into the database
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO builds (base_package_id, version, architecture_id, target, date)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                self.base_package_id,
                &self.version,
                self.architecture_id,
                &self.target,
                &self.date,
            ],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// Find the build matching all four key fields
    pub fn find_matching(
        conn: &Connection,
        base_package_id: i64,
        version: &str,
        architecture_id: i64,
        target: &str,
    ) -> Result<Option<Self>> {
        let sql = format!(
            "SELECT {} FROM builds
             WHERE base_package_id = ?1 AND version = ?2 AND architecture_id = ?3 AND target = ?4
             ORDER BY id LIMIT 1",
            COLUMNS
        );
        let build = conn
            .query_row(
                &sql,
                params![base_package_id, version, architecture_id, target],
                Self::from_row,
            )
            .optional()?;
        Ok(build)
    }

    /// Look up the build for (base package, version, architecture), creating it if needed
    ///
    /// The target is not part of this key. Rebuilding the same version for
    /// another target moves the record to that target.
    pub fn get_or_create(
        conn: &Connection,
        base_package_id: i64,
        version: &str,
        architecture_id: i64,
    ) -> Result<Self> {
        let sql = format!(
            "SELECT {} FROM builds
             WHERE base_package_id = ?1 AND version = ?2 AND architecture_id = ?3
             ORDER BY id LIMIT 1",
            COLUMNS
        );
        let existing = conn
            .query_row(
                &sql,
                params![base_package_id, version, architecture_id],
                Self::from_row,
            )
            .optional()?;

        if let Some(build) = existing {
            return Ok(build);
        }

        let mut build = Self::new(base_package_id, version.to_string(), architecture_id);
        build.insert(conn)?;
        Ok(build)
    }

    /// Persist target and date
    pub fn update(&self, conn: &Connection) -> Result<()> {
        let id = self
            .id
            .ok_or_else(|| Error::InitError("Cannot update build without ID".to_string()))?;

        conn.execute(
            "UPDATE builds SET version = ?1, architecture_id = ?2, target = ?3, date = ?4
             WHERE id = ?5",
            params![
                &self.version,
                self.architecture_id,
                &self.target,
                &self.date,
                id,
            ],
        )?;
        Ok(())
    }

    /// Build history of a base package, newest first
    pub fn list_for_base_package(conn: &Connection, base_package_id: i64) -> Result<Vec<Self>> {
        let sql = format!(
            "SELECT {} FROM builds WHERE base_package_id = ?1 ORDER BY date DESC, id DESC",
            COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let builds = stmt
            .query_map([base_package_id], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(builds)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            base_package_id: row.get(1)?,
            version: row.get(2)?,
            architecture_id: row.get(3)?,
            target: row.get(4)?,
            date: row.get(5)?,
        })
    }
}
