// src/db/models/architecture.rs

//! Architecture model - instruction sets and the `any` sentinel

use crate::error::{Error, Result};
use rusqlite::{Connection, OptionalExtension, Row, params};

/// Architecture name meaning "architecture independent"
pub const ANY_ARCH: &str = "any";

/// An architecture packages can be built for
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Architecture {
    pub id: Option<i64>,
    pub name: String,
}

impl Architecture {
    /// Create a new Architecture
    pub fn new(name: String) -> Self {
        Self { id: None, name }
    }

    /// Insert this architecture into the database
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO architectures (name) VALUES (?1)",
            params![&self.name],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// Find an architecture by ID
    pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Self>> {
        let arch = conn
            .query_row(
                "SELECT id, name FROM architectures WHERE id = ?1",
                [id],
                Self::from_row,
            )
            .optional()?;
        Ok(arch)
    }

    /// Find an architecture by name
    pub fn find_by_name(conn: &Connection, name: &str) -> Result<Option<Self>> {
        let arch = conn
            .query_row(
                "SELECT id, name FROM architectures WHERE name = ?1",
                [name],
                Self::from_row,
            )
            .optional()?;
        Ok(arch)
    }

    /// Look up an architecture by name, creating it if it does not exist yet
    pub fn get_or_create(conn: &Connection, name: &str) -> Result<Self> {
        if let Some(arch) = Self::find_by_name(conn, name)? {
            return Ok(arch);
        }

        let mut arch = Self::new(name.to_string());
        arch.insert(conn)?;
        Ok(arch)
    }

    /// List all architectures, including `any`
    pub fn list_all(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT id, name FROM architectures ORDER BY name")?;
        let archs = stmt
            .query_map([], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(archs)
    }

    /// True for the architecture-independent sentinel
    pub fn is_any(&self) -> bool {
        self.name == ANY_ARCH
    }

    /// Database ID, failing for architectures that were never persisted
    pub fn require_id(&self) -> Result<i64> {
        self.id
            .ok_or_else(|| Error::InitError(format!("Architecture '{}' has no ID", self.name)))
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            name: row.get(1)?,
        })
    }
}

impl std::fmt::Display for Architecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}
