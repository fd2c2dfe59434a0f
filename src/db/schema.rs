// src/db/schema.rs

//! Database schema definitions and migrations for pkgrepo
//!
//! This module defines the SQLite schema for all core tables and provides
//! a migration system to evolve the schema over time.

use crate::error::{Error, Result};
use rusqlite::Connection;
use tracing::{debug, info};

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the schema version tracking table
fn init_schema_version(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;
    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> Result<i32> {
    init_schema_version(conn)?;

    let version = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )?;

    Ok(version)
}

/// Set the schema version
fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// Apply all pending migrations to bring the database up to date
pub fn migrate(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;

    if current_version >= SCHEMA_VERSION {
        debug!("Schema is up to date (version {})", current_version);
        return Ok(());
    }

    for version in (current_version + 1)..=SCHEMA_VERSION {
        info!("Applying migration to version {}", version);
        apply_migration(conn, version)?;
        set_schema_version(conn, version)?;
    }

    info!(
        "Schema migration complete. Now at version {}",
        SCHEMA_VERSION
    );
    Ok(())
}

/// Apply a specific migration version
fn apply_migration(conn: &Connection, version: i32) -> Result<()> {
    match version {
        1 => migrate_v1(conn),
        _ => Err(Error::InitError(format!(
            "Unknown migration version: {}",
            version
        ))),
    }
}

/// Initial schema - Version 1
///
/// - architectures: Instruction set names plus the `any` sentinel
/// - base_packages: One PKGBUILD source tree each
/// - packages: Real and virtual outputs of a base package
/// - package_provides: Real package -> virtual package it provides
/// - build_depends: Transitively closed build dependencies of a base package
/// - builds: Successful build history
/// - repositories: Publication channels and their membership
fn migrate_v1(conn: &Connection) -> Result<()> {
    debug!("Creating schema version 1");

    conn.execute_batch(
        "
        CREATE TABLE architectures (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        );

        CREATE TABLE base_packages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            base_directory TEXT NOT NULL UNIQUE,
            name TEXT,
            version TEXT,
            building INTEGER NOT NULL DEFAULT 0,
            builds INTEGER NOT NULL DEFAULT 0,
            official INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX idx_base_packages_name ON base_packages(name);

        CREATE TABLE base_package_architectures (
            base_package_id INTEGER NOT NULL,
            architecture_id INTEGER NOT NULL,
            PRIMARY KEY (base_package_id, architecture_id),
            FOREIGN KEY (base_package_id) REFERENCES base_packages(id) ON DELETE CASCADE,
            FOREIGN KEY (architecture_id) REFERENCES architectures(id)
        );

        CREATE TABLE packages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            base_package_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            virtual INTEGER NOT NULL DEFAULT 0,
            UNIQUE (base_package_id, name, virtual),
            FOREIGN KEY (base_package_id) REFERENCES base_packages(id) ON DELETE CASCADE
        );

        CREATE INDEX idx_packages_name ON packages(name);

        CREATE TABLE package_provides (
            package_id INTEGER NOT NULL,
            provided_id INTEGER NOT NULL,
            PRIMARY KEY (package_id, provided_id),
            FOREIGN KEY (package_id) REFERENCES packages(id) ON DELETE CASCADE,
            FOREIGN KEY (provided_id) REFERENCES packages(id) ON DELETE CASCADE
        );

        CREATE INDEX idx_package_provides_provided ON package_provides(provided_id);

        CREATE TABLE build_depends (
            base_package_id INTEGER NOT NULL,
            package_id INTEGER NOT NULL,
            PRIMARY KEY (base_package_id, package_id),
            FOREIGN KEY (base_package_id) REFERENCES base_packages(id) ON DELETE CASCADE,
            FOREIGN KEY (package_id) REFERENCES packages(id) ON DELETE CASCADE
        );

        CREATE INDEX idx_build_depends_package ON build_depends(package_id);

        CREATE TABLE builds (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            base_package_id INTEGER NOT NULL,
            version TEXT NOT NULL,
            architecture_id INTEGER NOT NULL,
            target TEXT,
            date TEXT,
            FOREIGN KEY (base_package_id) REFERENCES base_packages(id) ON DELETE CASCADE,
            FOREIGN KEY (architecture_id) REFERENCES architectures(id)
        );

        CREATE INDEX idx_builds_lookup ON builds(base_package_id, version, architecture_id);

        CREATE TABLE repositories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            description TEXT NOT NULL DEFAULT '',
            target TEXT NOT NULL CHECK(target IN ('extra', 'testing', 'stg')),
            multilib INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE repository_architectures (
            repository_id INTEGER NOT NULL,
            architecture_id INTEGER NOT NULL,
            PRIMARY KEY (repository_id, architecture_id),
            FOREIGN KEY (repository_id) REFERENCES repositories(id) ON DELETE CASCADE,
            FOREIGN KEY (architecture_id) REFERENCES architectures(id)
        );

        CREATE TABLE repository_packages (
            repository_id INTEGER NOT NULL,
            package_id INTEGER NOT NULL,
            PRIMARY KEY (repository_id, package_id),
            FOREIGN KEY (repository_id) REFERENCES repositories(id) ON DELETE CASCADE,
            FOREIGN KEY (package_id) REFERENCES packages(id) ON DELETE CASCADE
        );
        ",
    )?;

    debug!("Schema version 1 created successfully");
    Ok(())
}
