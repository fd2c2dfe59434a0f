// src/static_index.rs

//! Static JSON index of repositories
//!
//! Written to `index.json` under the repositories root so a plain web server
//! can show what every repository publishes and the state of each package.

use crate::config::Config;
use crate::db::models::{BasePackage, Repository};
use crate::error::Result;
use rusqlite::Connection;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Filename of the index under the repositories root
pub const INDEX_FILENAME: &str = "index.json";

#[derive(Debug, Serialize)]
pub struct StaticIndex {
    pub generated_at: String,
    pub repositories: Vec<RepositoryEntry>,
}

#[derive(Debug, Serialize)]
pub struct RepositoryEntry {
    pub name: String,
    pub description: String,
    pub target: String,
    pub multilib: bool,
    pub architectures: Vec<String>,
    pub packages: Vec<PackageEntry>,
}

#[derive(Debug, Serialize)]
pub struct PackageEntry {
    pub name: String,
    pub base: Option<String>,
    pub version: Option<String>,
    pub building: bool,
    pub builds: bool,
}

/// Collect the index from the database
pub fn collect(conn: &Connection) -> Result<StaticIndex> {
    let mut repositories = Vec::new();

    for repo in Repository::list_all(conn)? {
        let id = repo.require_id()?;
        let architectures = Repository::architectures(conn, id)?
            .into_iter()
            .map(|a| a.name)
            .collect();

        let mut packages = Vec::new();
        for package in Repository::packages(conn, id)? {
            let base = BasePackage::find_by_id(conn, package.base_package_id)?;
            packages.push(PackageEntry {
                name: package.name,
                base: base.as_ref().and_then(|b| b.name.clone()),
                version: base.as_ref().and_then(|b| b.version.clone()),
                building: base.as_ref().is_some_and(|b| b.building),
                builds: base.as_ref().is_some_and(|b| b.builds),
            });
        }

        repositories.push(RepositoryEntry {
            name: repo.name,
            description: repo.description,
            target: repo.target.as_str().to_string(),
            multilib: repo.multilib,
            architectures,
            packages,
        });
    }

    Ok(StaticIndex {
        generated_at: chrono::Utc::now().to_rfc3339(),
        repositories,
    })
}

/// Write `index.json`, replacing any previous version atomically
pub fn write_index(conn: &Connection, config: &Config) -> Result<PathBuf> {
    let index = collect(conn)?;
    let root = &config.paths.repositories_root;
    fs::create_dir_all(root)?;

    let path = root.join(INDEX_FILENAME);
    let tmp = root.join(format!(".{}.tmp", INDEX_FILENAME));
    fs::write(&tmp, serde_json::to_vec_pretty(&index)?)?;
    fs::rename(&tmp, &path)?;

    debug!("Wrote {} ({} repositories)", path.display(), index.repositories.len());
    Ok(path)
}
