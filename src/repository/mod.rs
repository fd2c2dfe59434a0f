// src/repository/mod.rs

//! Repository management and consistency
//!
//! Every mutation of a repository goes through this module so the rules that
//! keep it consistent are applied as part of the mutation:
//! - creation and architecture changes create the on-disk directories
//! - multilib repositories are restricted to the multilib architecture
//! - adding packages pulls in their build dependencies
//! - removing packages drops them from every architecture's index

mod management;
mod membership;
mod publish;

pub use management::{
    create_repository, delete_repository, set_architectures, update_repository,
};
pub use membership::{add_packages, remove_packages};
pub use publish::{publish_artifact, unpublish_package};

use crate::db::models::Repository;
use crate::error::{Error, Result};
use rusqlite::Connection;

/// Look up a repository by name, failing when it does not exist
pub fn find_repository(conn: &Connection, name: &str) -> Result<Repository> {
    Repository::find_by_name(conn, name)?
        .ok_or_else(|| Error::NotFoundError(format!("Repository '{name}' not found")))
}
