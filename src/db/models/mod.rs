// src/db/models/mod.rs

//! Data models for pkgrepo database entities
//!
//! This module defines Rust structs that correspond to database tables
//! and provides methods for creating, reading, updating, and deleting records.

mod architecture;
mod base_package;
mod build_record;
mod package;
mod repository;

pub use architecture::{ANY_ARCH, Architecture};
pub use base_package::{BasePackage, PKGBUILD, SRCINFO, TRUNK};
pub use build_record::Build;
pub use package::Package;
pub use repository::{Repository, Target};
