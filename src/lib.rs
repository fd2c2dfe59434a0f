// src/lib.rs

//! pkgrepo - build farm and repository manager for PKGBUILD trees
//!
//! Tracks base packages found under a package source tree, resolves their
//! build dependencies (including virtual packages), decides when VCS
//! packages need rebuilding, drives chroot builds, and keeps per-architecture
//! repository databases consistent with what each repository publishes.
//!
//! # Architecture
//!
//! - Database-first: the dependency graph is the SQLite relation, not an
//!   in-memory structure kept between runs
//! - External tools (makepkg, devtools, repo-add, VCS clients) sit behind
//!   traits in [`tools`] so every rule can be exercised without them
//! - Repository rules run as part of the mutation that triggers them

pub mod build;
pub mod config;
pub mod context;
pub mod db;
mod error;
pub mod graph;
pub mod metadata;
pub mod repository;
pub mod scanner;
pub mod static_index;
pub mod tools;
pub mod vcs;

pub use build::{BuildOutcome, BuildQueue, BuildTask, TaskReport};
pub use config::Config;
pub use context::Context;
pub use error::{Error, Result};
pub use scanner::RefreshReport;
pub use tools::{BuildRequest, Builder, Indexer, SourceControl, SrcinfoGenerator, Toolchain};
