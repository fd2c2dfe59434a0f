// src/metadata/srcinfo.rs

//! .SRCINFO parser
//!
//! The file is a flat list of `key = value` lines. Everything before the
//! first `pkgname` line describes the base package; each `pkgname` line
//! opens the block of one output package. Line order is significant, so the
//! parser is a single forward pass.

use crate::error::{Error, Result};

/// Facts declared by one .SRCINFO file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SrcInfo {
    pub pkgbase: Option<String>,
    pub pkgver: Option<String>,
    pub pkgrel: Option<String>,
    pub epoch: Option<String>,
    pub architectures: Vec<String>,
    /// `depends` and `makedepends` names, version constraints stripped
    pub depends: Vec<String>,
    /// Base-level `provides`, inherited by every output package
    pub provides: Vec<String>,
    pub packages: Vec<SrcInfoPackage>,
}

/// One `pkgname` block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SrcInfoPackage {
    pub name: String,
    /// `provides` declared inside this block only
    pub provides: Vec<String>,
}

impl SrcInfo {
    /// Parse .SRCINFO content
    pub fn parse(content: &str) -> Result<Self> {
        let mut info = SrcInfo::default();

        for line in content.lines() {
            let line = line.trim();

            // Skip comments and empty lines
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();

            if key == "pkgname" {
                info.packages.push(SrcInfoPackage {
                    name: value.to_string(),
                    provides: Vec::new(),
                });
                continue;
            }

            if let Some(current) = info.packages.last_mut() {
                // Only aliases are taken from package blocks; dependencies
                // declared there do not affect the build order.
                if key == "provides" {
                    current.provides.push(strip_constraint(value).to_string());
                }
                continue;
            }

            match key {
                "pkgbase" => info.pkgbase = Some(value.to_string()),
                "pkgver" => info.pkgver = Some(value.to_string()),
                "pkgrel" => info.pkgrel = Some(value.to_string()),
                "epoch" => info.epoch = Some(value.to_string()),
                "arch" => info.architectures.push(value.to_string()),
                "depends" | "makedepends" => {
                    info.depends.push(strip_constraint(value).to_string())
                }
                "provides" => info.provides.push(strip_constraint(value).to_string()),
                _ => {} // Ignore keys that do not shape the graph
            }
        }

        info.validate()?;
        Ok(info)
    }

    fn validate(&self) -> Result<()> {
        if self.pkgbase.as_deref().is_none_or(str::is_empty) {
            return Err(Error::MetadataError("missing pkgbase".to_string()));
        }
        if self.pkgver.as_deref().is_none_or(str::is_empty) {
            return Err(Error::MetadataError("missing pkgver".to_string()));
        }
        if self.packages.is_empty() {
            return Err(Error::MetadataError("no pkgname declared".to_string()));
        }
        Ok(())
    }

    /// Full version string, `epoch:pkgver-pkgrel` with the optional parts omitted
    pub fn version(&self) -> Option<String> {
        let mut version = self.pkgver.clone()?;
        if let Some(rel) = &self.pkgrel {
            version = format!("{}-{}", version, rel);
        }
        if let Some(epoch) = &self.epoch {
            version = format!("{}:{}", epoch, version);
        }
        Some(version)
    }
}

/// Drop a version constraint (`foo>=1.0`, `foo=2`) from a dependency or provides entry
fn strip_constraint(value: &str) -> &str {
    match value.find(['<', '>', '=']) {
        Some(pos) => value[..pos].trim(),
        None => value,
    }
}
