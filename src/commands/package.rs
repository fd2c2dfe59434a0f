// src/commands/package.rs
//! Base package queries (list, history)

use super::load_context;
use anyhow::{Result, anyhow};
use pkgrepo::db::models::{Architecture, BasePackage, Build};

fn state(base: &BasePackage) -> &'static str {
    if base.building {
        "building"
    } else if base.builds {
        "ok"
    } else {
        "-"
    }
}

/// List base packages with their packages and build state
pub fn cmd_list(config_path: &str) -> Result<()> {
    let ctx = load_context(config_path)?;
    let conn = ctx.open_db()?;

    let bases = BasePackage::list_all(&conn)?;
    if bases.is_empty() {
        println!("No base packages registered");
        return Ok(());
    }

    for base in bases {
        let id = base.require_id()?;
        let archs: Vec<String> = BasePackage::architectures(&conn, id)?
            .into_iter()
            .map(|a| a.name)
            .collect();
        println!(
            "{} {} [{}] {}",
            base,
            base.version.as_deref().unwrap_or("?"),
            archs.join(" "),
            state(&base)
        );

        for pkg in BasePackage::packages(&conn, id)? {
            if pkg.is_virtual {
                continue;
            }
            println!("    {}", pkg.name);
        }
    }
    Ok(())
}

/// Show the build history of a base package
pub fn cmd_history(config_path: &str, name: &str) -> Result<()> {
    let ctx = load_context(config_path)?;
    let conn = ctx.open_db()?;

    let base = BasePackage::find_by_name(&conn, name)?
        .ok_or_else(|| anyhow!("Base package '{}' not found", name))?;
    let builds = Build::list_for_base_package(&conn, base.require_id()?)?;

    println!("{} ({})", base, state(&base));
    if builds.is_empty() {
        println!("  No builds recorded");
        return Ok(());
    }

    for build in builds {
        let arch = Architecture::find_by_id(&conn, build.architecture_id)?
            .map(|a| a.name)
            .unwrap_or_else(|| "?".to_string());
        println!(
            "  {} {} {} {}",
            build.date.as_deref().unwrap_or("-"),
            build.version,
            arch,
            build.target.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}
