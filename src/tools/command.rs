// src/tools/command.rs

//! Subprocess implementations of the tool traits

use super::{BuildRequest, Builder, Indexer, SrcinfoGenerator};
use crate::db::models::SRCINFO;
use crate::error::{Error, Result};
use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, info, warn};

/// Resolve a program on PATH
fn locate(program: &str) -> Result<std::path::PathBuf> {
    which::which(program).map_err(|_| Error::ToolNotFound(program.to_string()))
}

/// Writes the stdout of a command (default `makepkg --printsrcinfo`) to .SRCINFO
#[derive(Debug, Clone)]
pub struct CommandSrcinfo {
    command: Vec<String>,
}

impl CommandSrcinfo {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

impl SrcinfoGenerator for CommandSrcinfo {
    fn generate(&self, directory: &Path) -> Result<()> {
        let Some((program, args)) = self.command.split_first() else {
            return Err(Error::ConfigError("srcinfo command is empty".to_string()));
        };
        let program = locate(program)?;

        debug!("Generating {} in {}", SRCINFO, directory.display());
        let output = Command::new(&program)
            .args(args)
            .current_dir(directory)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Error::IoError(format!("Failed to run {}: {}", program.display(), e)))?;

        if !output.status.success() {
            return Err(Error::MetadataError(format!(
                "{} failed in {}: {}",
                program.display(),
                directory.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        if output.stdout.is_empty() {
            return Err(Error::MetadataError(format!(
                "{} printed nothing in {}",
                program.display(),
                directory.display()
            )));
        }

        fs::write(directory.join(SRCINFO), &output.stdout)?;
        Ok(())
    }
}

/// Runs a devtools chroot build helper
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    sudo: bool,
    debug: bool,
}

impl CommandBuilder {
    pub fn new(sudo: bool, debug: bool) -> Self {
        Self { sudo, debug }
    }

    /// Program and arguments for a request
    pub fn command_line(&self, request: &BuildRequest) -> Vec<String> {
        let mut line = Vec::new();
        if self.sudo {
            line.push("sudo".to_string());
        }
        line.push(request.command.clone());
        if !request.dependencies.is_empty() {
            line.push("--".to_string());
            for dep in &request.dependencies {
                line.push("-I".to_string());
                line.push(dep.display().to_string());
            }
        }
        line
    }
}

impl Builder for CommandBuilder {
    fn build(&self, request: &BuildRequest) -> Result<bool> {
        let line = self.command_line(request);
        let Some((program, args)) = line.split_first() else {
            return Err(Error::InvalidArgument("empty build command".to_string()));
        };
        let program = locate(program)?;

        info!("Running {} in {}", line.join(" "), request.directory.display());
        let mut cmd = Command::new(&program);
        cmd.args(args)
            .current_dir(&request.directory)
            .stdin(Stdio::null());
        if !self.debug {
            cmd.stdout(Stdio::null()).stderr(Stdio::null());
        }

        let status = cmd
            .status()
            .map_err(|e| Error::IoError(format!("Failed to run {}: {}", program.display(), e)))?;

        if !status.success() {
            warn!("{} exited with {}", request.command, status);
        }
        Ok(status.success())
    }
}

/// Runs `repo-add` / `repo-remove`
#[derive(Debug, Clone)]
pub struct CommandIndexer {
    add_tool: String,
    remove_tool: String,
}

impl CommandIndexer {
    pub fn new(add_tool: String, remove_tool: String) -> Self {
        Self {
            add_tool,
            remove_tool,
        }
    }

    fn run(&self, tool: &str, directory: &Path, args: &[&str]) -> Result<bool> {
        let program = locate(tool)?;
        debug!("Running {} {:?} in {}", tool, args, directory.display());

        let output = Command::new(&program)
            .args(args)
            .current_dir(directory)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Error::IoError(format!("Failed to run {}: {}", tool, e)))?;

        if !output.status.success() {
            warn!(
                "{} failed in {}: {}",
                tool,
                directory.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(output.status.success())
    }
}

impl Indexer for CommandIndexer {
    fn add(&self, directory: &Path, db_filename: &str, artifact: &str, delta: bool) -> Result<bool> {
        let mut args = Vec::new();
        if delta {
            args.push("-d");
        }
        args.push(db_filename);
        args.push(artifact);
        self.run(&self.add_tool, directory, &args)
    }

    fn remove(&self, directory: &Path, db_filename: &str, package_name: &str) -> Result<bool> {
        self.run(&self.remove_tool, directory, &[db_filename, package_name])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_builder_command_line() {
        let request = BuildRequest {
            directory: PathBuf::from("/pkgs/foo"),
            command: "extra-x86_64-build".to_string(),
            dependencies: vec![PathBuf::from("/pkgs/bar/bar-1-1-any.pkg.tar.xz")],
        };

        let line = CommandBuilder::new(true, false).command_line(&request);
        assert_eq!(
            line,
            vec![
                "sudo",
                "extra-x86_64-build",
                "--",
                "-I",
                "/pkgs/bar/bar-1-1-any.pkg.tar.xz"
            ]
        );
    }

    #[test]
    fn test_builder_command_line_without_dependencies() {
        let request = BuildRequest {
            directory: PathBuf::from("/pkgs/foo"),
            command: "multilib-testing-build".to_string(),
            dependencies: Vec::new(),
        };

        let line = CommandBuilder::new(false, false).command_line(&request);
        assert_eq!(line, vec!["multilib-testing-build"]);
    }

    #[test]
    fn test_missing_tool_is_reported() {
        let indexer = CommandIndexer::new(
            "pkgrepo-no-such-tool".to_string(),
            "pkgrepo-no-such-tool".to_string(),
        );
        let dir = tempfile::tempdir().unwrap();
        let result = indexer.remove(dir.path(), "test.db.tar.gz", "foo");
        assert!(matches!(result, Err(Error::ToolNotFound(_))));
    }
}
