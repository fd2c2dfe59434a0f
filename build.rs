// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: configuration file
fn config_arg() -> Arg {
    Arg::new("config")
        .short('c')
        .long("config")
        .value_name("PATH")
        .default_value("/etc/pkgrepo/pkgrepo.toml")
        .global(true)
        .help("Path to the configuration file")
}

/// Common argument: force a rebuild
fn force_arg() -> Arg {
    Arg::new("force")
        .short('f')
        .long("force")
        .action(ArgAction::SetTrue)
        .help("Rebuild even when a matching build is recorded")
}

fn repo_name_arg() -> Arg {
    Arg::new("name").required(true).help("Repository name")
}

fn build_repo_cli() -> Command {
    Command::new("repo")
        .about("Repository management")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .about("Create a repository")
                .arg(repo_name_arg())
                .arg(
                    Arg::new("target")
                        .short('t')
                        .long("target")
                        .default_value("extra")
                        .help("Target track: extra, testing or staging"),
                )
                .arg(Arg::new("description").short('d').long("description").help("Free-form description"))
                .arg(
                    Arg::new("multilib")
                        .long("multilib")
                        .action(ArgAction::SetTrue)
                        .help("Multilib repository (single architecture)"),
                )
                .arg(
                    Arg::new("arch")
                        .short('a')
                        .long("arch")
                        .action(ArgAction::Append)
                        .help("Architectures to carry (repeatable)"),
                ),
        )
        .subcommand(Command::new("list").about("List repositories"))
        .subcommand(
            Command::new("show")
                .about("Show a repository with its architectures and packages")
                .arg(repo_name_arg()),
        )
        .subcommand(Command::new("remove").about("Delete a repository").arg(repo_name_arg()))
        .subcommand(
            Command::new("update")
                .about("Change repository settings")
                .arg(repo_name_arg())
                .arg(Arg::new("target").short('t').long("target").help("New target track"))
                .arg(Arg::new("description").short('d').long("description").help("New description"))
                .arg(Arg::new("multilib").long("multilib").help("Turn multilib on or off"))
                .arg(Arg::new("rename").long("rename").help("Rename the repository")),
        )
        .subcommand(
            Command::new("arch")
                .about("Replace the architecture set of a repository")
                .arg(repo_name_arg())
                .arg(Arg::new("architectures").required(true).num_args(1..)),
        )
        .subcommand(
            Command::new("available")
                .about("List packages that can be added to a repository")
                .arg(repo_name_arg()),
        )
        .subcommand(
            Command::new("add-package")
                .about("Publish packages (and their build dependencies) in a repository")
                .arg(repo_name_arg())
                .arg(Arg::new("packages").required(true).num_args(1..)),
        )
        .subcommand(
            Command::new("remove-package")
                .about("Withdraw packages from a repository")
                .arg(repo_name_arg())
                .arg(Arg::new("packages").required(true).num_args(1..)),
        )
}

fn build_cli() -> Command {
    Command::new("pkgrepo")
        .version(env!("CARGO_PKG_VERSION"))
        .author("pkgrepo Contributors")
        .about("Build farm and repository manager for PKGBUILD trees")
        .subcommand_required(false)
        .arg(config_arg())
        .subcommand(Command::new("init").about("Initialize the pkgrepo database"))
        .subcommand(
            Command::new("refresh")
                .about("Scan the package tree and refresh base package metadata")
                .arg(
                    Arg::new("build")
                        .long("build")
                        .action(ArgAction::SetTrue)
                        .help("Queue builds for every repository afterwards"),
                )
                .arg(force_arg()),
        )
        .subcommand(build_repo_cli())
        .subcommand(
            Command::new("build")
                .about("Build the packages of a repository, or one package in it")
                .arg(Arg::new("repository").required(true).help("Repository name"))
                .arg(Arg::new("package").help("Package name (builds the whole repository if omitted)"))
                .arg(force_arg()),
        )
        .subcommand(Command::new("build-all").about("Build every repository").arg(force_arg()))
        .subcommand(Command::new("list").about("List base packages and their build state"))
        .subcommand(
            Command::new("history")
                .about("Show the build history of a base package")
                .arg(Arg::new("name").required(true).help("Base package name (pkgbase)")),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(["bash", "zsh", "fish", "powershell", "elvish"])
                        .help("Shell type"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Create man directory - use CARGO_MANIFEST_DIR which is always set by cargo
    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();
    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("pkgrepo.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
