// src/main.rs

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands, RepoCommands};

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_str();

    match cli.command {
        Some(Commands::Init) => commands::cmd_init(config),

        Some(Commands::Refresh { build, force }) => commands::cmd_refresh(config, build, force),

        Some(Commands::Repo(repo_cmd)) => match repo_cmd {
            RepoCommands::Add {
                name,
                target,
                description,
                multilib,
                architectures,
            } => commands::cmd_repo_add(
                config,
                &name,
                &target,
                &description,
                multilib,
                &architectures,
            ),
            RepoCommands::List => commands::cmd_repo_list(config),
            RepoCommands::Show { name } => commands::cmd_repo_show(config, &name),
            RepoCommands::Remove { name } => commands::cmd_repo_remove(config, &name),
            RepoCommands::Update {
                name,
                target,
                description,
                multilib,
                rename,
            } => commands::cmd_repo_update(
                config,
                &name,
                target.as_deref(),
                description.as_deref(),
                multilib,
                rename.as_deref(),
            ),
            RepoCommands::Arch {
                name,
                architectures,
            } => commands::cmd_repo_arch(config, &name, &architectures),
            RepoCommands::Available { name } => commands::cmd_repo_available(config, &name),
            RepoCommands::AddPackage { name, packages } => {
                commands::cmd_repo_add_package(config, &name, &packages)
            }
            RepoCommands::RemovePackage { name, packages } => {
                commands::cmd_repo_remove_package(config, &name, &packages)
            }
        },

        Some(Commands::Build {
            repository,
            package,
            force,
        }) => commands::cmd_build(config, &repository, package.as_deref(), force),

        Some(Commands::BuildAll { force }) => commands::cmd_build_all(config, force),

        Some(Commands::List) => commands::cmd_list(config),

        Some(Commands::History { name }) => commands::cmd_history(config, &name),

        Some(Commands::Completions { shell }) => commands::cmd_completions(shell),

        None => {
            // No command provided, show help
            println!("pkgrepo v{}", env!("CARGO_PKG_VERSION"));
            println!("Run 'pkgrepo --help' for usage information");
            Ok(())
        }
    }
}
