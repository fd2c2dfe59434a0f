// src/cli/repo.rs
//! Repository management commands

use clap::Subcommand;

#[derive(Subcommand)]
pub enum RepoCommands {
    /// Create a repository
    Add {
        /// Repository name
        name: String,

        /// Target track: extra, testing or staging
        #[arg(short, long, default_value = "extra")]
        target: String,

        /// Free-form description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Multilib repository (single architecture)
        #[arg(long)]
        multilib: bool,

        /// Architectures to carry (repeatable)
        #[arg(short, long = "arch", value_name = "ARCH")]
        architectures: Vec<String>,
    },

    /// List repositories
    List,

    /// Show a repository with its architectures and packages
    Show {
        /// Repository name
        name: String,
    },

    /// Delete a repository
    Remove {
        /// Repository name
        name: String,
    },

    /// Change repository settings
    Update {
        /// Repository name
        name: String,

        /// New target track
        #[arg(short, long)]
        target: Option<String>,

        /// New description
        #[arg(short, long)]
        description: Option<String>,

        /// Turn multilib on or off
        #[arg(long)]
        multilib: Option<bool>,

        /// Rename the repository
        #[arg(long)]
        rename: Option<String>,
    },

    /// Replace the architecture set of a repository
    Arch {
        /// Repository name
        name: String,

        /// Architectures to carry
        #[arg(required = true)]
        architectures: Vec<String>,
    },

    /// List packages that can be added to a repository
    Available {
        /// Repository name
        name: String,
    },

    /// Publish packages (and their build dependencies) in a repository
    AddPackage {
        /// Repository name
        name: String,

        /// Package names
        #[arg(required = true)]
        packages: Vec<String>,
    },

    /// Withdraw packages from a repository
    RemovePackage {
        /// Repository name
        name: String,

        /// Package names
        #[arg(required = true)]
        packages: Vec<String>,
    },
}
