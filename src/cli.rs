// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines the push, digest and delete subcommands and global flags.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "regkeep")]
#[command(about = "Push container images and remove their manifests from registries")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print only the final result
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit JSON lines instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to regkeep.yml discovery)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Push a local image through the image engine and print its digest
    Push {
        /// Image reference, e.g. registry.example.com/team/app:v1
        name: String,
    },

    /// Print the registry's current manifest digest for an image
    Digest {
        /// Image reference
        name: String,
    },

    /// Delete an image manifest from its registry by digest
    Delete {
        /// Image reference the manifest was pushed under
        name: String,

        /// Manifest digest recorded at push time
        #[arg(long)]
        digest: String,

        /// Leave the remote manifest in place
        #[arg(long)]
        keep_remote: bool,
    },
}
