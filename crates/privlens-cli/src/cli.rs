use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "privlens")]
#[command(about = "Find and remove privacy-sensitive metadata and text", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (default: platform config dir)
    #[arg(long, global = true, env = "PRIVLENS_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a file and print its privacy report
    Inspect {
        file: PathBuf,

        /// JSON tag list produced by an external metadata decoder
        #[arg(long)]
        tags: Option<PathBuf>,

        /// Declared media type (default: derived from the extension)
        #[arg(long)]
        media_type: Option<String>,

        /// Print every decoded tag
        #[arg(long)]
        show_tags: bool,
    },

    /// Remove selected tags from a JPEG
    Redact {
        file: PathBuf,

        /// Tag key to remove, e.g. GPS:GPSLatitude (repeatable)
        #[arg(long = "key", short = 'k', required = true)]
        keys: Vec<String>,

        /// JSON tag list produced by an external metadata decoder
        #[arg(long)]
        tags: Option<PathBuf>,

        #[arg(long)]
        media_type: Option<String>,

        /// Output path (default: <stem>_clean<ext> next to the input)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Strip all metadata from a JPEG
    Clean {
        file: PathBuf,

        #[arg(long)]
        media_type: Option<String>,

        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// List the detection rules
    Patterns,
}
