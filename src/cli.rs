use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "pkgsec",
    about = "Inspect analysis types, build analysis requests and review verdicts",
    version
)]
pub struct Cli {
    /// Config file [default: ./.pkgsec/config.toml, fallback ~/.config/pkgsec/config.toml]
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Only print summary lines; no progress bars
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List every registered analysis type
    Types,

    /// Show the components of a type URN
    Decode {
        urn: String,
    },

    /// Build analysis requests from a JSON file (one object or an array)
    Build {
        file: PathBuf,

        /// Resolve missing versions and shasums from package registries;
        /// without it only requests pinning both are accepted
        #[arg(long)]
        online: bool,

        /// Output format
        #[arg(long, default_value = "terminal", value_name = "FORMAT")]
        format: OutputFormat,
    },

    /// Render a verdict file, optionally filtered with a JSONPath expression
    Verdicts {
        file: PathBuf,

        #[arg(long, value_name = "EXPR")]
        filter: Option<String>,

        /// Show low-severity verdicts too
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print random valid analysis requests as JSON lines
    Generate {
        #[arg(long, default_value_t = 10)]
        count: usize,

        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Probability of repeating an earlier request with a new id
        #[arg(long, default_value_t = 0.0)]
        reuse: f64,
    },

    /// Detect npm and PyPI projects in a directory
    Detect {
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Seal a type URN (plus extra fields) into a hex token
    Seal {
        urn: String,
        extra: Vec<String>,
    },

    /// Open a hex token produced by `seal`
    Open {
        token: String,
    },
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    Terminal,
    Json,
}
