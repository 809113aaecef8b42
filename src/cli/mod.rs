//! CLI argument definitions

use crate::diagnostics::ParseError;
use crate::parser::ParseOptions;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use thiserror::Error;

/// Check and inspect nginx-style configuration files
#[derive(Parser)]
#[command(name = "scopeconf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output
    #[arg(long, value_enum, default_value = "auto", global = true)]
    pub color: ColorChoice,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse files and bind their server blocks, reporting every error
    Check(CheckArgs),

    /// Print a file with all defines and includes resolved
    Dump(DumpArgs),
}

/// Parser settings shared by the commands
#[derive(clap::Args)]
pub struct SourceArgs {
    /// Directory relative include paths are resolved against
    #[arg(long)]
    pub include_root: Option<PathBuf>,

    /// Treat `*`, `?` and `[` in include paths literally
    #[arg(long)]
    pub no_glob: bool,
}

impl SourceArgs {
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            include_root: self.include_root.clone(),
            expand_globs: !self.no_glob,
        }
    }
}

#[derive(clap::Args)]
pub struct CheckArgs {
    /// Configuration files, parsed by one parser in order
    #[arg(required = true)]
    pub files: Vec<String>,

    #[command(flatten)]
    pub source: SourceArgs,

    /// Warn about directives no server or location used
    #[arg(long)]
    pub warn_unused: bool,
}

#[derive(clap::Args)]
pub struct DumpArgs {
    /// Configuration file
    pub file: String,

    #[command(flatten)]
    pub source: SourceArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Leave out `# via` comments on included directives
    #[arg(long)]
    pub no_provenance: bool,
}

#[derive(ValueEnum, Clone, Copy, Default)]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    /// Apply the choice to terminal output
    pub fn apply(self) {
        match self {
            ColorChoice::Always => colored::control::set_override(true),
            ColorChoice::Never => colored::control::set_override(false),
            ColorChoice::Auto => {}
        }
    }
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error("{failed} of {total} file(s) failed to load")]
    CheckFailed { failed: usize, total: usize },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_check_flags_map_to_options() {
        let cli = Cli::parse_from([
            "scopeconf",
            "-vv",
            "check",
            "a.conf",
            "b.conf",
            "--include-root",
            "/etc/site",
            "--no-glob",
            "--warn-unused",
        ]);
        assert_eq!(cli.verbose, 2);
        let Commands::Check(args) = cli.command else {
            panic!("expected check");
        };
        assert_eq!(args.files, vec!["a.conf", "b.conf"]);
        assert!(args.warn_unused);
        let options = args.source.parse_options();
        assert_eq!(options.include_root, Some(PathBuf::from("/etc/site")));
        assert!(!options.expand_globs);
    }

    #[test]
    fn test_dump_defaults() {
        let cli = Cli::parse_from(["scopeconf", "dump", "site.conf"]);
        let Commands::Dump(args) = cli.command else {
            panic!("expected dump");
        };
        assert_eq!(args.file, "site.conf");
        assert!(!args.json);
        assert!(args.source.parse_options().expand_globs);
    }
}
