use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "boil",
    version,
    about = "Boil - generate project boilerplate from a one-line description",
    long_about = "Boil turns a natural-language project description into a complete project: a file tree, source files, and optionally a git repository, .gitignore, README and Dockerfile."
)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace; warnings only by default)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate one or more projects
    #[command(visible_alias = "generate", about = "Generate projects from descriptions")]
    Gen(GenerateArgs),

    /// Show the effective configuration
    #[command(about = "Print the effective configuration as TOML")]
    Config,
}

#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// What to build, e.g. "a REST API for a todo list in Go"
    #[arg(required_unless_present = "file", conflicts_with = "file")]
    pub description: Option<String>,

    /// TOML file with one [[request]] table per project
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Project name (derived from the description when omitted)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Model to generate with
    #[arg(short, long)]
    pub model: Option<String>,

    /// Initialize a git repository
    #[arg(long)]
    pub git: bool,

    /// Generate a .gitignore
    #[arg(long)]
    pub gitignore: bool,

    /// Generate a README.md
    #[arg(long)]
    pub readme: bool,

    /// Generate a Dockerfile
    #[arg(long)]
    pub dockerfile: bool,

    /// Directory the projects are written into
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write a .zip archive per project instead of a directory
    #[arg(long)]
    pub zip: bool,

    /// Number of concurrent workers
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Print the planned output paths and exit
    #[arg(long)]
    pub dry_run: bool,

    /// Emit progress and results as JSON lines instead of progress bars
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_gen() {
        let cli = Cli::parse_from(["boil", "-v", "gen", "a todo api", "--readme", "--zip", "-w", "2"]);
        match cli.command {
            Commands::Gen(args) => {
                assert_eq!(args.description.as_deref(), Some("a todo api"));
                assert!(args.readme);
                assert!(args.zip);
                assert_eq!(args.workers, Some(2));
            }
            Commands::Config => panic!("expected gen"),
        }
        assert_eq!(cli.verbose, 1);
    }

    #[test]
    fn test_description_or_file_required() {
        assert!(Cli::try_parse_from(["boil", "gen"]).is_err());
        assert!(Cli::try_parse_from(["boil", "gen", "x", "--file", "r.toml"]).is_err());
        assert!(Cli::try_parse_from(["boil", "generate", "--file", "r.toml"]).is_ok());
    }
}
