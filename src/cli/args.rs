//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Map the structure and dependencies of a codebase
#[derive(Parser, Debug)]
#[command(name = "codemap")]
#[command(about = "Map the structure and dependencies of a codebase")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan a project and report its structure and dependency graph
    Scan {
        /// Path to the project root
        path: PathBuf,

        /// Output directory for generated files
        #[arg(short, long, default_value = "./codemap-out")]
        output: PathBuf,

        /// Directory names to exclude (can be repeated)
        #[arg(long)]
        exclude: Vec<String>,

        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format (summary, json)
        #[arg(long, default_value = "summary")]
        format: String,

        /// Maximum traversal depth below the root
        #[arg(long)]
        max_depth: Option<usize>,

        /// Include hidden files and directories
        #[arg(long)]
        include_hidden: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show version information
    Version,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_defaults() {
        let args = Args::try_parse_from(["codemap", "scan", "./src"]).unwrap();
        match args.command {
            Command::Scan {
                path,
                output,
                format,
                max_depth,
                include_hidden,
                verbose,
                ..
            } => {
                assert_eq!(path, PathBuf::from("./src"));
                assert_eq!(output, PathBuf::from("./codemap-out"));
                assert_eq!(format, "summary");
                assert_eq!(max_depth, None);
                assert!(!include_hidden);
                assert!(!verbose);
            }
            _ => panic!("Expected Scan command"),
        }
    }

    #[test]
    fn test_scan_with_options() {
        let args = Args::try_parse_from([
            "codemap",
            "scan",
            "./project",
            "--output",
            "/tmp/map",
            "--exclude",
            "build",
            "--exclude",
            "dist",
            "--config",
            "custom.toml",
            "--format",
            "json",
            "--max-depth",
            "10",
            "--include-hidden",
            "--verbose",
        ])
        .unwrap();

        match args.command {
            Command::Scan {
                path,
                output,
                exclude,
                config,
                format,
                max_depth,
                include_hidden,
                verbose,
            } => {
                assert_eq!(path, PathBuf::from("./project"));
                assert_eq!(output, PathBuf::from("/tmp/map"));
                assert_eq!(exclude, vec!["build".to_string(), "dist".to_string()]);
                assert_eq!(config, Some(PathBuf::from("custom.toml")));
                assert_eq!(format, "json");
                assert_eq!(max_depth, Some(10));
                assert!(include_hidden);
                assert!(verbose);
            }
            _ => panic!("Expected Scan command"),
        }
    }

    #[test]
    fn test_version_command() {
        let args = Args::try_parse_from(["codemap", "version"]).unwrap();
        assert!(matches!(args.command, Command::Version));
    }

    #[test]
    fn test_scan_requires_path() {
        assert!(Args::try_parse_from(["codemap", "scan"]).is_err());
    }
}
