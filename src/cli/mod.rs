//! CLI module for codemap

mod args;

pub use args::{Args, Command};

use crate::config::{Config, OutputFormat};
use crate::scanner::{ProjectModel, Scanner};
use std::path::Path;
use std::process::ExitCode;

/// Run the CLI application
pub fn run() -> ExitCode {
    let args = Args::parse_args();

    match execute(args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute(args: Args) -> crate::error::Result<()> {
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
            // Load config file if it exists
            let mut cfg = if let Some(config_path) = &config {
                Config::load_or_default(config_path)
            } else {
                Config::load_or_default(Path::new("codemap.toml"))
            };

            // Merge CLI arguments (CLI takes precedence)
            cfg.merge_cli(
                Some(output),
                exclude,
                Some(format),
                max_depth,
                include_hidden,
            );

            if verbose {
                println!("Scanning: {}", path.display());
                println!("Output: {}", cfg.output.directory.display());
                println!("Format: {:?}", cfg.output.format);
                println!("Exclude: {:?}", cfg.scan.exclude);
                if let Some(depth) = cfg.scan.max_depth {
                    println!("Max depth: {}", depth);
                }
            }

            let output_format = cfg.output.format;
            let output_dir = cfg.output.directory.clone();
            let scanner = Scanner::new(cfg)?.with_progress(verbose);

            println!("Scanning project...");
            let model = scanner.scan(&path)?;

            println!(
                "Scan complete: {} files, {} modules, {} classes, {} functions",
                model.stats.total_files,
                model.modules.len(),
                model.stats.classes,
                model.stats.functions
            );
            if model.stats.skipped_files > 0 {
                println!("Skipped {} unparseable files", model.stats.skipped_files);
            }

            match output_format {
                OutputFormat::Summary => {
                    println!();
                    print_summary(&model);
                }
                OutputFormat::Json => {
                    let json = serde_json::to_string_pretty(&model)?;
                    let output_path = output_dir.join("codemap.json");
                    std::fs::create_dir_all(&output_dir)?;
                    std::fs::write(&output_path, json)?;
                    println!("JSON written to: {}", output_path.display());
                }
            }

            Ok(())
        }

        Command::Version => {
            println!("codemap {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn print_summary(model: &ProjectModel) {
    println!("Project: {}", model.name);
    println!(
        "Files: {} ({} directories, {} lines)",
        model.stats.total_files, model.stats.total_directories, model.stats.total_lines
    );
    println!(
        "Modules: {} ({} classes, {} functions, {} imports)",
        model.modules.len(),
        model.stats.classes,
        model.stats.functions,
        model.stats.imports
    );

    let metrics = &model.metrics;
    println!(
        "Graph: {} nodes, {} edges, density {:.3}, {}",
        metrics.node_count,
        metrics.edge_count,
        metrics.density,
        if metrics.is_acyclic {
            "acyclic"
        } else {
            "contains cycles"
        }
    );

    if !metrics.entry_points.is_empty() {
        println!("\nEntry points:");
        for module in &metrics.entry_points {
            println!("  {}", module);
        }
    }

    if !metrics.leaf_modules.is_empty() {
        println!("\nLeaf modules:");
        for module in &metrics.leaf_modules {
            println!("  {}", module);
        }
    }

    if !metrics.most_connected.is_empty() {
        println!("\nMost connected:");
        for (module, degree) in &metrics.most_connected {
            println!("  {} ({} connections)", module, degree);
        }
    }
}
