//! Cococurate: curation of COCO-style object-detection datasets.
//!
//! A dataset is a root directory with one subdirectory per split, each
//! holding its images and one annotation collection. Cococurate filters,
//! partitions and merges those collections and checks that the result is
//! consistent with itself and with the images on disk.
//!
//! # Modules
//!
//! - [`collection`]: the collection model and its JSON storage
//! - [`filter`], [`partition`], [`merge`]: the transformations
//! - [`validation`]: consistency checks and their report
//! - [`sync`]: image file copy, delete and listing
//! - [`pipeline`]: per-split orchestration in dry-run or apply mode
//! - [`config`]: curation settings

pub mod collection;
pub mod config;
pub mod error;
pub mod filter;
pub mod merge;
pub mod partition;
pub mod pipeline;
pub mod sync;
pub mod validation;

use std::fmt;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

pub use config::CurateConfig;
pub use error::CurateError;

use filter::FilterStats;
use merge::{prefix_rename, MergeOptions, MergeStats};
use partition::PartitionStats;
use pipeline::{Mode, SplitOutcome};

/// The cococurate CLI application.
#[derive(Parser)]
#[command(name = "cococurate")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Dataset root holding one directory per split.
    #[arg(long, global = true, env = "COCOCURATE_ROOT", value_name = "DIR")]
    root: Option<PathBuf>,

    /// YAML settings file; flags override its values.
    #[arg(long, global = true, env = "COCOCURATE_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Splits to process, comma separated.
    #[arg(long, global = true, value_delimiter = ',', value_name = "SPLIT")]
    splits: Option<Vec<String>>,

    /// Version tag used in backup file names.
    #[arg(long, global = true, value_name = "TAG")]
    backup_tag: Option<String>,

    /// Report format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Drop annotations below a size threshold and images left empty.
    Filter(FilterArgs),
    /// Move every image of one source, with its annotations, to another root.
    Extract(ExtractArgs),
    /// Merge another dataset's splits into this one.
    Merge(MergeArgs),
    /// Check every split for consistency.
    Validate(ValidateArgs),
}

#[derive(clap::Args)]
struct FilterArgs {
    /// Smallest annotation area to keep, in square pixels.
    #[arg(long)]
    min_area: Option<f64>,

    /// Write changes instead of only reporting them.
    #[arg(long)]
    apply: bool,
}

#[derive(clap::Args)]
struct ExtractArgs {
    /// Provenance tag of the images to extract.
    #[arg(long, default_value = "rsud20k")]
    source: String,

    /// Root that receives the extracted splits.
    #[arg(long, value_name = "DIR")]
    output_root: PathBuf,

    /// Write changes instead of only reporting them.
    #[arg(long)]
    apply: bool,
}

#[derive(clap::Args)]
struct MergeArgs {
    /// Root of the dataset to merge in, with the same split layout.
    #[arg(long, value_name = "DIR")]
    incoming: PathBuf,

    /// Provenance tag stamped on merged images.
    #[arg(long, default_value = "nuimages")]
    source_tag: String,

    /// File name prefix for merged images; defaults to `<source-tag>_`.
    #[arg(long)]
    prefix: Option<String>,

    /// Keep the base categories even if the incoming ones differ.
    #[arg(long)]
    allow_category_mismatch: bool,

    /// Write changes instead of only reporting them.
    #[arg(long)]
    apply: bool,
}

#[derive(clap::Args)]
struct ValidateArgs {
    /// Smallest acceptable annotation area, in square pixels.
    #[arg(long)]
    min_area: Option<f64>,

    /// Missing files to list by name before summarizing.
    #[arg(long)]
    max_listed_missing: Option<usize>,

    /// Treat warnings as errors (exit non-zero if any warnings).
    #[arg(long)]
    strict: bool,
}

/// Run the cococurate CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), CurateError> {
    let cli = Cli::parse();
    let mut config = load_config(&cli)?;
    let output = cli.output;

    match cli.command {
        Commands::Filter(args) => {
            if let Some(min_area) = args.min_area {
                config.min_area = min_area;
            }
            config.validate()?;
            let mode = run_mode(args.apply);
            let outcomes = pipeline::run_filter(&config, mode)?;
            let mut total = FilterStats::default();
            for outcome in &outcomes {
                total.accumulate(&outcome.stats);
            }
            print_outcomes(&outcomes, &total, mode, output)
        }
        Commands::Extract(args) => {
            config.validate()?;
            let mode = run_mode(args.apply);
            let outcomes = pipeline::run_extract(&config, &args.source, &args.output_root, mode)?;
            let mut total = PartitionStats::default();
            for outcome in &outcomes {
                total.accumulate(&outcome.stats);
            }
            print_outcomes(&outcomes, &total, mode, output)
        }
        Commands::Merge(args) => {
            config.validate()?;
            let mode = run_mode(args.apply);
            let opts = MergeOptions {
                source_tag: args.source_tag,
                require_matching_categories: !args.allow_category_mismatch,
            };
            let prefix = args
                .prefix
                .unwrap_or_else(|| format!("{}_", opts.source_tag));
            let outcomes =
                pipeline::run_merge(&config, &args.incoming, &opts, prefix_rename(prefix), mode)?;
            let mut total = MergeStats::default();
            for outcome in &outcomes {
                total.accumulate(&outcome.stats);
            }
            print_outcomes(&outcomes, &total, mode, output)
        }
        Commands::Validate(args) => {
            if let Some(min_area) = args.min_area {
                config.min_area = min_area;
            }
            if let Some(max) = args.max_listed_missing {
                config.max_listed_missing = max;
            }
            config.validate()?;
            run_validate(&config, args.strict, output)
        }
    }
}

/// Settings file (if any), then global flags.
fn load_config(cli: &Cli) -> Result<CurateConfig, CurateError> {
    let mut config = match &cli.config {
        Some(path) => CurateConfig::from_yaml_file(path)?,
        None => CurateConfig::default(),
    };

    if let Some(root) = &cli.root {
        config.root = root.clone();
    }
    if let Some(splits) = &cli.splits {
        config.splits = splits.clone();
    }
    if let Some(tag) = &cli.backup_tag {
        config.backup_tag = tag.clone();
    }

    Ok(config)
}

fn run_mode(apply: bool) -> Mode {
    if apply {
        Mode::Apply
    } else {
        Mode::DryRun
    }
}

#[derive(Serialize)]
struct RunReport<'a, S> {
    mode: Mode,
    splits: &'a [SplitOutcome<S>],
    total: &'a S,
}

fn print_outcomes<S>(
    outcomes: &[SplitOutcome<S>],
    total: &S,
    mode: Mode,
    output: OutputFormat,
) -> Result<(), CurateError>
where
    S: Serialize + fmt::Display,
{
    match output {
        OutputFormat::Json => {
            let report = RunReport {
                mode,
                splits: outcomes,
                total,
            };
            let json =
                serde_json::to_string_pretty(&report).map_err(CurateError::ReportSerialize)?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            for outcome in outcomes {
                println!("{}", outcome);
            }
            if outcomes.len() > 1 {
                println!("[total]");
                println!("{}", total);
            }
            if mode == Mode::DryRun {
                println!("Dry run: re-run with --apply to write changes.");
            }
        }
    }
    Ok(())
}

fn run_validate(
    config: &CurateConfig,
    strict: bool,
    output: OutputFormat,
) -> Result<(), CurateError> {
    let results = pipeline::run_validate(config)?;

    match output {
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(&results).map_err(CurateError::ReportSerialize)?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            for result in &results {
                print!("{}", result);
            }
        }
    }

    let error_count: usize = results.iter().map(|r| r.error_count).sum();
    let warning_count: usize = results.iter().map(|r| r.warning_count).sum();

    if error_count > 0 || (strict && warning_count > 0) {
        Err(CurateError::ValidationFailed {
            error_count,
            warning_count,
        })
    } else {
        Ok(())
    }
}
