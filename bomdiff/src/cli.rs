use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "bomdiff")]
#[command(about = "Compare flat and structured bill-of-materials exports")]
pub struct Cli {
    /// Log loading and comparison progress to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,
    /// Settings file. Keys it sets replace the built-in ones.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Equivalent items table, one group of interchangeable part numbers per
    /// row. Defaults to equivalent_items.csv next to --config, if present.
    #[arg(long, global = true)]
    pub equivalents: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Compare two BOM exports and show differences.
    Diff(DiffArgs),
    /// Show the items or assembly tree of a single BOM export.
    Inspect(InspectArgs),
    /// Join two structured BOMs into one tree and write it as CSV.
    Concat(ConcatArgs),
}

#[derive(Parser, Debug)]
pub struct DiffArgs {
    pub left: PathBuf,
    pub right: PathBuf,
    /// Dialect of the left export.
    #[arg(long, default_value = "generic")]
    pub left_type: String,
    /// Dialect of the right export.
    #[arg(long, default_value = "generic")]
    pub right_type: String,
    /// Compare assembly trees instead of flat lists.
    #[arg(long)]
    pub structured: bool,
    /// Also list matched items without changes.
    #[arg(long)]
    pub show_common: bool,
    /// Extra categories (name or code) left out of the comparison.
    #[arg(long = "ignore-category")]
    pub ignore_categories: Vec<String>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    /// Only print match counts.
    #[arg(long)]
    pub summary: bool,
    /// Write the report to a file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct InspectArgs {
    pub file: PathBuf,
    /// Dialect of the export.
    #[arg(long = "type", default_value = "generic")]
    pub dialect: String,
    /// Deepest tree level shown; 0 shows top-level entries only.
    #[arg(long, default_value_t = 3)]
    pub depth: usize,
    /// Read the export as a flat list.
    #[arg(long, conflicts_with = "flattened")]
    pub flat: bool,
    /// Show every distinct item once with its total quantity.
    #[arg(long)]
    pub flattened: bool,
    #[arg(long, value_enum, default_value_t = InspectFormat::Text)]
    pub format: InspectFormat,
}

#[derive(Parser, Debug)]
pub struct ConcatArgs {
    pub first: PathBuf,
    pub second: PathBuf,
    /// Dialect of both exports.
    #[arg(long = "type", default_value = "generic")]
    pub dialect: String,
    /// Output CSV path.
    #[arg(short, long)]
    pub output: PathBuf,
    /// Write the flattened view instead of the joined tree.
    #[arg(long)]
    pub flattened: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Yaml,
    Csv,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
pub enum InspectFormat {
    Text,
    Json,
}
