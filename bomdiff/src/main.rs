use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bom_diff_core::format::{
    format_json, format_text, format_tree_text, nested_flat, nested_tree, table_flat, table_tree,
    JsonReport, NestedReport, TextOptions,
};
use bom_diff_core::{EquivalenceGroups, StructuredBom};
use bomdiff::dialects::DialectRegistry;
use bomdiff::inspect::{render_flattened, render_items, render_tree};
use bomdiff::report::{render_summary, render_text, render_tree_text};
use bomdiff::settings::Settings;
use bomdiff::source::{load_flat, load_structured, read_equivalents};
use clap::Parser;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;
mod output;
mod path_guard;

use cli::{Cli, Command, ConcatArgs, DiffArgs, InspectArgs, InspectFormat, OutputFormat};

/// Equivalence table looked up next to a settings file.
const EQUIVALENTS_FILE: &str = "equivalent_items.csv";

/// Changed attributes left out of the top-level assembly report.
const TOP_LEVEL_SKIP: [&str; 1] = ["revision"];

const TOP_LEVEL_TITLE: &str = "==== Top Level Assemblies ====";

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = Settings::resolve(cli.config.as_deref())?;
    info!(settings = settings.source(), "loaded settings");
    let groups = load_equivalents(cli.equivalents.as_deref(), cli.config.as_deref())?;
    let registry = DialectRegistry::from_settings(&settings, &groups)?;

    match cli.command {
        Command::Diff(args) => run_diff(args, &settings, &registry),
        Command::Inspect(args) => run_inspect(args, &settings, &registry),
        Command::Concat(args) => run_concat(args, &registry),
    }
}

fn init_tracing(verbose: bool) {
    // Reports go to stdout; logs stay on stderr.
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

fn load_equivalents(explicit: Option<&Path>, config: Option<&Path>) -> Result<EquivalenceGroups> {
    let path: Option<PathBuf> = match (explicit, config) {
        (Some(path), _) => Some(path.to_path_buf()),
        (None, Some(config)) => config
            .parent()
            .map(|dir| dir.join(EQUIVALENTS_FILE))
            .filter(|candidate| candidate.is_file()),
        (None, None) => None,
    };
    let Some(path) = path else {
        return Ok(EquivalenceGroups::default());
    };
    let groups = read_equivalents(&path)?;
    info!(path = %path.display(), groups = groups.len(), "loaded equivalent items");
    Ok(groups)
}

#[derive(Serialize)]
struct StructuredOutput<T> {
    structured: T,
    top_level: T,
}

fn run_diff(args: DiffArgs, settings: &Settings, registry: &DialectRegistry) -> Result<()> {
    if let Some(out_path) = &args.output {
        path_guard::ensure_output_not_same(out_path, &[&args.left, &args.right])?;
    }
    let options = TextOptions {
        show_common: args.show_common || settings.show_common,
        skip_attrs: Vec::new(),
    };
    if args.structured {
        diff_structured(&args, settings, registry, &options)
    } else {
        diff_flat(&args, settings, registry, &options)
    }
}

fn diff_flat(
    args: &DiffArgs,
    settings: &Settings,
    registry: &DialectRegistry,
    options: &TextOptions,
) -> Result<()> {
    let mut left = load_flat(&args.left, registry.flat(&args.left_type)?)?;
    let right = load_flat(&args.right, registry.flat(&args.right_type)?)?;
    settings.apply(&mut left);
    left.set_ignored_categories(&args.ignore_categories, &settings.category_table());

    let report = left
        .compare(&right)
        .with_context(|| format!("failed to compare {} with {}", left.name(), right.name()))?;
    info!(differences = report.has_differences(), "compared flat BOMs");

    if args.summary {
        return output::emit(&render_summary(&report.diff.counts()), args.output.as_deref());
    }
    let content = match args.format {
        OutputFormat::Text => match &args.output {
            Some(_) => format_text(&report, options),
            None => render_text(&report, options),
        },
        OutputFormat::Json => format_json(&JsonReport::flat(&report))?,
        OutputFormat::Yaml => serde_yaml::to_string(&nested_flat(&report))?,
        OutputFormat::Csv => output::csv_string(&table_flat(&report, options.show_common).rows)?,
    };
    output::emit(&content, args.output.as_deref())
}

fn diff_structured(
    args: &DiffArgs,
    settings: &Settings,
    registry: &DialectRegistry,
    options: &TextOptions,
) -> Result<()> {
    let mut left = load_structured(&args.left, registry.structured(&args.left_type)?)?;
    let right = load_structured(&args.right, registry.structured(&args.right_type)?)?;
    settings.apply(left.bom_mut());
    left.bom_mut()
        .set_ignored_categories(&args.ignore_categories, &settings.category_table());

    let report = left
        .compare(&right)
        .with_context(|| format!("failed to compare {} with {}", left.name(), right.name()))?;
    let left_top = left
        .assemblies_bom()
        .with_context(|| format!("failed to collect assemblies of {}", left.name()))?;
    let right_top = right
        .assemblies_bom()
        .with_context(|| format!("failed to collect assemblies of {}", right.name()))?;
    let top = left_top.compare(&right_top).with_context(|| {
        format!("failed to compare top-level assemblies of {} and {}", left.name(), right.name())
    })?;
    info!(
        differences = report.has_differences(),
        top_level_differences = top.has_differences(),
        "compared structured BOMs"
    );

    if args.summary {
        let content = format!(
            "structured: {}\ntop level: {}",
            render_summary(&report.counts()),
            render_summary(&top.diff.counts())
        );
        return output::emit(&content, args.output.as_deref());
    }

    let top_options = TextOptions {
        skip_attrs: TOP_LEVEL_SKIP.iter().map(|s| s.to_string()).collect(),
        ..options.clone()
    };
    let content = match args.format {
        OutputFormat::Text => match &args.output {
            Some(_) => format!(
                "{}\n{TOP_LEVEL_TITLE}\n{}",
                format_tree_text(&report, options),
                format_text(&top, &top_options)
            ),
            None => format!(
                "{}\n{TOP_LEVEL_TITLE}\n{}",
                render_tree_text(&report, options),
                render_text(&top, &top_options)
            ),
        },
        OutputFormat::Json => serde_json::to_string_pretty(&StructuredOutput {
            structured: JsonReport::tree(&report),
            top_level: JsonReport::flat(&top),
        })?,
        OutputFormat::Yaml => serde_yaml::to_string(&StructuredOutput::<NestedReport> {
            structured: nested_tree(&report),
            top_level: nested_flat(&top),
        })?,
        OutputFormat::Csv => {
            let mut rows = table_tree(&report, options.show_common).rows;
            rows.push(Vec::new());
            rows.extend(table_flat(&top, options.show_common).rows);
            output::csv_string(&rows)?
        }
    };
    output::emit(&content, args.output.as_deref())
}

fn run_inspect(args: InspectArgs, settings: &Settings, registry: &DialectRegistry) -> Result<()> {
    if args.flat {
        let mut bom = load_flat(&args.file, registry.flat(&args.dialect)?)?;
        settings.apply(&mut bom);
        match args.format {
            InspectFormat::Text => {
                println!("{} ({} items)", bom.name(), bom.len());
                print!("{}", render_items(&bom));
            }
            InspectFormat::Json => {
                let summaries: Vec<String> = bom.iter().map(|i| i.summary()).collect();
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            }
        }
        return Ok(());
    }

    let bom = load_structured(&args.file, registry.structured(&args.dialect)?)?;
    match args.format {
        InspectFormat::Text => {
            println!("{} ({} items)", bom.name(), bom.len());
            if args.flattened {
                print!("{}", render_flattened(&bom));
            } else {
                print!("{}", render_tree(&bom, args.depth));
            }
        }
        InspectFormat::Json if args.flattened => {
            let totals: Vec<(String, i64)> = bom
                .flattened()
                .map(|(item, quantity)| (item.to_string(), quantity))
                .collect();
            println!("{}", serde_json::to_string_pretty(&totals)?);
        }
        InspectFormat::Json => println!("{}", serde_json::to_string_pretty(&bom.export_tree())?),
    }
    Ok(())
}

fn run_concat(args: ConcatArgs, registry: &DialectRegistry) -> Result<()> {
    path_guard::ensure_output_not_same(&args.output, &[&args.first, &args.second])?;
    let dialect = registry.structured(&args.dialect)?;
    let first = load_structured(&args.first, dialect.clone())?;
    let second = load_structured(&args.second, dialect.clone())?;

    let joined = StructuredBom::concat_tree(dialect, &[&first, &second])
        .with_context(|| format!("failed to join {} and {}", first.name(), second.name()))?;
    let rows = if args.flattened {
        joined.flattened_rows()
    } else {
        joined.to_rows()
    };
    output::write_csv(&args.output, &rows)?;
    info!(output = %args.output.display(), items = joined.len(), "wrote joined BOM");
    Ok(())
}
