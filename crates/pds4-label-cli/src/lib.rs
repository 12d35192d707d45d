use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use pds4_label_config::{Config, ConfigError, LoadOptions};
use pds4_label_core::naming::file_name;
use pds4_label_core::{
    expand_rename, label_segmented, label_simple, product_id, update_inventory, ExitCode,
    FileInfo, InventoryRequest, LabelContext, LabelError, LabelOutcome, ProductFacts,
    RenameTokens, SegmentCatalog,
};
use pds4_template::{build_unified_diff, Occurrence, Template, TemplateError};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Entry point for CLI execution. Returns the desired exit code.
pub fn run() -> Result<ExitCode> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if err.use_stderr() => {
            let _ = err.print();
            return Ok(ExitCode::InvalidArguments);
        }
        Err(err) => err.exit(),
    };
    init_tracing(cli.verbose);

    let mut options = LoadOptions::default();
    if let Some(path) = &cli.config {
        options = options.with_override_path(path);
    }
    let config = Config::load(options)?;

    match cli.command {
        Command::Simple(args) => handle_simple(&config, args, cli.dry_run),
        Command::Segmented(args) => handle_segmented(&config, args, cli.dry_run),
        Command::Inventory(args) => handle_inventory(&config, args, cli.dry_run),
        Command::Get(args) => handle_get(args),
    }
}

/// Exit code for an error that escaped [`run`].
pub fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    if let Some(err) = err.downcast_ref::<LabelError>() {
        return err.exit_code();
    }
    if let Some(err) = err.downcast_ref::<TemplateError>() {
        return match err {
            TemplateError::NotFound { .. } => ExitCode::NotFound,
            TemplateError::Io { .. } => ExitCode::Io,
        };
    }
    if err.downcast_ref::<ConfigError>().is_some() {
        return ExitCode::Configuration;
    }
    ExitCode::Io
}

fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn handle_simple(config: &Config, args: SimpleArgs, dry_run: bool) -> Result<ExitCode> {
    let SimpleArgs { product, rename } = args;
    let info = FileInfo::load(&product.info)?;
    let facts = gather_facts(&product.data, rename.as_deref(), &info, dry_run)?;
    let template = Template::load(&product.template)?;
    let context = LabelContext::new(config.label.clone());

    let outcome = label_simple(template.clone(), &facts, &info, &context)?;
    finish_label(&template, &product.template, &outcome, dry_run)
}

fn handle_segmented(config: &Config, args: SegmentedArgs, dry_run: bool) -> Result<ExitCode> {
    let SegmentedArgs {
        product,
        segment_dir,
        rename,
    } = args;

    let Some(directory) = segment_dir.or_else(|| config.segments.directory.clone()) else {
        eprintln!(
            "No segment directory configured. Pass --segment-dir or set [segments] directory in .pds4-label.toml."
        );
        return Ok(ExitCode::Configuration);
    };

    let info = FileInfo::load(&product.info)?;
    let catalog = SegmentCatalog::load(&directory, &config.segments)?;
    let facts = gather_facts(&product.data, rename.as_deref(), &info, dry_run)?;
    let template = Template::load(&product.template)?;
    let context = LabelContext::new(config.label.clone());

    let outcome = label_segmented(
        template.clone(),
        &facts,
        &info,
        &catalog,
        &config.segments,
        &context,
    )?;
    finish_label(&template, &product.template, &outcome, dry_run)
}

fn handle_inventory(config: &Config, args: InventoryArgs, dry_run: bool) -> Result<ExitCode> {
    let request = InventoryRequest {
        collection: args.collection,
        labels: args.labels,
        message: args.message,
        keep: args.keep,
    };
    let context = LabelContext::new(config.label.clone());
    let outcome = update_inventory(&request, &context)?;

    if dry_run {
        let previous_csv = fs::read_to_string(&outcome.csv_path).unwrap_or_default();
        let previous_label = fs::read_to_string(&outcome.label_path)
            .with_context(|| format!("reading {}", outcome.label_path.display()))?;
        let csv_name = outcome.csv_path.display().to_string();
        let label_name = outcome.label_path.display().to_string();
        let diffs = [
            build_unified_diff(&previous_csv, &outcome.csv, &csv_name, &csv_name),
            build_unified_diff(&previous_label, &outcome.label.render(), &label_name, &label_name),
        ];
        emit_diffs(diffs.iter().flatten())?;
        return Ok(ExitCode::Success);
    }

    outcome.write()?;
    println!(
        "Collection now lists {} records at version {}",
        outcome.records, outcome.version
    );
    Ok(ExitCode::Success)
}

fn handle_get(args: GetArgs) -> Result<ExitCode> {
    let template = Template::load(&args.label)?;
    let values = if args.all {
        let values = template.read_all(&args.marker);
        if values.is_empty() {
            eprintln!("No line in {} holds a value for '{}'.", args.label.display(), args.marker);
            return Ok(ExitCode::NotFound);
        }
        values
    } else {
        let occurrence = if args.last {
            Occurrence::Last
        } else {
            Occurrence::First
        };
        vec![template.read(&args.marker, occurrence)?]
    };

    let mut stdout = io::stdout().lock();
    for value in values {
        writeln!(stdout, "{value}")?;
    }
    Ok(ExitCode::Success)
}

/// Gather facts for `data`, renaming it first when a pattern is given. In a
/// dry run the facts describe the name the file would get.
fn gather_facts(
    data: &Path,
    rename: Option<&str>,
    info: &FileInfo,
    dry_run: bool,
) -> Result<ProductFacts> {
    let Some(pattern) = rename else {
        return Ok(ProductFacts::gather(data)?);
    };

    let name = expand_rename(pattern, &RenameTokens::from_info(info))?;
    let target = match data.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(&name),
        _ => PathBuf::from(&name),
    };

    if dry_run {
        let facts = ProductFacts::gather(data)?;
        println!("Would rename {} to {}", data.display(), target.display());
        return Ok(ProductFacts {
            file_name: file_name(&target),
            product_id: product_id(&target),
            path: target,
            ..facts
        });
    }

    fs::rename(data, &target).map_err(|source| LabelError::Io {
        path: data.to_path_buf(),
        source,
    })?;
    info!(from = %data.display(), to = %target.display(), "renamed data file");
    Ok(ProductFacts::gather(&target)?)
}

fn finish_label(
    template: &Template,
    template_path: &Path,
    outcome: &LabelOutcome,
    dry_run: bool,
) -> Result<ExitCode> {
    if dry_run {
        let diff = build_unified_diff(
            &template.render(),
            &outcome.label.render(),
            &template_path.display().to_string(),
            &outcome.output.display().to_string(),
        );
        emit_diffs(diff.iter())?;
        return Ok(ExitCode::Success);
    }

    outcome.write()?;
    println!("Wrote {}", outcome.output.display());
    Ok(ExitCode::Success)
}

fn emit_diffs<'a>(diffs: impl Iterator<Item = &'a String>) -> Result<()> {
    let mut stdout = io::stdout().lock();
    let mut any = false;
    for diff in diffs {
        write!(stdout, "{diff}")?;
        any = true;
    }
    if !any {
        writeln!(stdout, "No changes (dry run)")?;
    }
    stdout.flush()?;
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Generate PDS4 labels from marker-addressed templates",
    propagate_version = true
)]
struct Cli {
    /// Explicit configuration file, overriding .pds4-label.toml
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Print a diff instead of writing anything
    #[arg(long = "dry-run", global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Label a data file with a single record layout
    Simple(SimpleArgs),
    /// Label a tracking file holding several segment kinds
    Segmented(SegmentedArgs),
    /// Add product labels to a collection inventory
    Inventory(InventoryArgs),
    /// Print values stored under a marker
    Get(GetArgs),
}

#[derive(Args)]
struct ProductArgs {
    /// Data file to label
    #[arg(value_name = "DATA")]
    data: PathBuf,
    /// Label template
    #[arg(short, long, value_name = "TEMPLATE")]
    template: PathBuf,
    /// Decoded file facts (JSON)
    #[arg(short, long, value_name = "INFO")]
    info: PathBuf,
}

#[derive(Args)]
struct SimpleArgs {
    #[command(flatten)]
    product: ProductArgs,
    /// Rename the data file first, e.g. `olr_{start_year}_{start_doy}.raw`
    #[arg(short, long, value_name = "PATTERN")]
    rename: Option<String>,
}

#[derive(Args)]
struct SegmentedArgs {
    #[command(flatten)]
    product: ProductArgs,
    /// Directory holding the per-kind sub-templates
    #[arg(short = 'c', long = "segment-dir", value_name = "DIR")]
    segment_dir: Option<PathBuf>,
    /// Rename the data file first
    #[arg(short, long, value_name = "PATTERN")]
    rename: Option<String>,
}

#[derive(Args)]
struct InventoryArgs {
    /// Collection inventory CSV; its label must sit next to it
    #[arg(short, long, value_name = "CSV")]
    collection: PathBuf,
    /// Description for the new modification history entry
    #[arg(short, long, value_name = "MESSAGE")]
    message: String,
    /// Keep the rows already in the inventory
    #[arg(short, long)]
    keep: bool,
    /// Product labels to add
    #[arg(value_name = "LABEL", required = true)]
    labels: Vec<PathBuf>,
}

#[derive(Args)]
struct GetArgs {
    #[arg(value_name = "LABEL")]
    label: PathBuf,
    #[arg(value_name = "MARKER")]
    marker: String,
    /// Read the last matching line instead of the first
    #[arg(long, conflicts_with = "all")]
    last: bool,
    /// Read every matching line
    #[arg(long)]
    all: bool,
}
