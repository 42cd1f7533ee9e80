//! Process command - allocate breakdown metrics and write the processed table.

use std::path::{Path, PathBuf};

use clickshare::{
    AllocationMode, Breakdown, BreakdownConfig, BreakdownResult, OutputFormat, PartialRoles,
    Severity, TableWriter,
};
use colored::Colorize;
use tracing::debug;

/// Options collected from the command line.
pub struct ProcessArgs {
    pub file: PathBuf,
    pub roles: PartialRoles,
    pub no_date: bool,
    pub aggregate: bool,
    pub mode: Option<AllocationMode>,
    pub config: Option<PathBuf>,
    pub delimiter: Option<char>,
    pub output: Option<PathBuf>,
    pub format: Option<OutputFormat>,
    pub summary_json: bool,
    pub verbose: bool,
}

pub fn run(args: ProcessArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !args.file.exists() {
        return Err(format!("File not found: {}", args.file.display()).into());
    }

    // Config file values first, then command-line flags on top
    let mut config = match &args.config {
        Some(path) => BreakdownConfig::load(path)?,
        None => BreakdownConfig::default(),
    };
    config.roles = config.roles.overlay(args.roles);
    if args.no_date {
        config.include_date = false;
    }
    if args.aggregate {
        config.aggregate = true;
    }
    if let Some(mode) = args.mode {
        config.mode = mode;
    }
    if let Some(delimiter) = args.delimiter {
        if !delimiter.is_ascii() {
            return Err(format!(
                "Delimiter must be a single ASCII character, got '{}'",
                delimiter
            )
            .into());
        }
        config.parser.delimiter = Some(delimiter as u8);
    }

    let format = args
        .format
        .or_else(|| args.output.as_deref().and_then(OutputFormat::from_path))
        .or_else(|| OutputFormat::from_path(&args.file))
        .unwrap_or_default();
    let output_path = args
        .output
        .unwrap_or_else(|| default_output_path(&args.file, format));

    if !args.summary_json {
        println!(
            "{} {}",
            "Processing".cyan().bold(),
            args.file.display().to_string().white()
        );
    }

    let pipeline = Breakdown::with_config(config);
    let writer = TableWriter::new(format);
    debug!(
        mode = %pipeline.config().mode,
        include_date = pipeline.config().include_date,
        aggregate = pipeline.config().aggregate,
        output = %output_path.display(),
        format = %writer.format(),
        "resolved run options"
    );

    let result = pipeline.run(&args.file)?;
    writer.write_file(&result.table, &output_path)?;

    if args.summary_json {
        println!("{}", serde_json::to_string_pretty(&result.summary)?);
    } else {
        print_summary(&result, &output_path, args.verbose);
    }

    Ok(())
}

/// `<stem>_processed.<ext>` next to the input file.
fn default_output_path(file: &Path, format: OutputFormat) -> PathBuf {
    let stem = file.file_stem().unwrap_or_default().to_string_lossy();
    file.with_file_name(format!("{}_processed.{}", stem, format.extension()))
}

fn print_summary(result: &BreakdownResult, output_path: &Path, verbose: bool) {
    let summary = &result.summary;
    let roles = &result.roles;

    println!();
    println!("{}", "Roles:".yellow().bold());
    println!("  URL:         {}", roles.url.white());
    println!("  Device:      {}", roles.device.white());
    println!("  Country:     {}", roles.country.white());
    println!("  Clicks:      {}", roles.clicks.white());
    if let Some(date) = &roles.date {
        println!("  Date:        {}", date.white());
    }
    if let Some(query) = &roles.query {
        println!("  Query:       {}", query.white());
    }
    if let Some(impressions) = &roles.impressions {
        println!("  Impressions: {}", impressions.white());
    }
    println!("  Breakdown:   {}", roles.breakdown.join(", ").white());
    println!();

    println!("{}", "Allocation:".yellow().bold());
    println!("  Mode:   {}", summary.mode.to_string().cyan());
    println!(
        "  Key:    url, country, device{}",
        if summary.include_date && roles.date.is_some() { ", date" } else { "" }
    );
    println!("  Groups: {}", summary.groups.to_string().white().bold());
    println!(
        "  Rows:   {} in, {} out{}",
        summary.rows_in,
        summary.rows_out,
        if summary.aggregated { " (aggregated)" } else { "" }
    );
    if summary.fallback_groups > 0 {
        println!(
            "  Zero-click groups routed to top row: {}",
            summary.fallback_groups.to_string().blue()
        );
    }
    if summary.degenerate_groups > 0 {
        println!(
            "  Zero-click groups left undefined:    {}",
            summary.degenerate_groups.to_string().red()
        );
    }
    println!();

    println!("{}", "Metrics:".yellow().bold());
    for metric in &summary.metrics {
        println!(
            "  {:<20} raw {:>12.2}  estimated {}",
            metric.column,
            metric.raw_total,
            format!("{:>12.2}", metric.estimated_total).green()
        );
    }

    let warnings: Vec<_> = result.warnings().collect();
    if !warnings.is_empty() || verbose {
        println!();
        println!("{}", "Diagnostics:".yellow().bold());
        for diagnostic in &result.diagnostics {
            if diagnostic.severity == Severity::Info && !verbose {
                continue;
            }
            let severity = format!("[{}]", diagnostic.severity.label());
            let severity = match diagnostic.severity {
                Severity::Warning => severity.yellow(),
                Severity::Info => severity.blue(),
            };
            println!(
                "  {} {}: {}",
                severity,
                diagnostic.kind.label().bold(),
                diagnostic.message
            );
        }
    }

    println!();
    println!(
        "{} {}",
        "Saved to".green().bold(),
        output_path.display().to_string().cyan()
    );
}
