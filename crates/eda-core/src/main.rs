//! CLI entry point for the EDA engine.

use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use eda_core::{
    AggFn, AggregateEngine, AggregateQuery, CsvLoader, DuplicatePolicy, EdaConfig, EdaReport,
    QualityAnalyzer, ReportGenerator, Table,
};
use std::path::{Path, PathBuf};
use tracing::info;

/// CLI-compatible aggregate function enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliAggFn {
    /// Mean of the target per group
    Mean,
    /// Sum of the target per group
    Sum,
    /// Number of present target values per group
    Count,
    /// Median of the target per group
    Median,
}

impl From<CliAggFn> for AggFn {
    fn from(cli: CliAggFn) -> Self {
        match cli {
            CliAggFn::Mean => AggFn::Mean,
            CliAggFn::Sum => AggFn::Sum,
            CliAggFn::Count => AggFn::Count,
            CliAggFn::Median => AggFn::Median,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Exploratory data analysis for tabular datasets",
    long_about = "Summarizes a CSV file: schema, missing values, duplicates, descriptive \
                  statistics, value counts and a Pearson correlation matrix.\n\n\
                  EXAMPLES:\n  \
                  # Full summary\n  \
                  eda-core -i train.csv\n\n  \
                  # Semicolon-separated input, duplicates dropped\n  \
                  eda-core -i winequality-red.csv --separator ';' --drop-duplicates\n\n  \
                  # Survival rate by sex\n  \
                  eda-core -i train.csv --group-by Sex --target Survived --agg mean\n\n  \
                  # Five most expensive fares\n  \
                  eda-core -i train.csv --rank-by Fare --top 5\n\n  \
                  # Share of survivors\n  \
                  eda-core -i train.csv --proportion Survived=1"
)]
struct Args {
    /// Path to the CSV file to analyze
    #[arg(short, long)]
    input: String,

    /// Output directory for --emit-report
    #[arg(short, long, default_value = "./outputs")]
    output: String,

    /// Field separator of the input file
    #[arg(long, default_value = ",")]
    separator: char,

    /// Keep column names exactly as read (no whitespace normalization)
    #[arg(long)]
    raw_names: bool,

    /// Drop rows that repeat an earlier row before summarizing
    #[arg(long)]
    drop_duplicates: bool,

    /// Number of histogram bins per numeric column
    #[arg(long, default_value = "10")]
    bins: usize,

    /// Rows shown for top-N rankings and frequency tables
    #[arg(long, default_value = "5")]
    top: usize,

    /// Rank rows by this numeric column (largest first)
    #[arg(long)]
    rank_by: Option<String>,

    /// Share of non-missing cells equal to a value, as COLUMN=VALUE (repeatable)
    #[arg(long, value_name = "COLUMN=VALUE")]
    proportion: Vec<String>,

    /// Group rows by these columns (comma separated); requires --target
    #[arg(long, value_delimiter = ',')]
    group_by: Vec<String>,

    /// Column aggregated per group
    #[arg(long)]
    target: Option<String>,

    /// Aggregate function applied per group
    #[arg(long, value_enum, default_value = "mean")]
    agg: CliAggFn,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings, errors and results)
    #[arg(short, long)]
    quiet: bool,

    /// Output the JSON report to stdout instead of the text summary
    #[arg(long)]
    json: bool,

    /// Write the JSON report to the output directory
    ///
    /// The report will be saved as <input_name>_eda_report.json
    #[arg(short = 'r', long)]
    emit_report: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// With `json_output` no subscriber is installed, so stdout only carries JSON.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.quiet, args.json);

    if !Path::new(&args.input).exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }
    if !args.separator.is_ascii() {
        return Err(anyhow!("Separator must be a single ASCII character"));
    }
    if !args.group_by.is_empty() && args.target.is_none() {
        return Err(anyhow!("--group-by requires --target"));
    }

    let config = EdaConfig::builder()
        .separator(args.separator as u8)
        .normalize_names(!args.raw_names)
        .duplicate_policy(if args.drop_duplicates {
            DuplicatePolicy::Drop
        } else {
            DuplicatePolicy::Keep
        })
        .histogram_bins(args.bins)
        .top_n(args.top)
        .build()?;

    info!("Loading dataset from: {}", args.input);
    let table = CsvLoader::from_config(&config).load_path(&args.input)?;
    let report = ReportGenerator::generate(&table, &config)?;

    emit_report_file(&report, &args)?;
    if args.json {
        println!("{}", report.to_json_pretty()?);
        return Ok(());
    }

    print_summary(&report, &args, config.top_n);

    let (table, _) = QualityAnalyzer::deduplicate(&table, config.duplicate_policy)?;
    if let Some(column) = &args.rank_by {
        print_ranking(&table, column, config.top_n)?;
    }
    if !args.proportion.is_empty() {
        print_proportions(&table, &args.proportion, config.proportion_precision)?;
    }
    if let Some(target) = &args.target {
        print_grouped(&table, &args.group_by, target, args.agg.into())?;
    }

    Ok(())
}

/// Write the JSON report to the output directory when `--emit-report` is set.
fn emit_report_file(report: &EdaReport, args: &Args) -> Result<Option<PathBuf>> {
    if !args.emit_report {
        return Ok(None);
    }
    let generator = ReportGenerator::new(args.output.clone().into());
    let report_path = generator.write_report_to_file(report, &extract_file_stem(&args.input))?;
    info!("Report written to: {}", report_path.display());
    Ok(Some(report_path))
}

/// Extract the file stem (name without extension) from a path.
fn extract_file_stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("dataset")
        .to_string()
}

/// Truncate a string to `max_len` characters with an ellipsis.
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

fn section(title: &str) {
    println!("{}", title);
    println!("{}", "-".repeat(40));
}

/// Print the human-readable summary (default output).
fn print_summary(report: &EdaReport, args: &Args, top: usize) {
    println!();
    println!("{}", "=".repeat(80));
    println!("EXPLORATORY DATA ANALYSIS");
    println!("{}", "=".repeat(80));
    println!();

    section("DATASET OVERVIEW");
    println!("  File: {}", args.input);
    println!("  Rows: {}", report.shape.rows);
    println!("  Columns: {}", report.shape.columns);
    println!("  Duplicate rows: {}", report.duplicates.count);
    if report.duplicates_removed > 0 {
        println!("  Duplicates removed: {}", report.duplicates_removed);
    }
    println!();

    section("COLUMNS");
    println!(
        "{:<24} {:<12} {:>8} {:>10} {:>8}",
        "Column", "Type", "Unique", "Missing", "Missing %"
    );
    for (col, missing) in report.schema.iter().zip(&report.missing.columns) {
        println!(
            "{:<24} {:<12} {:>8} {:>10} {:>8.1}",
            truncate_str(&col.name, 23),
            col.semantic_type.as_str(),
            col.unique_count,
            missing.count,
            missing.ratio * 100.0
        );
    }
    println!();

    if !report.describe.is_empty() {
        section("DESCRIPTIVE STATISTICS");
        println!(
            "{:<24} {:>7} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
            "Column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
        );
        for (name, s) in &report.describe.columns {
            println!(
                "{:<24} {:>7} {:>10.3} {:>10.3} {:>10.3} {:>10.3} {:>10.3} {:>10.3} {:>10.3}",
                truncate_str(name, 23),
                s.count,
                s.mean,
                s.std,
                s.min,
                s.q1,
                s.median,
                s.q3,
                s.max
            );
        }
        println!();
    }

    if !report.frequencies.is_empty() {
        section("VALUE COUNTS");
        for table in &report.frequencies {
            println!("  {}", table.column);
            for entry in table.entries.iter().take(top) {
                println!("    {:<24} {:>8}", truncate_str(&entry.value.to_string(), 23), entry.count);
            }
            if table.len() > top {
                println!("    ... and {} more value(s)", table.len() - top);
            }
        }
        println!();
    }

    let matrix = &report.correlation;
    if matrix.columns.len() > 1 {
        section("CORRELATION (PEARSON)");
        print!("{:<14}", "");
        for name in &matrix.columns {
            print!(" {:>10}", truncate_str(name, 10));
        }
        println!();
        for (name, row) in matrix.columns.iter().zip(&matrix.values) {
            print!("{:<14}", truncate_str(name, 13));
            for value in row {
                print!(" {:>10.3}", value);
            }
            println!();
        }
        for (a, b) in &matrix.undefined {
            println!("  ! '{}' x '{}' undefined", a, b);
        }
        println!();
    }

    println!("Use --json for machine-readable output");
    if !args.emit_report {
        println!("Use --emit-report to save the JSON report");
    }
    println!("{}", "=".repeat(80));
}

fn print_ranking(table: &Table, column: &str, n: usize) -> Result<()> {
    let n = i64::try_from(n)?;
    let ranked = AggregateEngine::top_n(table, column, n, false)?;
    println!();
    section(&format!("TOP {} BY {}", n, column));
    for entry in ranked {
        println!("  row {:>6}  {:>12.3}", entry.row, entry.value);
    }
    Ok(())
}

fn print_proportions(table: &Table, pairs: &[String], precision: u32) -> Result<()> {
    println!();
    section("PROPORTIONS");
    for pair in pairs {
        let (column, raw) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("Expected COLUMN=VALUE, got '{}'", pair))?;
        let value = table.parse_cell(column, raw)?;
        let share = AggregateEngine::proportion(table, column, value, precision)?;
        println!("  {:<30} {:>8}", truncate_str(pair, 29), share);
    }
    Ok(())
}

fn print_grouped(table: &Table, group_by: &[String], target: &str, func: AggFn) -> Result<()> {
    let query = AggregateQuery::new(target, func).group_by(group_by.iter().cloned());
    let result = AggregateEngine::aggregate(table, &query)?;
    println!();
    section(&format!("{:?} OF {} BY {}", func, target, group_by.join(", ")).to_uppercase());
    for (key, value) in &result.groups {
        println!("  {:<30} {:>12.3}", truncate_str(&key.to_string(), 29), value);
    }
    Ok(())
}
