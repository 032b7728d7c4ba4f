use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use photo_exif::diagnose::{DiagnosisReport, DiagnosticEngine, PathDebugReport};
use photo_exif::exif::MetadataRecord;
use photo_exif::pipeline::{ExifService, collect_locators};
use photo_exif::{config, error::ReadError};

#[derive(Parser, Debug)]
#[command(
    name = "photo-exif",
    version,
    about = "Read photo EXIF metadata from app://, file:// and plain locators, with path safety checks and diagnostics"
)]
struct Cli {
    /// Image locators, files, or directories to read
    #[arg(value_name = "LOCATOR")]
    locators: Vec<String>,

    /// Path to config file (default: config.json next to binary)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Initialize a default config.json and exit
    #[arg(long)]
    init: bool,

    /// Run every check and explain why metadata can or cannot be read
    #[arg(long)]
    diagnose: bool,

    /// Show how each locator resolves to a local path
    #[arg(long = "debug-path")]
    debug_path: bool,

    /// Output results as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Handle --init
    if cli.init {
        let config = config::Config::default();
        let path = cli.config.as_deref();
        config.save(path)?;
        let save_path = match path {
            Some(p) => p.to_path_buf(),
            None => config::Config::config_path()?,
        };
        println!("Default config written to {}", save_path.display());
        return Ok(());
    }

    if cli.locators.is_empty() {
        anyhow::bail!("No locators, files or directories specified. Use --help for usage.");
    }
    if cli.diagnose && cli.debug_path {
        anyhow::bail!("--diagnose and --debug-path cannot be combined.");
    }

    let config = config::Config::load(cli.config.as_deref())?;
    let json = cli.json || config.output.json;

    // Handle --debug-path (locators are taken literally, directories are not walked)
    if cli.debug_path {
        let engine = DiagnosticEngine::from_config(&config);
        let mut reports = Vec::new();
        for locator in &cli.locators {
            reports.push(engine.debug_path(locator).await);
        }
        if json {
            println!("{}", serde_json::to_string_pretty(&reports)?);
        } else {
            reports.iter().for_each(print_debug_report);
        }
        return Ok(());
    }

    let locators = collect_locators(&cli.locators);
    if locators.is_empty() {
        anyhow::bail!("No supported image files found in the specified paths.");
    }

    // Handle --diagnose
    if cli.diagnose {
        let engine = DiagnosticEngine::from_config(&config);
        let mut reports = Vec::new();
        for locator in &locators {
            reports.push(engine.diagnose(locator).await);
        }
        if json {
            println!("{}", serde_json::to_string_pretty(&reports)?);
        } else {
            reports.iter().for_each(print_diagnosis);
        }
        return Ok(());
    }

    log::info!("Reading {} image(s)", locators.len());
    let service = ExifService::from_config(&config);
    let results = service.read_many(&locators).await;

    // JSON output
    if json {
        let json_results: Vec<serde_json::Value> = locators
            .iter()
            .zip(&results)
            .map(|(locator, result)| match result {
                Ok(record) => serde_json::json!({
                    "locator": locator,
                    "metadata": record,
                }),
                Err(e) => serde_json::json!({
                    "locator": locator,
                    "error": {
                        "code": e.code(),
                        "message": e.to_string(),
                        "rejected": e.is_rejection(),
                    },
                }),
            })
            .collect();

        println!("{}", serde_json::to_string_pretty(&json_results)?);
    } else {
        for (locator, result) in locators.iter().zip(&results) {
            print_record(locator, result);
        }
    }

    // Summary
    let success = results.iter().filter(|r| r.is_ok()).count();
    let failed = results.len() - success;
    log::info!(
        "Done: {success} with metadata, {failed} without, out of {} images",
        results.len()
    );

    Ok(())
}

// ANSI color codes
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

/// Max width for the value column before wrapping.
const VAL_WIDTH: usize = 46;
/// Indent for continuation lines (tag column width + " : " = 25 chars + 2 leading spaces).
const INDENT: &str = "                           ";

/// What to run next for a locator that yielded nothing.
fn next_step(err: &ReadError) -> &'static str {
    if err.is_rejection() {
        "Refused before reading. Run with --debug-path to see which check fired."
    } else {
        "Run with --diagnose to see why."
    }
}

/// Print one image's metadata table, or the "no data" line.
fn print_record(locator: &str, result: &Result<MetadataRecord, ReadError>) {
    println!();
    println!("{BOLD}File:{RESET} {locator}");
    println!("{DIM}{}{RESET}", "═".repeat(72));

    match result {
        Ok(record) => {
            for (label, value) in record.display_rows() {
                print_row(label, &value);
            }
        }
        Err(e) => {
            println!("  {DIM}(no EXIF data: {}){RESET}", e.code());
            println!("  {DIM}{}{RESET}", next_step(e));
        }
    }
    println!();
}

fn print_diagnosis(report: &DiagnosisReport) {
    println!();
    println!("{BOLD}Diagnosis:{RESET} {}", report.locator);
    println!("{DIM}{}{RESET}", "═".repeat(72));

    print_row("Resolved path", &report.resolved_path);
    print_check("In sandbox", report.is_in_sandbox, &report.validation_reason.to_string());
    print_check(
        "Supported format",
        report.is_supported_format,
        report.format.map(|f| f.mime_type()).unwrap_or("unsupported"),
    );
    print_check("File exists", report.file_exists, "");

    if report.full_probe.attempted {
        let basic = &report.basic_probe;
        let dims = match (basic.width, basic.height) {
            (Some(w), Some(h)) => format!("{w} × {h}"),
            _ => String::from("unknown size"),
        };
        print_check("Basic EXIF", basic.has_basic_exif, &dims);

        let full = &report.full_probe;
        let detail = match (full.field_count, &full.error) {
            (Some(n), _) => format!("{n} fields"),
            (None, Some(e)) => e.clone(),
            (None, None) => String::new(),
        };
        print_check("Full EXIF", full.success, &detail);
    } else {
        print_row("EXIF probes", "skipped");
    }

    print_recommendations(&report.recommendations);
}

fn print_debug_report(report: &PathDebugReport) {
    println!();
    println!("{BOLD}Path debug:{RESET} {}", report.original);
    println!("{DIM}{}{RESET}", "═".repeat(72));

    let d = &report.details;
    print_row("Converted", &report.converted);
    print_row("Scheme", &format!("{:?}", report.scheme));
    print_row("Policy", &format!("{:?}", report.policy));
    print_check("Validation", report.validation.accepted, &report.validation.reason.to_string());
    print_check("File exists", report.file_exists, "");
    print_row("Absolute", &d.is_absolute.to_string());
    print_row("Traversal", &d.has_traversal.to_string());
    print_row("Length", &d.length.to_string());
    print_row("Directory", &d.dirname);
    print_row("File name", &d.basename);
    if let Some(ref ext) = d.extension {
        print_row("Extension", ext);
    }

    print_recommendations(&report.recommendations);
}

fn print_recommendations(lines: &[String]) {
    println!("  {DIM}{}{RESET}", "─".repeat(70));
    println!("  {BOLD}Recommendations{RESET}");
    for (i, line) in lines.iter().enumerate() {
        println!("  {YELLOW}{}.{RESET} {line}", i + 1);
    }
    println!();
}

/// Print a pass/fail row.
fn print_check(tag: &str, ok: bool, detail: &str) {
    let tag_col = format!("{:<22}", tag);
    let mark = if ok {
        format!("{GREEN}yes{RESET}")
    } else {
        format!("{RED}no{RESET}")
    };
    if detail.is_empty() {
        println!("  {tag_col} : {mark}");
    } else {
        println!("  {tag_col} : {mark} {DIM}({detail}){RESET}");
    }
}

/// Print a single row in the EXIF display table.
fn print_row(tag: &str, val: &str) {
    let tag_col = format!("{:<22}", tag);
    let lines = wrap_text(val, VAL_WIDTH);
    for (i, line) in lines.iter().enumerate() {
        if i == 0 {
            println!("  {tag_col} : {line}");
        } else {
            println!("  {INDENT}{line}");
        }
    }
}

/// Wrap text at word boundaries to fit within max_width.
fn wrap_text(s: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in s.split_whitespace() {
        if current_line.is_empty() {
            current_line = word.to_string();
        } else if current_line.len() + 1 + word.len() <= max_width {
            current_line.push(' ');
            current_line.push_str(word);
        } else {
            lines.push(current_line);
            current_line = word.to_string();
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(s.to_string());
    }

    lines
}
