//! Process command - extract receipt facts from a single file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, info, warn};

use beleg_core::{validate_upload, NativePipeline, ReceiptFacts, ReceiptOutcome, TextSource};

/// Message shown when a receipt has no recognizable total.
pub const MISSING_TOTAL: &str = "Total amount not recognized. Check the receipt photo/PDF and try again.";

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF or image)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Fail when no total amount is recognized
    #[arg(long)]
    require_total: bool,

    /// Include the extracted text in the output
    #[arg(long)]
    show_text: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Text => "txt",
        }
    }
}

/// What gets printed for one processed receipt.
#[derive(Serialize)]
pub struct ReceiptReport<'a> {
    pub file: String,
    #[serde(flatten)]
    pub facts: &'a ReceiptFacts,
    pub source: TextSource,
    pub engine_errors: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<&'a str>,
}

impl<'a> ReceiptReport<'a> {
    pub fn new(path: &Path, outcome: &'a ReceiptOutcome, with_text: bool) -> Self {
        Self {
            file: path.display().to_string(),
            facts: &outcome.facts,
            source: outcome.source,
            engine_errors: outcome.engine_errors,
            text: with_text.then_some(outcome.text.as_str()),
        }
    }
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = super::load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let data = fs::read(&args.input)?;
    let file_name = args
        .input
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let kind = validate_upload(&data, file_name, config.upload.max_bytes())?;

    info!("Processing {} as {}", args.input.display(), kind);

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(format!("Reading {}...", kind));

    let pipeline = NativePipeline::from_config(&config);
    let outcome = tokio::task::spawn_blocking(move || pipeline.process(&data, kind)).await?;

    pb.finish_and_clear();

    if outcome.text.is_empty() && outcome.engine_errors > 0 {
        warn!(
            "No text extracted and {} engine errors; run `beleg health` to check the OCR setup",
            outcome.engine_errors
        );
    }

    if args.require_total && outcome.facts.total.is_none() {
        anyhow::bail!(MISSING_TOTAL);
    }

    let report = ReceiptReport::new(&args.input, &outcome, args.show_text);
    let output = format_report(&report, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

pub fn format_report(report: &ReceiptReport<'_>, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Csv => format_csv(report),
        OutputFormat::Text => Ok(format_text(report)),
    }
}

fn format_csv(report: &ReceiptReport<'_>) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(["file", "merchant_name", "chain_id", "total", "source"])?;
    wtr.write_record([
        report.file.as_str(),
        report.facts.merchant_name().unwrap_or_default(),
        report.facts.chain_id().unwrap_or_default(),
        &report.facts.total.map(|t| t.to_string()).unwrap_or_default(),
        source_label(report.source),
    ])?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(report: &ReceiptReport<'_>) -> String {
    let mut output = String::new();

    output.push_str(&format!("File:     {}\n", report.file));
    output.push_str(&format!(
        "Merchant: {}\n",
        report.facts.merchant_name().unwrap_or("-")
    ));
    output.push_str(&format!("Chain:    {}\n", report.facts.chain_id().unwrap_or("-")));
    match report.facts.total {
        Some(total) => output.push_str(&format!("Total:    {}\n", total)),
        None => output.push_str("Total:    -\n"),
    }
    output.push_str(&format!("Source:   {}\n", source_label(report.source)));

    if let Some(text) = report.text {
        output.push_str("\n--- extracted text ---\n");
        output.push_str(text);
        output.push('\n');
    }

    output
}

pub fn source_label(source: TextSource) -> &'static str {
    match source {
        TextSource::EmbeddedText => "embedded_text",
        TextSource::Ocr => "ocr",
        TextSource::Empty => "empty",
    }
}
