//! Parse command - derive facts from text that was already extracted.

use std::fs;
use std::io::Read;
use std::path::PathBuf;

use clap::Args;
use console::style;

use beleg_core::ReceiptParser;

/// Arguments for the parse command.
#[derive(Args)]
pub struct ParseArgs {
    /// Text file to parse, or "-" for stdin
    #[arg(default_value = "-")]
    input: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: ParseFormat,

    /// Print the rule that matched the total to stderr
    #[arg(long)]
    explain: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum ParseFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
}

pub fn run(args: ParseArgs) -> anyhow::Result<()> {
    let text = if args.input.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        if !args.input.exists() {
            anyhow::bail!("Input file not found: {}", args.input.display());
        }
        // Lossy so OCR dumps with stray bytes still parse.
        String::from_utf8_lossy(&fs::read(&args.input)?).into_owned()
    };

    let outcome = ReceiptParser::new().parse_detailed(&text);

    if args.explain {
        match &outcome.total_match {
            Some(m) => eprintln!(
                "{} total {} via rule '{}' (confidence {:.2})",
                style("ℹ").blue(),
                m.value,
                m.source,
                m.confidence
            ),
            None => eprintln!("{} no total found", style("ℹ").blue()),
        }
    }

    match args.format {
        ParseFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome.facts)?),
        ParseFormat::Text => {
            println!("Merchant: {}", outcome.facts.merchant_name().unwrap_or("-"));
            println!("Chain:    {}", outcome.facts.chain_id().unwrap_or("-"));
            match outcome.facts.total {
                Some(total) => println!("Total:    {}", total),
                None => println!("Total:    -"),
            }
        }
    }

    Ok(())
}
