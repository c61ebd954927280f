//! Health command - check the external OCR and PDF tools.

use clap::Args;
use console::style;

use beleg_core::extraction::ComponentHealth;
use beleg_core::NativePipeline;

/// Arguments for the health command.
#[derive(Args)]
pub struct HealthArgs {
    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

pub async fn run(args: HealthArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let pipeline = NativePipeline::from_config(&config);
    let health = tokio::task::spawn_blocking(move || pipeline.health()).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&health)?);
    } else {
        print_component("OCR engine", &health.ocr);
        print_component("PDF tools", &health.pdf);
    }

    if !health.is_healthy() {
        anyhow::bail!("Text extraction is not fully available; see the report above");
    }

    Ok(())
}

fn print_component(name: &str, component: &ComponentHealth) {
    let mark = if component.available {
        style("✓").green()
    } else {
        style("✗").red()
    };
    println!("{} {:<11} {}", mark, name, component.detail);
}
