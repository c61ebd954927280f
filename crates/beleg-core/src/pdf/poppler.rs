//! Poppler command line tools (`pdftotext`, `pdftoppm`).

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use image::DynamicImage;
use tracing::{debug, trace};

use super::{PdfBackend, Result};
use crate::error::PdfError;
use crate::models::config::PdfConfig;

const INPUT_NAME: &str = "input.pdf";
const PAGE_PREFIX: &str = "page";

/// PDF backend shelling out to Poppler.
///
/// Every call stages the document in its own temporary directory, which is
/// removed when the call returns.
#[derive(Debug, Clone)]
pub struct PopplerBackend {
    pdftotext: String,
    pdftoppm: String,
}

impl PopplerBackend {
    pub fn new(pdftotext: impl Into<String>, pdftoppm: impl Into<String>) -> Self {
        Self {
            pdftotext: pdftotext.into(),
            pdftoppm: pdftoppm.into(),
        }
    }

    pub fn from_config(config: &PdfConfig) -> Self {
        Self::new(config.pdftotext_binary.clone(), config.pdftoppm_binary.clone())
    }

    fn stage(&self, data: &[u8]) -> Result<(tempfile::TempDir, PathBuf)> {
        let dir = tempfile::Builder::new().prefix("beleg-pdf").tempdir()?;
        let input = dir.path().join(INPUT_NAME);
        std::fs::write(&input, data)?;
        Ok((dir, input))
    }
}

impl Default for PopplerBackend {
    fn default() -> Self {
        Self::from_config(&PdfConfig::default())
    }
}

impl PdfBackend for PopplerBackend {
    fn extract_text_layer(&self, data: &[u8]) -> Result<String> {
        let (_dir, input) = self.stage(data)?;

        let input = input.to_string_lossy();
        let output = run_tool(&self.pdftotext, &["-layout", &input, "-"])?;
        let text = String::from_utf8_lossy(&output.stdout).to_string();

        debug!("pdftotext returned {} chars", text.len());
        Ok(text)
    }

    fn rasterize(&self, data: &[u8], dpi: u32) -> Result<Vec<DynamicImage>> {
        let (dir, input) = self.stage(data)?;
        let prefix = dir.path().join(PAGE_PREFIX);

        run_tool(
            &self.pdftoppm,
            &[
                "-r",
                &dpi.to_string(),
                "-png",
                &input.to_string_lossy(),
                &prefix.to_string_lossy(),
            ],
        )?;

        let page_files = collect_page_files(dir.path())?;
        if page_files.is_empty() {
            return Err(PdfError::NoPages);
        }

        let mut pages = Vec::with_capacity(page_files.len());
        for (number, path) in page_files {
            trace!("Loading rendered page {} from {}", number, path.display());
            let page = image::open(&path)
                .map_err(|e| PdfError::Rasterize(format!("page {}: {}", number, e)))?;
            pages.push(page);
        }

        debug!("pdftoppm rendered {} pages at {} dpi", pages.len(), dpi);
        Ok(pages)
    }

    fn probe(&self) -> Result<String> {
        let mut versions = Vec::new();
        for tool in [&self.pdftotext, &self.pdftoppm] {
            // Poppler prints its version banner to stderr
            let output = Command::new(tool).arg("-v").output().map_err(|e| PdfError::Tool {
                tool: tool.clone(),
                message: e.to_string(),
            })?;
            let banner = String::from_utf8_lossy(&output.stderr);
            let line = banner.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or(tool);
            versions.push(line.to_string());
        }
        Ok(versions.join(", "))
    }
}

fn run_tool(tool: &str, args: &[&str]) -> Result<Output> {
    trace!("Running {} {}", tool, args.join(" "));

    let output = Command::new(tool).args(args).output().map_err(|e| PdfError::Tool {
        tool: tool.to_string(),
        message: e.to_string(),
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PdfError::Tool {
            tool: tool.to_string(),
            message: format!("{} ({})", stderr.trim(), output.status),
        });
    }

    Ok(output)
}

/// Rendered page files (`page-1.png`, `page-01.png`, ...) in page order.
fn collect_page_files(dir: &Path) -> Result<Vec<(u32, PathBuf)>> {
    let mut pages = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let number = name
            .strip_prefix(PAGE_PREFIX)
            .and_then(|rest| rest.strip_prefix('-'))
            .and_then(|rest| rest.strip_suffix(".png"))
            .and_then(|digits| digits.parse::<u32>().ok());
        if let Some(number) = number {
            pages.push((number, path));
        }
    }

    pages.sort_by_key(|(number, _)| *number);
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_collect_page_files_orders_numerically() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["page-10.png", "page-02.png", "page-1.png", "input.pdf", "page-x.png"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let numbers: Vec<u32> = collect_page_files(dir.path())
            .unwrap()
            .into_iter()
            .map(|(n, _)| n)
            .collect();
        assert_eq!(numbers, vec![1, 2, 10]);
    }

    #[test]
    fn test_missing_tool_is_reported() {
        let backend = PopplerBackend::new("beleg-no-such-pdftotext", "beleg-no-such-pdftoppm");

        let err = backend.extract_text_layer(b"%PDF-1.4").unwrap_err();
        assert!(matches!(err, PdfError::Tool { ref tool, .. } if tool == "beleg-no-such-pdftotext"));
        assert!(backend.probe().is_err());
    }
}
