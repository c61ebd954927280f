//! Tesseract command line backend.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

use image::DynamicImage;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, trace};

use crate::error::OcrError;
use crate::models::config::OcrConfig;

use super::preprocessing::encode_png;
use super::{OcrBackend, OrientationEstimate, RecognitionConfig};

lazy_static! {
    static ref OSD_ROTATE: Regex = Regex::new(r"Rotate:\s*(\d+)").unwrap();
    static ref OSD_CONFIDENCE: Regex =
        Regex::new(r"Orientation confidence:\s*([0-9]+(?:\.[0-9]+)?)").unwrap();
}

/// Runs the `tesseract` binary, passing images as PNG on stdin.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    binary: String,
    language: String,
    tessdata_dir: Option<PathBuf>,
}

impl TesseractCli {
    /// Create a backend for the given binary and language string.
    pub fn new(binary: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            language: language.into(),
            tessdata_dir: None,
        }
    }

    pub fn from_config(config: &OcrConfig) -> Self {
        Self {
            binary: config.tesseract_binary.clone(),
            language: config.language.clone(),
            tessdata_dir: config.tessdata_dir.clone(),
        }
    }

    /// Set the tessdata directory.
    pub fn with_tessdata_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tessdata_dir = Some(dir.into());
        self
    }

    /// Arguments for a recognition run reading stdin and writing stdout.
    fn recognition_args(&self, config: &RecognitionConfig) -> Vec<String> {
        let mut args = vec!["stdin".to_string(), "stdout".to_string()];
        if let Some(dir) = &self.tessdata_dir {
            args.push("--tessdata-dir".to_string());
            args.push(dir.display().to_string());
        }
        args.push("-l".to_string());
        args.push(self.language.clone());
        args.push("--psm".to_string());
        args.push(config.page_seg_mode.as_psm().to_string());
        if config.preserve_interword_spaces {
            args.push("-c".to_string());
            args.push("preserve_interword_spaces=1".to_string());
        }
        if let Some(whitelist) = config.char_whitelist {
            args.push("-c".to_string());
            args.push(format!("tessedit_char_whitelist={whitelist}"));
        }
        args
    }

    fn orientation_args(&self) -> Vec<String> {
        let mut args = vec!["stdin".to_string(), "stdout".to_string()];
        if let Some(dir) = &self.tessdata_dir {
            args.push("--tessdata-dir".to_string());
            args.push(dir.display().to_string());
        }
        args.extend(["-l", "osd", "--psm", "0"].map(String::from));
        args
    }

    fn run(&self, args: &[String], input: &[u8]) -> Result<Output, OcrError> {
        trace!("Running {} {}", self.binary, args.join(" "));

        let mut child = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| OcrError::Unavailable(format!("{}: {}", self.binary, e)))?;

        // The child may exit before reading stdin, so it is always reaped and
        // its own stderr takes precedence over the broken pipe.
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(input),
            None => Ok(()),
        };

        let output = child
            .wait_with_output()
            .map_err(|e| OcrError::Recognition(e.to_string()))?;

        match written {
            Err(e) if output.status.success() => Err(OcrError::Recognition(format!(
                "writing image to {}: {}",
                self.binary, e
            ))),
            _ => Ok(output),
        }
    }
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self::from_config(&OcrConfig::default())
    }
}

impl OcrBackend for TesseractCli {
    fn recognize(&self, image: &DynamicImage, config: &RecognitionConfig) -> Result<String, OcrError> {
        let png = encode_png(image)?;
        let output = self.run(&self.recognition_args(config), &png)?;

        if !output.status.success() {
            return Err(OcrError::Recognition(stderr_message(&output)));
        }

        let text = String::from_utf8_lossy(&output.stdout)
            .trim_end_matches(['\u{c}', '\n'])
            .to_string();
        debug!("tesseract --psm {} returned {} bytes", config.page_seg_mode.as_psm(), text.len());
        Ok(text)
    }

    fn detect_orientation(&self, image: &DynamicImage) -> Result<OrientationEstimate, OcrError> {
        let png = encode_png(image)?;
        let output = self.run(&self.orientation_args(), &png)?;

        if !output.status.success() {
            return Err(OcrError::Orientation(stderr_message(&output)));
        }

        // Depending on the version the report lands on stdout or stderr.
        let report = format!(
            "{}\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        parse_osd(&report)
    }

    fn probe(&self) -> Result<String, OcrError> {
        let output = Command::new(&self.binary)
            .arg("--version")
            .output()
            .map_err(|e| OcrError::Unavailable(format!("{}: {}", self.binary, e)))?;

        if !output.status.success() {
            return Err(OcrError::Unavailable(stderr_message(&output)));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let version = stdout
            .lines()
            .chain(stderr.lines())
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("tesseract")
            .to_string();
        Ok(version)
    }
}

/// Parse the `--psm 0` orientation report.
fn parse_osd(report: &str) -> Result<OrientationEstimate, OcrError> {
    let rotate = OSD_ROTATE
        .captures(report)
        .and_then(|c| c[1].parse::<u32>().ok())
        .ok_or_else(|| OcrError::Orientation("no rotation in OSD output".to_string()))?;

    let confidence = OSD_CONFIDENCE
        .captures(report)
        .and_then(|c| c[1].parse::<f32>().ok())
        .unwrap_or(0.0);

    Ok(OrientationEstimate { rotate, confidence })
}

fn stderr_message(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if stderr.is_empty() {
        format!("exited with {}", output.status)
    } else {
        stderr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_osd() {
        let report = "Page number: 0\n\
                      Orientation in degrees: 270\n\
                      Rotate: 90\n\
                      Orientation confidence: 4.61\n\
                      Script: Latin\n\
                      Script confidence: 2.33\n";
        let estimate = parse_osd(report).unwrap();
        assert_eq!(estimate.rotate, 90);
        assert!((estimate.confidence - 4.61).abs() < 1e-6);
    }

    #[test]
    fn test_parse_osd_without_rotation() {
        assert!(matches!(
            parse_osd("Too few characters. Skipping this page"),
            Err(OcrError::Orientation(_))
        ));
    }

    #[test]
    fn test_recognition_args() {
        let cli = TesseractCli::new("tesseract", "deu+eng").with_tessdata_dir("/opt/tessdata");

        let args = cli.recognition_args(&RecognitionConfig::NUMERIC_BLOCK);
        assert_eq!(
            args,
            vec![
                "stdin",
                "stdout",
                "--tessdata-dir",
                "/opt/tessdata",
                "-l",
                "deu+eng",
                "--psm",
                "6",
                "-c",
                "preserve_interword_spaces=1",
                "-c",
                "tessedit_char_whitelist=0123456789.,'-CHFEUR€",
            ]
        );
    }

    #[test]
    fn test_single_column_args_have_no_options() {
        let args = TesseractCli::default().recognition_args(&RecognitionConfig::SINGLE_COLUMN);
        assert_eq!(args, vec!["stdin", "stdout", "-l", "deu+eng", "--psm", "4"]);
    }

    /// Noisy RGB image whose PNG encoding is larger than a pipe buffer.
    fn incompressible_image() -> DynamicImage {
        let mut state: u32 = 0x2545_f491;
        let image = image::RgbImage::from_fn(300, 300, |_, _| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            let [r, g, b, _] = state.to_le_bytes();
            image::Rgb([r, g, b])
        });
        DynamicImage::ImageRgb8(image)
    }

    #[cfg(unix)]
    #[test]
    fn test_engine_exiting_before_reading_reports_its_stderr() {
        // `sh` takes "stdin" as a script path and exits without reading the image.
        let cli = TesseractCli::new("sh", "eng");
        let image = incompressible_image();

        for _ in 0..3 {
            match cli.recognize(&image, &RecognitionConfig::BLOCK) {
                Err(OcrError::Recognition(message)) => {
                    assert!(message.contains("stdin"), "unexpected message: {message}");
                    assert!(!message.contains("Broken pipe"));
                }
                other => panic!("expected a recognition error, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_missing_binary_is_unavailable() {
        let cli = TesseractCli::new("beleg-no-such-tesseract", "eng");
        assert!(matches!(cli.probe(), Err(OcrError::Unavailable(_))));

        let image = DynamicImage::new_luma8(4, 4);
        assert!(matches!(
            cli.recognize(&image, &RecognitionConfig::BLOCK),
            Err(OcrError::Unavailable(_))
        ));
    }
}
