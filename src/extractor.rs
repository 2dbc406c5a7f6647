//! The screenshot extraction run.
//!
//! One call to [`Extractor::run`] does the whole job, strictly in order:
//! create the output directory, dump the bundle, walk the dump, and fetch
//! and write each PNG attachment as it is discovered. Progress lines go to
//! the writer passed in (stdout for the binary):
//!
//! ```text
//! Saved: Screenshots/login_screen.png
//! Total screenshots extracted: 1
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::attachment::{AttachmentRecord, find_attachments};
use crate::config::Config;
use crate::error::ExtractResult;
use crate::tool::{CommandRunner, SystemRunner, XcResultTool};
use crate::tree::Node;

/// File name of the optional JSON manifest inside the output directory
pub const MANIFEST_FILE: &str = "manifest.json";

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The bundle was dumped and walked
    Extracted,
    /// The bundle path does not exist
    BundleMissing,
    /// Every dump form failed
    BundleUnreadable { reason: String },
}

/// One written screenshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedScreenshot {
    /// Base name used for the file
    pub name: String,
    /// Path of the written file
    pub path: PathBuf,
    /// Payload reference the bytes were fetched with
    pub payload_id: String,
    /// Number of bytes written
    pub bytes: usize,
}

/// Summary of an extraction run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub bundle: PathBuf,
    pub output_dir: PathBuf,
    pub outcome: Outcome,
    /// Written files in discovery order
    pub screenshots: Vec<ExtractedScreenshot>,
    pub total: usize,
    pub generated_at: DateTime<Utc>,
}

impl ExtractionReport {
    fn new(config: &Config, outcome: Outcome, screenshots: Vec<ExtractedScreenshot>) -> Self {
        Self {
            bundle: config.bundle_path.clone(),
            output_dir: config.output_dir.clone(),
            outcome,
            total: screenshots.len(),
            screenshots,
            generated_at: Utc::now(),
        }
    }

    /// Write the report as pretty JSON to `<output_dir>/manifest.json`
    pub fn write_manifest(&self) -> ExtractResult<PathBuf> {
        let path = self.output_dir.join(MANIFEST_FILE);
        fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(path)
    }
}

/// Extracts PNG attachments from one result bundle
pub struct Extractor<R> {
    config: Config,
    tool: XcResultTool<R>,
}

impl Extractor<SystemRunner> {
    /// Extractor that runs the real `xcresulttool`
    pub fn system(config: Config) -> Self {
        Self::new(config, SystemRunner)
    }
}

impl<R: CommandRunner> Extractor<R> {
    pub fn new(config: Config, runner: R) -> Self {
        let tool = XcResultTool::new(runner, config.tool_program.clone(), config.order);
        Self { config, tool }
    }

    /// Access the tool facade (and through it, the runner)
    pub fn tool(&self) -> &XcResultTool<R> {
        &self.tool
    }

    /// Run the extraction, writing progress lines to `out`.
    ///
    /// A missing or unreadable bundle is not an error: the report says so
    /// and the total is zero. Only I/O failures on the output side and a
    /// malformed dump are returned as errors.
    pub fn run<W: Write>(&self, out: &mut W) -> ExtractResult<ExtractionReport> {
        let bundle = &self.config.bundle_path;
        fs::create_dir_all(&self.config.output_dir)?;

        if !bundle.exists() {
            writeln!(out, "No result bundle found at {}", bundle.display())?;
            return self.finish(out, Outcome::BundleMissing, Vec::new());
        }

        let text = match self.tool.dump(bundle) {
            Ok(text) => text,
            Err(failure) => {
                let reason = failure.stderr_text();
                writeln!(out, "Could not read xcresult: {}", reason)?;
                return self.finish(out, Outcome::BundleUnreadable { reason }, Vec::new());
            }
        };

        let root = Node::parse(&text)?;
        let mut screenshots: Vec<ExtractedScreenshot> = Vec::new();

        find_attachments(&root, 0, &mut |record: AttachmentRecord| -> ExtractResult<()> {
            if !record.is_extractable() {
                debug!(
                    "Skipping attachment {:?} ({:?}, payload {:?})",
                    record.name, record.uniform_type_identifier, record.payload_id
                );
                return Ok(());
            }
            let saved = self.save(bundle, &record, screenshots.len())?;
            writeln!(out, "Saved: {}", saved.path.display())?;
            screenshots.push(saved);
            Ok(())
        })?;

        self.finish(out, Outcome::Extracted, screenshots)
    }

    fn save(
        &self,
        bundle: &Path,
        record: &AttachmentRecord,
        count: usize,
    ) -> ExtractResult<ExtractedScreenshot> {
        let name = record.file_stem(count);
        let path = self.config.output_dir.join(format!("{}.png", name));
        let data = self.tool.fetch(bundle, &record.payload_id);
        fs::write(&path, &data)?;
        debug!("Wrote {} bytes to {}", data.len(), path.display());

        Ok(ExtractedScreenshot {
            name,
            path,
            payload_id: record.payload_id.clone(),
            bytes: data.len(),
        })
    }

    fn finish<W: Write>(
        &self,
        out: &mut W,
        outcome: Outcome,
        screenshots: Vec<ExtractedScreenshot>,
    ) -> ExtractResult<ExtractionReport> {
        let report = ExtractionReport::new(&self.config, outcome, screenshots);
        writeln!(out, "Total screenshots extracted: {}", report.total)?;
        Ok(report)
    }
}
