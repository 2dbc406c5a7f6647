//! xcresult-screenshots - pull PNG screenshots out of Xcode result bundles.
//!
//! This crate provides:
//! - A subprocess layer over `xcresulttool` with primary/legacy fallback
//! - A generic tree for the bundle's JSON dump
//! - A depth-bounded walk for `ActionTestAttachment` records
//! - The extraction run that writes each PNG attachment to disk
//!
//! # Example
//!
//! ```rust,no_run
//! use xcresult_screenshots::{Config, Extractor};
//!
//! let config = Config::defaults().bundle_path("UITestResults.xcresult");
//! let report = Extractor::system(config).run(&mut std::io::stdout()).unwrap();
//! println!("{} files", report.total);
//! ```

pub mod attachment;
pub mod config;
pub mod error;
pub mod extractor;
pub mod tool;
pub mod tree;

// Re-export configuration and errors
pub use config::Config;
pub use error::{ExtractError, ExtractResult};

// Re-export the tool layer
pub use tool::{CommandOrder, CommandRunner, CommandSpec, SystemRunner, ToolOutput, XcResultTool, run_with_fallback};

// Re-export tree and attachment types
pub use attachment::{AttachmentRecord, collect_attachments, find_attachments};
pub use tree::Node;

// Re-export the extraction run
pub use extractor::{ExtractedScreenshot, ExtractionReport, Extractor, Outcome};
