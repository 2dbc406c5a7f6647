//! Configuration management with environment variable support.
//!
//! Every value has a default that matches a plain CI run: read
//! `UITestResults.xcresult` from the working directory and write PNGs to
//! `Screenshots/`. Command-line flags override whatever these resolve to.
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `XCRESULT_SCREENSHOTS_BUNDLE` | Result bundle to read | `UITestResults.xcresult` |
//! | `XCRESULT_SCREENSHOTS_OUTPUT_DIR` | Directory for extracted PNGs | `Screenshots` |
//! | `XCRESULT_SCREENSHOTS_TOOL` | Launcher for `xcresulttool` | `xcrun` |
//! | `XCRESULT_SCREENSHOTS_ORDER` | `object-first` or `legacy-first` | `object-first` |
//!
//! # Example
//!
//! ```bash
//! export XCRESULT_SCREENSHOTS_BUNDLE="build/UITests.xcresult"
//! export XCRESULT_SCREENSHOTS_ORDER="legacy-first"
//! ```

use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;

use crate::tool::CommandOrder;

// ============================================================================
// Default Values
// ============================================================================

/// Default result bundle path
pub const DEFAULT_BUNDLE_PATH: &str = "UITestResults.xcresult";

/// Default output directory
pub const DEFAULT_OUTPUT_DIR: &str = "Screenshots";

/// Default launcher program
pub const DEFAULT_TOOL_PROGRAM: &str = "xcrun";

/// Subcommand passed to the launcher
pub const TOOL_SUBCOMMAND: &str = "xcresulttool";

/// Deepest tree level inspected during the attachment walk
pub const MAX_WALK_DEPTH: usize = 20;

// ============================================================================
// Environment Variable Names
// ============================================================================

/// Environment variable for the bundle path
pub const ENV_BUNDLE_PATH: &str = "XCRESULT_SCREENSHOTS_BUNDLE";

/// Environment variable for the output directory
pub const ENV_OUTPUT_DIR: &str = "XCRESULT_SCREENSHOTS_OUTPUT_DIR";

/// Environment variable for the launcher program
pub const ENV_TOOL_PROGRAM: &str = "XCRESULT_SCREENSHOTS_TOOL";

/// Environment variable for the command form order
pub const ENV_COMMAND_ORDER: &str = "XCRESULT_SCREENSHOTS_ORDER";

// ============================================================================
// Configuration Getters (with caching)
// ============================================================================

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration (initialized from environment on first access)
pub fn get() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

/// Settings for one extraction run
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Result bundle to read
    pub bundle_path: PathBuf,
    /// Directory the PNGs are written to
    pub output_dir: PathBuf,
    /// Program that launches `xcresulttool`
    pub tool_program: String,
    /// Which command form is tried first
    pub order: CommandOrder,
}

impl Config {
    /// Create configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::defaults();
        Self {
            bundle_path: env::var(ENV_BUNDLE_PATH)
                .map(PathBuf::from)
                .unwrap_or(defaults.bundle_path),
            output_dir: env::var(ENV_OUTPUT_DIR)
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            tool_program: env::var(ENV_TOOL_PROGRAM).unwrap_or(defaults.tool_program),
            order: env::var(ENV_COMMAND_ORDER)
                .ok()
                .and_then(|s| CommandOrder::from_name(&s))
                .unwrap_or(defaults.order),
        }
    }

    /// Create configuration with all defaults (ignoring environment)
    pub fn defaults() -> Self {
        Self {
            bundle_path: PathBuf::from(DEFAULT_BUNDLE_PATH),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            tool_program: DEFAULT_TOOL_PROGRAM.to_string(),
            order: CommandOrder::default(),
        }
    }

    /// Override the bundle path
    pub fn bundle_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.bundle_path = path.into();
        self
    }

    /// Override the output directory
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Override the launcher program
    pub fn tool_program(mut self, program: impl Into<String>) -> Self {
        self.tool_program = program.into();
        self
    }

    /// Override the command form order
    pub fn order(mut self, order: CommandOrder) -> Self {
        self.order = order;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        get().clone()
    }
}
