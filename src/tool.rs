//! Subprocess layer for `xcresulttool`.
//!
//! The tool has two calling conventions: the `get object` form of newer
//! Xcode releases and the `get --legacy` form. Every operation is tried
//! with both, in the configured order, and the first success wins:
//!
//! - dump:  `<tool> xcresulttool get object --path <bundle> --format json`
//! - fetch: `<tool> xcresulttool get object --path <bundle> --id <ref>`
//!
//! (`get object` is replaced with `get --legacy` for the alternate form.)
//!
//! Spawning goes through [`CommandRunner`] so the fallback logic can be
//! driven by a scripted runner in tests.

use std::ffi::OsString;
use std::fmt;
use std::path::Path;
use std::process::Command;

use clap::ValueEnum;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::TOOL_SUBCOMMAND;

/// A single program invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program to execute
    pub program: String,
    /// Arguments, not including the program. Paths are kept as OS strings
    /// so they reach the subprocess unchanged.
    pub args: Vec<OsString>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append an argument
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Captured result of running a command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Whether the process exited with status zero
    pub success: bool,
    /// Exit code, if the process ran and exited normally
    pub code: Option<i32>,
    /// Raw standard output
    pub stdout: Vec<u8>,
    /// Raw standard error
    pub stderr: Vec<u8>,
}

impl ToolOutput {
    /// A successful run with the given stdout
    pub fn ok(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            success: true,
            code: Some(0),
            stdout: stdout.into(),
            stderr: Vec::new(),
        }
    }

    /// A failed run with the given exit code and stderr
    pub fn failed(code: Option<i32>, stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            success: false,
            code,
            stdout: Vec::new(),
            stderr: stderr.into(),
        }
    }

    /// Standard error decoded for display
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Trait for command runners
///
/// A runner never fails: a process that cannot be spawned is reported as
/// a failed [`ToolOutput`] carrying the spawn error in `stderr`.
pub trait CommandRunner {
    fn run(&self, spec: &CommandSpec) -> ToolOutput;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, spec: &CommandSpec) -> ToolOutput {
        (**self).run(spec)
    }
}

/// Runs commands as real subprocesses, blocking until they exit
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> ToolOutput {
        match Command::new(&spec.program).args(&spec.args).output() {
            Ok(output) => ToolOutput {
                success: output.status.success(),
                code: output.status.code(),
                stdout: output.stdout,
                stderr: output.stderr,
            },
            Err(e) => ToolOutput::failed(None, format!("failed to run {}: {}", spec.program, e)),
        }
    }
}

/// Run each candidate in turn and return the first success, or the last
/// failure if none succeeds.
pub fn run_with_fallback<R: CommandRunner + ?Sized>(
    runner: &R,
    candidates: &[CommandSpec],
) -> ToolOutput {
    let mut last = ToolOutput::failed(None, Vec::new());
    for (attempt, spec) in candidates.iter().enumerate() {
        if attempt > 0 {
            warn!("Previous form failed, falling back to: {}", spec);
        }
        debug!("Running: {}", spec);
        let output = runner.run(spec);
        if output.success {
            return output;
        }
        debug!(
            "Command exited with {:?}: {}",
            output.code,
            output.stderr_text().trim()
        );
        last = output;
    }
    last
}

/// Order in which the two `xcresulttool` calling conventions are tried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CommandOrder {
    /// `get object` first, then `get --legacy`
    #[default]
    #[value(alias = "object")]
    ObjectFirst,
    /// `get --legacy` first, then `get object`
    #[value(alias = "legacy")]
    LegacyFirst,
}

impl CommandOrder {
    /// Parse from string (`object-first`, `legacy-first`)
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "object-first" | "object" => Some(CommandOrder::ObjectFirst),
            "legacy-first" | "legacy" => Some(CommandOrder::LegacyFirst),
            _ => None,
        }
    }

    fn forms(self) -> [Form; 2] {
        match self {
            CommandOrder::ObjectFirst => [Form::Object, Form::Legacy],
            CommandOrder::LegacyFirst => [Form::Legacy, Form::Object],
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Form {
    Object,
    Legacy,
}

/// Facade over `xcresulttool` for one launcher program
#[derive(Debug, Clone)]
pub struct XcResultTool<R> {
    runner: R,
    program: String,
    order: CommandOrder,
}

impl<R: CommandRunner> XcResultTool<R> {
    pub fn new(runner: R, program: impl Into<String>, order: CommandOrder) -> Self {
        Self {
            runner,
            program: program.into(),
            order,
        }
    }

    /// Access the underlying runner
    pub fn runner(&self) -> &R {
        &self.runner
    }

    fn base(&self, form: Form, bundle: &Path) -> CommandSpec {
        let spec = CommandSpec::new(&self.program).arg(TOOL_SUBCOMMAND).arg("get");
        let spec = match form {
            Form::Object => spec.arg("object"),
            Form::Legacy => spec.arg("--legacy"),
        };
        spec.arg("--path").arg(bundle)
    }

    /// Candidate commands for dumping the whole bundle as JSON
    pub fn dump_commands(&self, bundle: &Path) -> Vec<CommandSpec> {
        self.order
            .forms()
            .into_iter()
            .map(|form| self.base(form, bundle).arg("--format").arg("json"))
            .collect()
    }

    /// Candidate commands for fetching one payload
    pub fn fetch_commands(&self, bundle: &Path, id: &str) -> Vec<CommandSpec> {
        self.order
            .forms()
            .into_iter()
            .map(|form| self.base(form, bundle).arg("--id").arg(id))
            .collect()
    }

    /// Dump the bundle as JSON text. On failure the last attempt's output
    /// is returned so its stderr can be reported.
    pub fn dump(&self, bundle: &Path) -> Result<String, ToolOutput> {
        let output = run_with_fallback(&self.runner, &self.dump_commands(bundle));
        if output.success {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(output)
        }
    }

    /// Fetch the raw bytes of a payload. The final attempt's stdout is
    /// returned as-is, even when every form failed.
    pub fn fetch(&self, bundle: &Path, id: &str) -> Vec<u8> {
        let output = run_with_fallback(&self.runner, &self.fetch_commands(bundle, id));
        if !output.success {
            warn!(
                "Could not fetch payload {}: {}",
                id,
                output.stderr_text().trim()
            );
        }
        output.stdout
    }
}
