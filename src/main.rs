use clap::Parser;
use std::error::Error;
use std::io::Write;
use std::path::PathBuf;

use xcresult_screenshots::config::{
    self, ENV_BUNDLE_PATH, ENV_COMMAND_ORDER, ENV_OUTPUT_DIR, ENV_TOOL_PROGRAM,
};
use xcresult_screenshots::{CommandOrder, Extractor};

/// Extract PNG screenshot attachments from an Xcode UI test result bundle
#[derive(Parser, Debug)]
#[command(
    name = "xcresult-screenshots",
    about = "Extract PNG screenshot attachments from an Xcode UI test result bundle",
    after_help = "ENVIRONMENT VARIABLES:\n\
        XCRESULT_SCREENSHOTS_BUNDLE       Result bundle to read\n\
        XCRESULT_SCREENSHOTS_OUTPUT_DIR   Directory for extracted PNGs\n\
        XCRESULT_SCREENSHOTS_TOOL         Launcher for xcresulttool\n\
        XCRESULT_SCREENSHOTS_ORDER        object-first or legacy-first\n\
        RUST_LOG                          Log filter (overrides --verbose)"
)]
struct Args {
    /// Path to the .xcresult bundle [default: UITestResults.xcresult]
    #[arg(short, long, env = ENV_BUNDLE_PATH)]
    bundle: Option<PathBuf>,

    /// Directory the screenshots are written to [default: Screenshots]
    #[arg(short, long, env = ENV_OUTPUT_DIR)]
    output: Option<PathBuf>,

    /// Program used to launch xcresulttool [default: xcrun]
    #[arg(long, env = ENV_TOOL_PROGRAM)]
    tool: Option<String>,

    /// Which xcresulttool calling convention to try first [default: object-first]
    #[arg(long, value_enum, env = ENV_COMMAND_ORDER)]
    order: Option<CommandOrder>,

    /// Also write <output>/manifest.json describing the run
    #[arg(long)]
    manifest: bool,

    /// Print debug diagnostics to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logger(args.verbose);

    // Flags and their env fallbacks override the cached defaults
    let mut config = config::get().clone();
    if let Some(bundle) = args.bundle {
        config = config.bundle_path(bundle);
    }
    if let Some(output) = args.output {
        config = config.output_dir(output);
    }
    if let Some(tool) = args.tool {
        config = config.tool_program(tool);
    }
    if let Some(order) = args.order {
        config = config.order(order);
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let report = Extractor::system(config).run(&mut out)?;

    if args.manifest {
        let path = report.write_manifest()?;
        writeln!(out, "Manifest: {}", path.display())?;
    }

    Ok(())
}

fn init_logger(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level).format_timestamp(None);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}
