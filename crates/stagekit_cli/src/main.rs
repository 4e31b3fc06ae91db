//! `stagekit` host binary: copy a source tree into a workspace and run the
//! configured passes over the copy.

mod conf;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use stagekit_io_fs::EnumPlatform;
use stagekit_pass::{PluginRegistry, ReportRun, SpecPipelineOptions, run_pipeline};
use tracing::warn;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "stagekit_cli=info,stagekit_io_fs=info,stagekit_pass=info";
const VERBOSE_LOG_FILTER: &str = "stagekit_cli=debug,stagekit_io_fs=debug,stagekit_pass=debug";

#[derive(Debug, Parser)]
#[command(
    name = "stagekit",
    version,
    about = "Stage a directory tree into a workspace and run cleanup passes on the copy"
)]
struct Cli {
    /// JSON run configuration.
    config: PathBuf,
    /// Scan and report only; nothing is copied.
    #[arg(long)]
    scan_only: bool,
    /// Print the run report as JSON on stdout.
    #[arg(long)]
    json: bool,
    /// Debug-level logging (overridden by RUST_LOG).
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(if_verbose: bool) {
    let c_default = if if_verbose {
        VERBOSE_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(c_default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn print_report(report_run: &ReportRun, if_json: bool) -> Result<()> {
    let mut stdout = io::stdout().lock();
    if if_json {
        serde_json::to_writer_pretty(&mut stdout, report_run)
            .context("failed to serialize run report")?;
        writeln!(stdout)?;
        return Ok(());
    }

    writeln!(stdout, "{}", report_run.report_scan)?;
    if let Some(report_stage) = &report_run.report_stage {
        writeln!(stdout, "{report_stage}")?;
    }
    for report_pass in &report_run.l_passes {
        writeln!(stdout, "{report_pass}")?;
        if let Some(path_log) = &report_pass.path_log {
            writeln!(stdout, "  log: {}", path_log.display())?;
        }
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<()> {
    let spec_run = conf::load_run_config(&cli.config)?;
    let spec_opts = SpecPipelineOptions {
        platform: EnumPlatform::current(),
        if_scan_only: cli.scan_only,
    };

    let report_run = run_pipeline(&spec_run, &spec_opts, &PluginRegistry::with_builtin())
        .context("stagekit run failed")?;
    if !report_run.report_scan.if_ready_to_process {
        warn!(
            source = %spec_run.path_dir_source.display(),
            "source tree is not ready for processing; check `source_path` and `target_folders`"
        );
    }
    print_report(&report_run, cli.json)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::{CommandFactory, Parser};

    use super::Cli;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_flags() {
        let cli = Cli::try_parse_from(["stagekit", "job.json", "--scan-only", "--json", "-v"])
            .expect("parse");
        assert_eq!(cli.config, PathBuf::from("job.json"));
        assert!(cli.scan_only);
        assert!(cli.json);
        assert!(cli.verbose);

        assert!(Cli::try_parse_from(["stagekit"]).is_err());
    }
}
