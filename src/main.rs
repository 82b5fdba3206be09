//! Stacksynth CLI entrypoint.
//!
//! This is the main entrypoint for the stacksynth command-line tool.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use stacksynth::cli::{Cli, Commands, OutputFormatter};
use stacksynth::descriptor::{
    find_stack_file, DescriptorValidator, LoadedStack, OutputRegistry, StackParser,
};
use stacksynth::error::{DescriptorError, Result, SynthError};
use stacksynth::executor::{PlanRunner, SimulatedProvisioner};
use stacksynth::pipeline::Synthesizer;
use stacksynth::synth::PlanEmitter;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Runs the selected command.
async fn run(cli: Cli) -> Result<()> {
    let parser = StackParser::new();
    parser.load_dotenv()?;

    let formatter = OutputFormatter::new(cli.output);

    match cli.command {
        Commands::Validate { warnings } => {
            let stack = load_stack(&parser, cli.stack)?;
            let findings = DescriptorValidator::new().collect(&stack.set, &stack.registry);
            print!("{}", formatter.format_validation(&findings, warnings));
            if !findings.is_valid() {
                return Err(SynthError::internal(format!(
                    "{} validation errors",
                    findings.error_count()
                )));
            }
        }

        Commands::Plan { out, compact } => {
            let stack = load_stack(&parser, cli.stack)?;
            let mut synthesizer = Synthesizer::from_stack(stack);
            let plan = synthesizer.synthesize()?;
            print!("{}", formatter.format_plan(&plan));

            if let Some(path) = out {
                PlanEmitter::new()
                    .with_pretty(!compact)
                    .write_file(&plan, &path)?;
                info!("Plan written to {}", path.display());
            }
        }

        Commands::Rehearse { concurrency } => {
            let stack = load_stack(&parser, cli.stack)?;
            let mut synthesizer = Synthesizer::from_stack(stack);
            let plan = synthesizer.synthesize()?;

            let runner = PlanRunner::new(Arc::new(SimulatedProvisioner::new()))
                .with_max_concurrency(concurrency);
            let report = runner.execute(&plan).await?;
            print!("{}", formatter.format_report(&report));
        }

        Commands::Kinds => {
            // Use the stack file's registry extensions when a stack is
            // available; fall back to the built-ins.
            let registry = match resolve_stack_path(cli.stack) {
                Some(path) => parser.load_file(path)?.registry,
                None => OutputRegistry::builtin(),
            };
            print!("{}", formatter.format_kinds(&registry));
        }
    }

    Ok(())
}

/// Loads the stack file from the CLI argument or the working directory.
fn load_stack(parser: &StackParser, path: Option<PathBuf>) -> Result<LoadedStack> {
    let path = resolve_stack_path(path).ok_or_else(|| {
        SynthError::Descriptor(DescriptorError::FileNotFound {
            path: PathBuf::from("stacksynth.stack.yaml"),
        })
    })?;
    parser.load_file(path)
}

/// Resolves the stack file path from the CLI argument or by probing the
/// working directory.
fn resolve_stack_path(path: Option<PathBuf>) -> Option<PathBuf> {
    path.or_else(|| find_stack_file("."))
}
