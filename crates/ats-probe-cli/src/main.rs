//! ats-probe: run the ATS feature files
//!
//! ## Usage
//!
//! ```bash
//! ats-probe run                                   # @ATS scenarios in features/ATS
//! ats-probe run --profile parallel --jobs 4       # four browsers at once
//! ats-probe run --policy soft --headed            # keep going, watch it
//! ats-probe config                                # effective configuration
//! ats-probe steps                                 # step vocabulary
//! ```

use ats_probe_cli::{
    init_tracing, load_suite, render_step_table, steps::VOCABULARY, world::default_launcher, Cli,
    CliConfig, CliResult, Commands, ConfigArgs, RunArgs, RunSettings, SuiteRunner, Verbosity,
};
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(cli.color.into());
    init_tracing(&config);

    match cli.command {
        Commands::Run(args) => run_suite(&config, &args),
        Commands::Config(args) => run_config(&args),
        Commands::Steps => {
            print!("{}", render_step_table(&VOCABULARY));
            Ok(())
        }
    }
}

fn run_suite(config: &CliConfig, args: &RunArgs) -> CliResult<()> {
    let settings = RunSettings::resolve(args)?;
    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(SuiteRunner::new(settings, default_launcher(), config).run())
}

fn run_config(args: &ConfigArgs) -> CliResult<()> {
    let suite = load_suite(args.config.as_deref())?;
    print!("{}", suite.to_yaml()?);
    Ok(())
}
