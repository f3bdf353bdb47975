//! Application entry point and dispatch.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};

use fibntt_core::calculator::{Calculator, FibError};
use fibntt_core::constants::DEFAULT_PARALLEL_THRESHOLD;
use fibntt_core::number::host_endianness;
use fibntt_core::observers::{LoggingObserver, NoOpObserver};
use fibntt_core::options::Options;
use fibntt_core::progress::CancellationToken;
use fibntt_core::registry::DefaultFactory;
use fibntt_orchestration::calculator_selection::get_calculators_to_run;
use fibntt_orchestration::harness::{search, REPORT_HEADER};
use fibntt_orchestration::interfaces::{CalculationResult, ResultPresenter};
use fibntt_orchestration::orchestrator::{
    analyze_comparison_results, execute_calculations_with_observer,
};

use crate::config::AppConfig;
use crate::output::{write_to_file, CliPresenter, Format};

/// Run the application.
pub fn run(config: &AppConfig) -> Result<()> {
    // Handle shell completion
    if let Some(shell) = config.completion {
        let mut cmd = <AppConfig as clap::CommandFactory>::command();
        crate::completion::generate_completion(&mut cmd, shell, &mut io::stdout());
        return Ok(());
    }

    if config.endian {
        println!("{}", host_endianness());
        return Ok(());
    }

    let opts = Options {
        parallelism_log: config.parallelism,
        parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        verbose: config.verbose,
        ..Options::default()
    }
    .normalize();
    tracing::debug!(?opts, "options resolved");

    let factory = DefaultFactory::new();
    let calculators = get_calculators_to_run(&config.algo, &factory)?;

    // Set up Ctrl+C handler
    let cancel = CancellationToken::new();
    ctrlc_handler(cancel.clone())?;

    if config.search {
        return run_search(config, &calculators, &opts, &cancel);
    }
    run_cli(config, &calculators, &opts, &cancel)
}

fn run_cli(
    config: &AppConfig,
    calculators: &[Arc<dyn Calculator>],
    opts: &Options,
    cancel: &CancellationToken,
) -> Result<()> {
    let timeout = config.timeout_duration()?;
    let results = if config.verbose {
        let observer = LoggingObserver::new(500);
        execute_calculations_with_observer(
            calculators,
            config.n,
            opts,
            cancel,
            Some(timeout),
            &observer,
        )
    } else {
        execute_calculations_with_observer(
            calculators,
            config.n,
            opts,
            cancel,
            Some(timeout),
            &NoOpObserver::new(),
        )
    };

    let format = if config.hex { Format::Hex } else { Format::Decimal };
    let mut presenter = CliPresenter::new(
        io::stdout().lock(),
        io::stderr().lock(),
        format,
        config.verbose,
        config.quiet,
    );
    if config.output.is_some() {
        presenter = presenter.without_value();
    }

    for result in &results {
        match &result.outcome {
            Ok(value) => {
                presenter.present_result(&result.algorithm, config.n, value, result.duration)?;
            }
            Err(FibError::Overflow(..)) if results.len() > 1 => {}
            Err(e) => presenter.present_error(&result.algorithm, e)?,
        }
    }

    if results.len() > 1 {
        presenter.present_comparison(&results)?;
    }
    let (mut out, _) = presenter.into_inner();
    out.flush()?;

    if let Some(path) = &config.output {
        if let Some(value) = results.iter().find_map(CalculationResult::value) {
            write_to_file(path, value, format)
                .with_context(|| format!("cannot write {}", path.display()))?;
        }
    }

    if results.len() > 1 {
        analyze_comparison_results(&results)?;
    }
    first_failure(results)
}

/// Succeed when some backend produced a value; otherwise report why the
/// first one did not.
fn first_failure(results: Vec<CalculationResult>) -> Result<()> {
    if results.iter().any(|r| r.outcome.is_ok()) {
        return Ok(());
    }
    match results.into_iter().find_map(|r| r.outcome.err()) {
        Some(err) => Err(err.into()),
        None => Err(FibError::Calculation("no calculator ran".into()).into()),
    }
}

fn run_search(
    config: &AppConfig,
    calculators: &[Arc<dyn Calculator>],
    opts: &Options,
    cancel: &CancellationToken,
) -> Result<()> {
    let [calculator] = calculators else {
        return Err(FibError::Config("--search needs a single backend".into()).into());
    };
    let limits = config.limits()?;
    tracing::info!(algorithm = calculator.name(), ?limits, "starting search");

    let mut out = io::stdout().lock();
    if !config.json {
        writeln!(out, "{REPORT_HEADER}")?;
    }

    let mut write_error = None;
    let best = search(calculator.as_ref(), opts, cancel, &limits, |row| {
        if write_error.is_some() {
            return;
        }
        let written = if config.json {
            serde_json::to_string(row)
                .map_err(io::Error::from)
                .and_then(|line| writeln!(out, "{line}"))
        } else {
            writeln!(out, "{row}")
        };
        if let Err(e) = written {
            write_error = Some(e);
        }
    })?;
    if let Some(e) = write_error {
        return Err(e.into());
    }
    out.flush()?;

    eprintln!("# Recorded best: {best}");
    Ok(())
}

fn ctrlc_handler(cancel: CancellationToken) -> Result<()> {
    ctrlc::set_handler(move || {
        cancel.cancel();
    })
    .context("cannot install Ctrl+C handler")
}
