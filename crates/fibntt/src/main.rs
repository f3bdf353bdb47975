//! fibntt: exact Fibonacci numbers by NTT fast doubling.

use std::process::ExitCode;

use clap::Parser;

use fibntt_core::constants::exit_codes;
use fibntt_lib::{app, config, errors};

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::Level::WARN.into())
                .from_env_lossy(),
        )
        .init();

    let config = match config::AppConfig::try_parse() {
        Ok(config) => config,
        // --help and --version
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            return exit(exit_codes::ERROR_CONFIG);
        }
    };

    match app::run(&config) {
        Ok(()) => exit(exit_codes::SUCCESS),
        Err(e) => {
            eprintln!("Error: {e:#}");
            exit(errors::exit_code(&e))
        }
    }
}

fn exit(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
