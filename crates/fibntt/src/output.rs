//! CLI output formatting and the result presenter.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use fibntt_core::calculator::FibError;
use fibntt_core::number::Number;
use fibntt_orchestration::interfaces::{CalculationResult, ResultPresenter};

/// How a result is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Decimal,
    /// Every byte as two hex digits, most significant first.
    Hex,
}

impl Format {
    #[must_use]
    pub fn render(self, value: &Number) -> String {
        match self {
            Self::Decimal => value.to_string(),
            Self::Hex => value.to_hex(),
        }
    }
}

/// Format a decimal result for display, truncating long values.
#[must_use]
pub fn format_result(value: &Number, verbose: bool) -> String {
    let s = value.to_string();
    if !verbose && s.len() > 100 {
        format!("{}...{} ({} digits)", &s[..50], &s[s.len() - 50..], s.len())
    } else {
        s
    }
}

/// Format a duration for display.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 0.001 {
        format!("{:.2}µs", secs * 1_000_000.0)
    } else if secs < 1.0 {
        format!("{:.2}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{secs:.3}s")
    } else {
        let mins = (secs / 60.0).floor() as u64;
        let remaining = secs - (mins as f64 * 60.0);
        format!("{mins}m{remaining:.1}s")
    }
}

/// Format a number with thousand separators.
#[must_use]
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Write a result to a file, without a trailing newline.
pub fn write_to_file(path: &Path, value: &Number, format: Format) -> io::Result<()> {
    let mut file = BufWriter::new(File::create(path)?);
    file.write_all(format.render(value).as_bytes())?;
    file.flush()
}

/// CLI result presenter.
///
/// Results go to `out`, errors and the hex summary to `err`.
pub struct CliPresenter<O: Write, E: Write> {
    out: O,
    err: E,
    format: Format,
    verbose: bool,
    quiet: bool,
    show_value: bool,
}

impl<O: Write, E: Write> CliPresenter<O, E> {
    #[must_use]
    pub fn new(out: O, err: E, format: Format, verbose: bool, quiet: bool) -> Self {
        Self {
            out,
            err,
            format,
            verbose,
            quiet,
            show_value: true,
        }
    }

    /// Leave the value itself out, for results written to a file.
    #[must_use]
    pub fn without_value(mut self) -> Self {
        self.show_value = false;
        self
    }

    /// Hand back the writers.
    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }
}

impl<O: Write, E: Write> ResultPresenter for CliPresenter<O, E> {
    fn present_result(
        &mut self,
        algorithm: &str,
        n: u64,
        result: &Number,
        duration: Duration,
    ) -> io::Result<()> {
        if self.quiet {
            if self.show_value {
                writeln!(self.out, "{}", self.format.render(result))?;
            }
            return Ok(());
        }

        if self.format == Format::Hex {
            writeln!(
                self.err,
                "# Runtime: {}.{:09}s\n# Size:    {} B",
                duration.as_secs(),
                duration.subsec_nanos(),
                result.byte_len()
            )?;
            if self.show_value {
                writeln!(self.out, "{}", result.to_hex())?;
            }
            return Ok(());
        }

        writeln!(self.out, "Algorithm: {algorithm}")?;
        writeln!(self.out, "N: {}", format_number(n))?;
        writeln!(self.out, "Duration: {}", format_duration(duration))?;
        writeln!(self.out, "Size: {} B", result.byte_len())?;
        if self.show_value {
            writeln!(
                self.out,
                "F({}) = {}",
                format_number(n),
                format_result(result, self.verbose)
            )?;
        }
        Ok(())
    }

    fn present_comparison(&mut self, results: &[CalculationResult]) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }

        writeln!(self.out, "\nComparison Results:")?;
        writeln!(self.out, "{:-<60}", "")?;
        for result in results {
            let status = match &result.outcome {
                Ok(_) => "OK",
                Err(FibError::Overflow(..)) => "SKIPPED",
                Err(_) => "ERROR",
            };
            writeln!(
                self.out,
                "  {:<22} {:>10} [{}]",
                result.algorithm,
                format_duration(result.duration),
                status,
            )?;
        }
        Ok(())
    }

    fn present_error(&mut self, algorithm: &str, error: &FibError) -> io::Result<()> {
        writeln!(self.err, "Error: {algorithm}: {error}")
    }
}
