//! Application configuration from CLI flags and environment.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use fibntt_core::calculator::FibError;
use fibntt_orchestration::harness::Limits;

/// fibntt: exact Fibonacci numbers by NTT-accelerated fast doubling.
#[derive(Parser, Debug)]
#[command(name = "fibntt", version, about)]
#[allow(clippy::struct_excessive_bools)]
pub struct AppConfig {
    /// Fibonacci index to compute.
    #[arg(short, long, default_value = "10000000", env = "FIBNTT_N")]
    pub n: u64,

    /// Backend to use: ntt, fast, matrix, linear, naive (gmp with the
    /// feature), or all to cross-validate.
    #[arg(long, default_value = "ntt")]
    pub algo: String,

    /// Log2 of the task budget of one squaring step. 0 is sequential;
    /// absent derives it from the thread pool size.
    #[arg(long, env = "FIBNTT_PARALLELISM")]
    pub parallelism: Option<u32>,

    /// Print the result as a hex dump, most significant byte first.
    #[arg(long)]
    pub hex: bool,

    /// Write the result to this file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Quiet mode (only output the number).
    #[arg(short, long)]
    pub quiet: bool,

    /// Verbose output (print the full number).
    #[arg(short, long)]
    pub verbose: bool,

    /// Timeout duration (e.g., "5m", "30s", "500ms").
    #[arg(long, default_value = "5m")]
    pub timeout: String,

    /// Search for the largest index computed under the hard cut-off.
    #[arg(long)]
    pub search: bool,

    /// Emit search rows as JSON lines.
    #[arg(long, requires = "search")]
    pub json: bool,

    /// Stop the search after the growth phase.
    #[arg(long, requires = "search")]
    pub brief: bool,

    /// Search: slower indices end the exhaustive and sampling phases.
    #[arg(long, default_value = "1500ms")]
    pub soft_cutoff: String,

    /// Search: an index counts as best only when faster than this.
    #[arg(long, default_value = "1s")]
    pub hard_cutoff: String,

    /// Search: a single computation is cancelled after this.
    #[arg(long, default_value = "5s")]
    pub thread_timeout: String,

    /// Search: log2 of the number of refinement samples.
    #[arg(long, default_value = "10")]
    pub sample_log: u32,

    /// Print the host byte order and exit.
    #[arg(long)]
    pub endian: bool,

    /// Generate shell completion.
    #[arg(long, value_enum)]
    pub completion: Option<clap_complete::Shell>,
}

impl AppConfig {
    /// Parse CLI arguments.
    #[must_use]
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse timeout string into Duration.
    pub fn timeout_duration(&self) -> Result<Duration, FibError> {
        parse_flag_duration("--timeout", &self.timeout)
    }

    /// Search limits from the cut-off flags.
    pub fn limits(&self) -> Result<Limits, FibError> {
        Ok(Limits {
            soft_cutoff: parse_flag_duration("--soft-cutoff", &self.soft_cutoff)?,
            hard_cutoff: parse_flag_duration("--hard-cutoff", &self.hard_cutoff)?,
            thread_timeout: parse_flag_duration("--thread-timeout", &self.thread_timeout)?,
            sample_log: self.sample_log,
            brief: self.brief,
        })
    }
}

fn parse_flag_duration(flag: &str, value: &str) -> Result<Duration, FibError> {
    parse_duration(value)
        .ok_or_else(|| FibError::Config(format!("{flag}: cannot parse duration {value:?}")))
}

/// Parse a duration string like "5m", "1h", "30s", "500ms".
fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        let n: u64 = ms.parse().ok()?;
        Some(Duration::from_millis(n))
    } else if let Some(mins) = s.strip_suffix('m') {
        let n: u64 = mins.parse().ok()?;
        Some(Duration::from_secs(n.checked_mul(60)?))
    } else if let Some(hours) = s.strip_suffix('h') {
        let n: u64 = hours.parse().ok()?;
        Some(Duration::from_secs(n.checked_mul(3600)?))
    } else if let Some(secs) = s.strip_suffix('s') {
        let n: u64 = secs.parse().ok()?;
        Some(Duration::from_secs(n))
    } else {
        let n: u64 = s.parse().ok()?;
        Some(Duration::from_secs(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_formats() {
        assert_eq!(parse_duration("5m"), Some(Duration::from_secs(300)));
        assert_eq!(parse_duration("1h"), Some(Duration::from_secs(3600)));
        assert_eq!(parse_duration("30s"), Some(Duration::from_secs(30)));
        assert_eq!(parse_duration("12"), Some(Duration::from_secs(12)));
    }

    #[test]
    fn parse_duration_ms() {
        assert_eq!(parse_duration("1ms"), Some(Duration::from_millis(1)));
        assert_eq!(parse_duration("1500ms"), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn parse_duration_rejects_garbage() {
        assert_eq!(parse_duration("soon"), None);
        assert_eq!(parse_duration("-1s"), None);
    }

    #[test]
    fn default_limits_match_harness() {
        let config = AppConfig::try_parse_from(["fibntt", "--search"]).unwrap();
        assert_eq!(config.limits().unwrap(), Limits::default());
    }

    #[test]
    fn bad_timeout_is_config_error() {
        let config = AppConfig::try_parse_from(["fibntt", "--timeout", "later"]).unwrap();
        assert!(matches!(config.timeout_duration(), Err(FibError::Config(_))));
    }

    #[test]
    fn json_requires_search() {
        assert!(AppConfig::try_parse_from(["fibntt", "--json"]).is_err());
    }
}
