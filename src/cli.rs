//! Command-line arguments.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "muxd")]
#[command(about = "Serves one HTTP application over plaintext and TLS listeners", long_about = None)]
pub struct Cli {
    /// TOML configuration file. Environment variables override it.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// How long in-flight requests may run after shutdown is requested
    /// (e.g. `15s`, `500ms`, `1m`).
    #[arg(long, value_parser = parse_duration, default_value = "15s")]
    pub graceful_timeout: Duration,
}

/// Parse `<n>[ms|s|m|h]`. A bare number is seconds.
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split);

    let value: u64 = digits
        .parse()
        .map_err(|_| format!("invalid duration `{raw}`"))?;
    let duration = match unit {
        "ms" => Duration::from_millis(value),
        "" | "s" => Duration::from_secs(value),
        "m" => Duration::from_secs(value.saturating_mul(60)),
        "h" => Duration::from_secs(value.saturating_mul(3600)),
        other => return Err(format!("unknown duration unit `{other}` in `{raw}`")),
    };
    Ok(duration)
}
