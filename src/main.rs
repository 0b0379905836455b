// Entrypoint for the CLI application.
// - Keeps `main` small: parse arguments, configure logging, create an
//   API client and hand everything to the UI flow.
// - Returns `anyhow::Result` so transport failures surface as a plain
//   error message instead of a panic.

use anyhow::{anyhow, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use clap::Parser;
use immich_mp_encode::{api::ApiClient, ui};
use tracing_subscriber::EnvFilter;

/// Encode the extracted live video of a motion photo asset, given its
/// asset id. Use the special argument 'all' to automatically find and
/// encode all motion photos.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// URL of the Immich server
    #[arg(short, long)]
    server: String,

    /// Your API key
    #[arg(short, long)]
    key: String,

    /// Log level [trace, debug, info, warn, error]
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Only consider assets taken at or after this point in time
    /// (YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS)
    #[arg(long, value_parser = parse_taken_after)]
    taken_after: Option<NaiveDateTime>,

    /// Asset to encode, or 'all' to process every motion photo
    asset_id: String,
}

fn parse_taken_after(s: &str) -> std::result::Result<NaiveDateTime, String> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(dt);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|d| d.and_time(NaiveTime::MIN))
        .map_err(|_| format!("invalid date '{}', expected YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS", s))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging is process-wide state and stays in this layer; the API
    // client itself never touches it. Diagnostics go to stderr so they
    // do not interleave with the flow output on stdout.
    let filter = EnvFilter::try_new(&cli.log_level)
        .map_err(|_| anyhow!("Invalid log level: {}", cli.log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let api = ApiClient::new(&cli.server, &cli.key)?;
    ui::run(&api, &cli.asset_id, cli.taken_after)?;
    Ok(())
}
