use std::{path::PathBuf, time::Duration};

use clap::{Parser, ValueEnum};
use trip_broadcaster_lib::update::DEFAULT_API_URL;

#[derive(Parser, Debug)]
#[command(name = "driver_console")]
#[command(about = "Broadcast the van's live location during a trip", long_about = None)]
pub struct Cli {
    /// Base url of the location server
    #[arg(long, env = "TRIP_API_URL")]
    pub api_url: Option<String>,
    /// Where positions come from
    #[arg(long, value_enum, default_value_t = SourceKind::Simulated)]
    pub source: SourceKind,
    /// NMEA log to replay, for --source nmea-file
    #[arg(long)]
    pub nmea_file: Option<PathBuf>,
    /// host:port of an NMEA stream, for --source nmea-tcp
    #[arg(long)]
    pub nmea_addr: Option<String>,
    /// Time between fixes when replaying or simulating
    #[arg(long, default_value_t = 1000)]
    pub interval_ms: u64,
    /// Start the trip right away
    #[arg(long)]
    pub autostart: bool,
    #[arg(long, default_value = "log")]
    pub log_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    NmeaFile,
    NmeaTcp,
    Simulated,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationSource {
    NmeaFile(PathBuf),
    NmeaTcp(String),
    Simulated,
    Unavailable,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub source: LocationSource,
    pub interval: Duration,
    pub autostart: bool,
    pub log_dir: PathBuf,
}

impl Config {
    pub fn from_cli(cli: Cli) -> anyhow::Result<Self> {
        let source = match cli.source {
            SourceKind::NmeaFile => {
                let path = cli.nmea_file.ok_or_else(|| anyhow::anyhow!("--nmea-file is required for --source nmea-file"))?;
                LocationSource::NmeaFile(path)
            },
            SourceKind::NmeaTcp => {
                let addr = cli.nmea_addr.ok_or_else(|| anyhow::anyhow!("--nmea-addr is required for --source nmea-tcp"))?;
                LocationSource::NmeaTcp(addr)
            },
            SourceKind::Simulated => LocationSource::Simulated,
            SourceKind::None => LocationSource::Unavailable,
        };

        if cli.interval_ms == 0 {
            return Err(anyhow::anyhow!("--interval-ms must be positive"));
        }

        Ok(Self {
            api_url: resolve_api_url(cli.api_url),
            source,
            interval: Duration::from_millis(cli.interval_ms),
            autostart: cli.autostart,
            log_dir: cli.log_dir,
        })
    }
}

/// An unset or blank value falls back to the local server.
pub fn resolve_api_url(value: Option<String>) -> String {
    match value {
        Some(url) if !url.trim().is_empty() => url.trim().trim_end_matches('/').to_string(),
        _ => DEFAULT_API_URL.to_string(),
    }
}
