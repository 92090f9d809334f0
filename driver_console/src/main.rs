use std::{fs::OpenOptions, path::Path, sync::Arc};

use clap::Parser;
use driver_console::{
    broadcaster::{Command, TripBroadcaster},
    config::{Cli, Config},
    console,
    http_sink::HttpLocationSink,
    providers,
};
use tokio::sync::mpsc;
use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt, Layer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = Config::from_cli(Cli::parse())?;
    init_logging(&config.log_dir)?;

    tracing::info!("Starting driver console. Sending locations to {}", config.api_url);

    let provider = providers::from_config(&config);
    let sink = Arc::new(HttpLocationSink::new(&config.api_url));
    let broadcaster = TripBroadcaster::new(provider, sink);

    let (commands, commands_rx) = mpsc::channel(8);

    if config.autostart {
        commands.send(Command::Start).await?;
    }

    let interrupt = commands.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted");
            let _ = interrupt.send(Command::Quit).await;
        }
    });

    // End of input leaves the trip running. Only quit or ctrl-c closes the console.
    // The reader thread is not joined, so a pending read never delays exit.
    console::spawn_command_reader(std::io::BufReader::new(std::io::stdin()), commands);

    broadcaster
        .run(commands_rx, |view| print!("{}", console::render_panel(view)))
        .await;

    Ok(())
}

fn init_logging(log_dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(log_dir)?;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("driver_console.log"))?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| format!("{}=trace,trip_broadcaster_lib=trace", env!("CARGO_CRATE_NAME")).into())
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_filter(LevelFilter::WARN))
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file))
        .init();

    Ok(())
}
