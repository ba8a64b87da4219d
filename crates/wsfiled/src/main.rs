use clap::Parser;
use tokio::net::TcpListener;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use wsfiled::ServerState;
use wsfiled::net::ws::run_listener;

/// WebSocket file streaming server
#[derive(Parser, Debug)]
#[command(name = "wsfiled")]
#[command(about = "Streams local files and proxied web resources over one multiplexed WebSocket connection", long_about = None)]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:5050")]
    bind: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let listener = TcpListener::bind(&args.bind).await?;
    info!("wsfiled listening on {}", args.bind);
    info!("Log level: {}", args.log_level);

    run_listener(listener, ServerState::new()).await
}
