use clap::Parser;
use rental_price_watch::config::Config;
use rental_price_watch::monitor::Monitor;
use std::path::Path;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "rental-price-watch", about = "Rental-car daily price monitor")]
struct Cli {
    /// Run a single check and mail the current price
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(config.target.debug, &config.logs_dir);

    let monitor = Monitor::from_config(&config);
    monitor.announce();

    if cli.once {
        let outcome = monitor.run_once().await;
        std::process::exit(outcome.exit_code());
    }

    monitor.run().await;
}

fn init_logging(debug: bool, logs_dir: &Path) {
    let default_filter = if debug {
        "info,rental_price_watch=debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());

    let file_layer = match open_log_file(logs_dir) {
        Ok(file) => Some(
            fmt::layer()
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file)),
        ),
        Err(e) => {
            eprintln!("⚠️  file logging disabled ({:?}): {}", logs_dir, e);
            None
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();
}

fn open_log_file(logs_dir: &Path) -> std::io::Result<std::fs::File> {
    std::fs::create_dir_all(logs_dir)?;
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(logs_dir.join("monitor.log"))
}
