use std::{fs::File, sync::Mutex};

use color_eyre::eyre::{Result, eyre};
use directories::ProjectDirs;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE: &str = "sunoji.log";
const DEFAULT_FILTER: &str = "sunoji=info,warn";

/// Sends logs to a file in the data directory; the terminal belongs to the
/// UI. `RUST_LOG` overrides the default filter.
pub fn initialize_logging() -> Result<()> {
    let dirs = ProjectDirs::from("in", "kishorbhagwat", "sunoji")
        .ok_or_else(|| eyre!("could not resolve a data directory"))?;
    let log_dir = dirs.data_local_dir();
    std::fs::create_dir_all(log_dir)?;
    let log_path = log_dir.join(LOG_FILE);
    let log_file = File::create(&log_path)?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let file_layer = fmt::layer()
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(ErrorLayer::default())
        .try_init()?;

    tracing::info!(path = %log_path.display(), "logging_initialized");
    Ok(())
}
