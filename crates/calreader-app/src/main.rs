use std::io::{Read, Write};

use calreader_core::config::load_config;
use calreader_service::import::{ImportOptions, TracingLogger, import_calendar};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    let (filter_layer, filter_handle) = reload::Layer::new(EnvFilter::new("info"));

    // stdout carries the JSON output
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    let config = load_config()?;

    tracing::debug!(config = ?config, "Configuration loaded");

    if let Ok(filter) = EnvFilter::try_new(config.logging.level.as_str()) {
        if let Err(e) = filter_handle.modify(|current| *current = filter) {
            tracing::warn!(error = %e, "Failed to update log filter from config");
        }
    } else {
        tracing::warn!(level = %config.logging.level, "Invalid log level in config, keeping info");
    }

    let options = ImportOptions::from_config(&config.import)?;

    let mut raw = String::new();
    std::io::stdin().read_to_string(&mut raw)?;
    tracing::info!(bytes = raw.len(), "Read calendar from stdin");

    let occurrences = import_calendar(&raw, &options, chrono::Utc::now(), &TracingLogger);
    tracing::info!(
        count = occurrences.len(),
        days_back = options.days_back,
        days_ahead = options.days_ahead,
        time_zone = %options.time_zone,
        "Import finished"
    );

    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &occurrences)?;
    writeln!(stdout)?;
    Ok(())
}
