use std::{
  fs::{self, OpenOptions},
  path::Path,
  sync::Mutex,
};

use tracing_subscriber::{EnvFilter, fmt::{self, time::LocalTime}, prelude::*};

use crate::configs::LoggingConfig;

/// Builds the filter directive from the configured level and extra filters.
pub fn filter_directive(config: Option<&LoggingConfig>) -> String {
  config.map_or_else(|| "info".to_string(), LoggingConfig::directive)
}

/// Installs the global subscriber. Safe to call more than once; later calls are ignored.
pub fn init(config: Option<&LoggingConfig>) {
  // RUST_LOG wins over the configured directive
  let env_filter = EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| EnvFilter::new(filter_directive(config)));

  let stdout_layer = fmt::layer()
    .with_timer(LocalTime::rfc_3339())
    .with_target(true)
    .with_thread_ids(true)
    .with_line_number(true)
    .with_file(false);

  let file_layer = config.and_then(|l| l.file.as_deref()).and_then(|path| {
    if let Some(parent) = Path::new(path).parent() {
      if let Err(e) = fs::create_dir_all(parent) {
        eprintln!("Failed to create log directory: {}", e);
      }
    }

    match OpenOptions::new().create(true).append(true).open(path) {
      Ok(file) => Some(
        fmt::layer()
          .with_writer(Mutex::new(file))
          .with_timer(LocalTime::rfc_3339())
          .with_target(true)
          .with_thread_ids(true)
          .with_line_number(true)
          .with_file(false)
          .with_ansi(false),
      ),
      Err(e) => {
        eprintln!("Failed to open log file {}: {}", path, e);
        None
      }
    }
  });

  let _ = tracing_subscriber::registry()
    .with(env_filter)
    .with(stdout_layer)
    .with(file_layer)
    .try_init();
}
