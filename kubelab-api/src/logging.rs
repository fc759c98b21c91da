///! Logging setup
///! Console output plus optional rolling JSON files

use crate::config::LoggingConfig;
use std::io;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const LOG_FILE_PREFIX: &str = "kubelab-api.log";

impl LoggingConfig {
    /// Build the filter: `RUST_LOG` wins over the configured level
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level))
    }

    /// Install the global subscriber
    ///
    /// The returned guard flushes the file writer on drop and must be held
    /// for the lifetime of the process.
    pub fn init(&self) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error>> {
        let console_layer = if self.json_console {
            fmt::layer()
                .with_target(true)
                .json()
                .with_writer(io::stdout)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_ansi(true)
                .with_writer(io::stdout)
                .boxed()
        };

        let guard = match self.log_dir {
            Some(ref dir) => {
                std::fs::create_dir_all(dir)?;
                let (writer, guard) = non_blocking(rolling::daily(dir, LOG_FILE_PREFIX));

                let file_layer = fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_ansi(false)
                    .json()
                    .with_writer(writer);

                tracing_subscriber::registry()
                    .with(self.env_filter())
                    .with(console_layer)
                    .with(file_layer)
                    .try_init()?;

                Some(guard)
            }
            None => {
                tracing_subscriber::registry()
                    .with(self.env_filter())
                    .with(console_layer)
                    .try_init()?;

                None
            }
        };

        tracing::info!(level = %self.level, file = self.log_dir.is_some(), "Logging initialized");

        Ok(guard)
    }
}
