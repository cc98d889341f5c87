use anyhow::Result;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

pub const EXECUTION_LOG: &str = "execution.log";

/// Installs the global subscriber: human-readable output on stderr, plus an
/// appended `execution.log` under `log_dir` when one is configured.
///
/// `RUST_LOG` refines the default `pimon=info` filter.
pub fn init_logging(log_dir: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("pimon=info".parse()?);

    let file_layer = match log_dir {
        Some(dir) => {
            if dir.is_file() {
                anyhow::bail!("log directory '{}' is a file", dir.display());
            }
            std::fs::create_dir_all(dir)?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join(EXECUTION_LOG))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()?;
    Ok(())
}
