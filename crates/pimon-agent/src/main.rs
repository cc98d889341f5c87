use pimon_agent::config::AgentConfig;
use pimon_agent::logging::init_logging;
use pimon_agent::monitor::{relay_failure, Monitor};
use pimon_collector::host::HostCollector;
use pimon_collector::process::ProcessCollector;
use pimon_collector::Collector;
use pimon_notify::channels::log::LogChannel;
use pimon_notify::channels::telegram::TelegramChannel;
use pimon_notify::NotificationChannel;
use std::process::ExitCode;

fn notification_channel() -> Box<dyn NotificationChannel> {
    match TelegramChannel::from_env() {
        Ok(channel) => Box::new(channel),
        Err(e) => {
            tracing::warn!(error = %e, "Telegram not configured, falling back to log output");
            Box::new(LogChannel)
        }
    }
}

#[allow(clippy::print_stderr)]
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli_path = std::env::args().nth(1);
    let config = AgentConfig::resolve(cli_path.as_deref());

    let log_dir = config.as_ref().ok().and_then(|c| c.log_dir.clone());
    if let Err(e) = init_logging(log_dir.as_deref()) {
        eprintln!("pimon-agent: failed to initialise logging: {e:#}");
    }

    let channel = notification_channel();

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load agent configuration");
            relay_failure(channel.as_ref(), &format!("🔥 {e}")).await;
            return ExitCode::FAILURE;
        }
    };

    let host = config
        .hostname
        .clone()
        .unwrap_or_else(pimon_collector::host_name);
    let collectors: Vec<Box<dyn Collector>> = vec![
        Box::new(HostCollector::new()),
        Box::new(ProcessCollector::new()),
    ];

    let mut monitor = Monitor::new(config, collectors, channel, host);
    match monitor.execute().await {
        Ok(_) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}
