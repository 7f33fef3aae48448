use crate::config::AppConfig;
use log::LevelFilter;
use logfire::config::MetricsOptions;
use simplelog::{ConfigBuilder, SimpleLogger};

pub fn setup_simple_logger(level: LevelFilter) -> anyhow::Result<()> {
    let logger_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .add_filter_allow_str("voucher_checkout")
        .build();

    Ok(SimpleLogger::init(level, logger_config)?)
}

/// Installs Logfire when a token is configured, otherwise logs to stderr.
///
/// The returned handler must be shut down before exit to flush pending spans.
pub fn setup_logging(
    app_config: &AppConfig,
    level: LevelFilter,
) -> anyhow::Result<Option<logfire::ShutdownHandler>> {
    let Some(token) = app_config.logfire_token.as_deref() else {
        setup_simple_logger(level)?;
        return Ok(None);
    };

    let shutdown_handler = logfire::configure()
        .install_panic_handler()
        .with_metrics(Some(MetricsOptions::default()))
        .send_to_logfire(logfire::config::SendToLogfire::Yes)
        .with_token(token)
        .finish()?;

    Ok(Some(shutdown_handler))
}
