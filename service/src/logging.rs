use crate::config::Config;
use log::{LevelFilter, SetLoggerError};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode, ThreadLogMode};

/// Modules to filter out from logging when not in Trace mode.
/// The HTTP stack logs every connection and chunk, which drowns out stream lifecycle logs.
const FILTERED_MODULES: &[&str] = &["tower", "tower_http", "hyper", "h2", "axum"];

pub struct Logger {}

impl Logger {
    /// Installs the global terminal logger at the configured level.
    ///
    /// Below Trace, dependency logs are filtered out so subscribe, unsubscribe
    /// and close events stay readable.
    pub fn init_logger(config: &Config) -> Result<(), SetLoggerError> {
        let level = config.log_level_filter;
        let log_config = Self::build_log_config(Self::should_filter_dependencies(level));

        TermLogger::init(level, log_config, TerminalMode::Mixed, ColorChoice::Auto)
    }

    /// Returns `false` for Trace level (show all logs), `true` for all other levels.
    fn should_filter_dependencies(level: LevelFilter) -> bool {
        level != LevelFilter::Trace
    }

    fn build_log_config(apply_filters: bool) -> simplelog::Config {
        let mut builder = ConfigBuilder::new();
        builder
            .set_time_format_rfc3339()
            .set_target_level(LevelFilter::Error)
            .set_thread_level(LevelFilter::Trace)
            .set_thread_mode(ThreadLogMode::Names);

        if apply_filters {
            for module in FILTERED_MODULES {
                builder.add_filter_ignore_str(module);
            }
        }

        builder.build()
    }
}
