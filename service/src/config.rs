use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;
use sse::ChannelOptions;
use std::time::Duration;

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// The host interface to listen for incoming connections
    #[arg(short, long, env, default_value = "127.0.0.1")]
    pub interface: Option<String>,

    /// The host TCP port to listen for incoming connections
    #[arg(short, long, env, default_value_t = 3101)]
    pub port: u16,

    /// Directory of static files served next to the event streams
    #[arg(long, env, default_value = "./public")]
    pub static_dir: String,

    /// Milliseconds between keep-alive pings on idle streams (0 disables pinging)
    #[arg(long, env, default_value_t = 3000)]
    pub ping_interval_ms: u64,

    /// Milliseconds a single stream may stay open before the server closes it
    #[arg(long, env, default_value_t = 30_000)]
    pub max_stream_duration_ms: u64,

    /// Reconnection delay in milliseconds advertised to clients via `retry:`
    #[arg(long, env, default_value_t = 1000)]
    pub client_retry_interval_ms: u64,

    /// The ID given to the first event published on a channel
    #[arg(long, env, default_value_t = 1)]
    pub start_id: u64,

    /// How many events each channel keeps for replay on reconnection
    #[arg(long, env, default_value_t = 100)]
    pub history_size: usize,

    /// How many past events a new client receives when it sends no Last-Event-ID
    #[arg(long, env, default_value_t = 0)]
    pub rewind: usize,

    /// Do not start the demo publisher that pushes random events
    #[arg(long, env)]
    pub disable_demo_publisher: bool,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap()),
        )]
    pub log_level_filter: LevelFilter,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    pub fn interface(&self) -> &str {
        self.interface.as_deref().unwrap_or("127.0.0.1")
    }

    /// The socket address the HTTP server binds to.
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.interface(), self.port)
    }

    /// Channel options built from the stream flags.
    pub fn channel_options(&self) -> ChannelOptions {
        ChannelOptions::default()
            .with_ping_interval(Some(Duration::from_millis(self.ping_interval_ms)))
            .with_max_stream_duration(Duration::from_millis(self.max_stream_duration_ms))
            .with_client_retry_interval(Duration::from_millis(self.client_retry_interval_ms))
            .with_start_id(self.start_id)
            .with_history_size(self.history_size)
            .with_rewind(self.rewind)
    }

    pub fn demo_publisher_enabled(&self) -> bool {
        !self.disable_demo_publisher
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let argv = std::iter::once("sse_channel_rs").chain(args.iter().copied());
        Config::try_parse_from(argv).expect("valid arguments")
    }

    #[test]
    fn test_defaults_match_channel_defaults() {
        let config = parse(&[]);
        assert_eq!(config.listen_address(), "127.0.0.1:3101");
        assert_eq!(config.log_level_filter, LevelFilter::Info);
        assert!(config.demo_publisher_enabled());
        assert_eq!(config.channel_options(), ChannelOptions::default());
    }

    #[test]
    fn test_zero_ping_interval_disables_pings() {
        let config = parse(&["--ping-interval-ms", "0"]);
        assert_eq!(config.channel_options().ping_interval, None);
    }

    #[test]
    fn test_stream_flags_flow_into_channel_options() {
        let config = parse(&[
            "--max-stream-duration-ms",
            "20000",
            "--client-retry-interval-ms",
            "1234",
            "--start-id",
            "8777",
            "--history-size",
            "5",
            "--rewind",
            "2",
        ]);
        let options = config.channel_options();
        assert_eq!(options.max_stream_duration, Duration::from_secs(20));
        assert_eq!(options.client_retry_interval, Duration::from_millis(1234));
        assert_eq!(options.start_id, 8777);
        assert_eq!(options.history_size, 5);
        assert_eq!(options.rewind, 2);
    }

    #[test]
    fn test_rejects_unknown_log_level() {
        let argv = ["sse_channel_rs", "--log-level-filter", "LOUD"];
        assert!(Config::try_parse_from(argv).is_err());
    }
}
