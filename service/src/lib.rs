use config::Config;
use log::info;
use sse::{ChannelOptions, Manager};
use std::sync::Arc;
use std::time::Duration;

pub mod config;
pub mod logging;

/// Start ID of the second demo channel.
const SECONDARY_START_ID: u64 = 3456;
/// Ping interval of the second demo channel.
const SECONDARY_PING_INTERVAL: Duration = Duration::from_millis(5000);

/// Opens the channels the server exposes: `ch1` with the configured options,
/// `ch2` with its own start ID and a slower ping.
pub fn init_channels(config: &Config) -> Manager {
    let options = config.channel_options();
    info!("Channel options: {options:?}");

    let mut channels = Manager::new();
    channels.open("ch1", options.clone());
    channels.open(
        "ch2",
        ChannelOptions {
            start_id: SECONDARY_START_ID,
            ping_interval: Some(SECONDARY_PING_INTERVAL),
            ..options
        },
    );
    channels
}

// Service-level state shared by every route
// Needs to implement Clone to be able to be passed into Router as State
#[derive(Clone)]
pub struct AppState {
    pub channels: Arc<Manager>,
    pub config: Config,
}

impl AppState {
    pub fn new(app_config: Config, channels: Manager) -> Self {
        Self {
            channels: Arc::new(channels),
            config: app_config,
        }
    }

    pub fn channel(&self, name: &str) -> Option<&sse::Channel> {
        self.channels.get(name)
    }
}
