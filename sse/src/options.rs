use std::time::Duration;

/// Per-channel configuration. Immutable once the channel is built.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelOptions {
    /// How often an idle keep-alive frame is sent. `None` disables pinging.
    pub ping_interval: Option<Duration>,
    /// How long a single stream may stay open before it is closed server-side.
    pub max_stream_duration: Duration,
    /// Reconnection delay advertised to clients in the `retry:` directive.
    pub client_retry_interval: Duration,
    /// The ID assigned to the first data-bearing event.
    pub start_id: u64,
    /// How many data-bearing frames are kept for replay.
    pub history_size: usize,
    /// How many frames a new subscriber is sent when it carries no `Last-Event-ID`.
    pub rewind: usize,
}

impl Default for ChannelOptions {
    fn default() -> Self {
        Self {
            ping_interval: Some(Duration::from_millis(3000)),
            max_stream_duration: Duration::from_millis(30_000),
            client_retry_interval: Duration::from_millis(1000),
            start_id: 1,
            history_size: 100,
            rewind: 0,
        }
    }
}

impl ChannelOptions {
    pub fn with_ping_interval(mut self, interval: Option<Duration>) -> Self {
        self.ping_interval = interval.filter(|i| !i.is_zero());
        self
    }

    pub fn with_max_stream_duration(mut self, duration: Duration) -> Self {
        self.max_stream_duration = duration;
        self
    }

    pub fn with_client_retry_interval(mut self, interval: Duration) -> Self {
        self.client_retry_interval = interval;
        self
    }

    pub fn with_start_id(mut self, start_id: u64) -> Self {
        self.start_id = start_id;
        self
    }

    pub fn with_history_size(mut self, history_size: usize) -> Self {
        self.history_size = history_size;
        self
    }

    pub fn with_rewind(mut self, rewind: usize) -> Self {
        self.rewind = rewind;
        self
    }

    /// Seconds a shared cache may serve this stream: one second short of the
    /// maximum stream duration so the cached copy expires before the stream ends.
    pub fn shared_cache_max_age(&self) -> u64 {
        self.max_stream_duration.as_secs().saturating_sub(1)
    }
}
