use crate::channel::Channel;
use crate::options::ChannelOptions;
use log::*;
use std::collections::BTreeMap;

/// A fixed set of named channels shared by the HTTP layer.
#[derive(Clone, Default)]
pub struct Manager {
    channels: BTreeMap<String, Channel>,
}

impl Manager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a channel under `name`, replacing (and closing) any previous one.
    pub fn open(&mut self, name: impl Into<String>, options: ChannelOptions) -> Channel {
        let name = name.into();
        let channel = Channel::new(options);
        if let Some(previous) = self.channels.insert(name.clone(), channel.clone()) {
            warn!("Replacing SSE channel {name}");
            previous.close();
        }
        info!("Opened SSE channel {name}");
        channel
    }

    pub fn get(&self, name: &str) -> Option<&Channel> {
        self.channels.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(String::as_str)
    }

    /// Close every channel, ending all of their streams.
    pub fn close_all(&self) {
        for (name, channel) in &self.channels {
            info!("Closing SSE channel {name}");
            channel.close();
        }
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}
