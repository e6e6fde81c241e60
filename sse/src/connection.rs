use crate::filter::{self, EventFilter};
use crate::transport::Transport;
use axum::body::Bytes;
use log::*;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

/// Stable handle for a subscriber, unique for the lifetime of its channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Everything the channel keeps about a live subscriber.
pub(crate) struct ConnectionInfo {
    pub filter: Option<EventFilter>,
    /// Frames queued here are written to the transport by the subscriber's driver task.
    pub queue: UnboundedSender<Bytes>,
    pub transport: Arc<dyn Transport>,
    pub cancel: CancellationToken,
    pub remote_addr: Option<IpAddr>,
}

/// Which subscribers a frame is routed to.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Scope<'a> {
    /// Every subscriber, regardless of filter (keep-alive pings).
    Broadcast,
    /// Subscribers whose filter accepts this event name.
    Event(Option<&'a str>),
}

/// The live subscribers of one channel, with a secondary index counting
/// subscribers per remote address.
#[derive(Default)]
pub(crate) struct ConnectionRegistry {
    next_id: u64,
    /// Primary storage, iterated in subscription order.
    connections: BTreeMap<SubscriberId, ConnectionInfo>,
    /// Secondary index: subscriber count per client address.
    address_index: HashMap<IpAddr, usize>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, info: ConnectionInfo) -> SubscriberId {
        let id = SubscriberId(self.next_id);
        self.next_id += 1;

        if let Some(addr) = info.remote_addr {
            *self.address_index.entry(addr).or_default() += 1;
        }
        self.connections.insert(id, info);

        id
    }

    /// Remove a subscriber. Returns `None` if it was already gone.
    pub fn unregister(&mut self, id: SubscriberId) -> Option<ConnectionInfo> {
        let info = self.connections.remove(&id)?;

        if let Some(addr) = info.remote_addr {
            if let Some(count) = self.address_index.get_mut(&addr) {
                *count -= 1;
                // Clean up empty address entries
                if *count == 0 {
                    self.address_index.remove(&addr);
                }
            }
        }

        Some(info)
    }

    /// Queue `frame` for every subscriber in `scope`.
    ///
    /// Returns the subscribers whose queue is gone; the caller removes them.
    pub fn deliver(&self, frame: &Bytes, scope: Scope<'_>) -> Vec<SubscriberId> {
        let mut failed = Vec::new();

        self.for_each_matching(scope, |id, info| {
            if info.queue.send(frame.clone()).is_err() {
                warn!("Failed to queue event for SSE subscriber {id}. Subscriber will be removed.");
                failed.push(id);
            }
        });

        failed
    }

    pub fn for_each_matching<F>(&self, scope: Scope<'_>, mut f: F)
    where
        F: FnMut(SubscriberId, &ConnectionInfo),
    {
        for (id, info) in &self.connections {
            let wanted = match scope {
                Scope::Broadcast => true,
                Scope::Event(event) => filter::accepts(info.filter.as_ref(), event),
            };
            if wanted {
                f(*id, info);
            }
        }
    }

    /// Remove every subscriber at once.
    pub fn drain(&mut self) -> Vec<(SubscriberId, ConnectionInfo)> {
        self.address_index.clear();
        std::mem::take(&mut self.connections).into_iter().collect()
    }

    pub fn count_by_remote_address(&self) -> HashMap<IpAddr, usize> {
        self.address_index.clone()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
