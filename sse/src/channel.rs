use crate::connection::{ConnectionInfo, ConnectionRegistry, Scope, SubscriberId};
use crate::error::{Error, ErrorKind, Result};
use crate::filter::EventFilter;
use crate::frame;
use crate::history::History;
use crate::message::{Message, Payload};
use crate::options::ChannelOptions;
use crate::transport::{StreamHead, Transport};
use axum::body::Bytes;
use log::*;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Why a subscriber left the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    Unsubscribed,
    PeerClosed,
    Timeout,
    WriteFailed,
    ChannelClosed,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let reason = match self {
            CloseReason::Unsubscribed => "unsubscribed",
            CloseReason::PeerClosed => "client went away",
            CloseReason::Timeout => "max stream duration reached",
            CloseReason::WriteFailed => "write failed",
            CloseReason::ChannelClosed => "channel closed",
        };
        f.write_str(reason)
    }
}

/// Handle to one subscription. Holding it is not required to keep the stream open.
#[derive(Clone)]
pub struct Subscriber {
    id: SubscriberId,
    transport: Arc<dyn Transport>,
    cancel: CancellationToken,
}

impl Subscriber {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// True once the subscriber has been removed or its stream has ended.
    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled() || self.transport.is_finished()
    }
}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Mutable channel state. ID assignment, history and the registry change
/// together under one lock so frames are queued in ID order.
struct State {
    active: bool,
    next_id: u64,
    history: History,
    registry: ConnectionRegistry,
}

struct Inner {
    options: ChannelOptions,
    head: StreamHead,
    state: Mutex<State>,
    /// Parent of every subscriber token and of the ping task.
    shutdown: CancellationToken,
}

/// A broadcast channel for one event stream topic.
///
/// Cloning is cheap and every clone refers to the same channel. Building a
/// channel with a ping interval spawns a timer task, so it must happen inside
/// a tokio runtime.
#[derive(Clone)]
pub struct Channel {
    inner: Arc<Inner>,
}

impl Channel {
    pub fn new(options: ChannelOptions) -> Self {
        let inner = Arc::new(Inner {
            head: StreamHead::for_options(&options),
            state: Mutex::new(State {
                active: true,
                next_id: options.start_id,
                history: History::new(options.history_size),
                registry: ConnectionRegistry::new(),
            }),
            shutdown: CancellationToken::new(),
            options,
        });

        if let Some(period) = inner.options.ping_interval {
            tokio::spawn(ping(Arc::downgrade(&inner), period, inner.shutdown.clone()));
        }

        info!(
            "Created SSE channel (start_id={}, history_size={}, rewind={})",
            inner.options.start_id, inner.options.history_size, inner.options.rewind
        );

        Self { inner }
    }

    /// Publish an event to every matching subscriber.
    ///
    /// With neither payload nor event name this is a keep-alive ping: it goes to
    /// every subscriber, consumes no ID, is not recorded, and is skipped
    /// entirely when nobody is listening. An empty payload is still data.
    /// Returns the assigned ID for
    /// data-bearing events and `None` for pings.
    pub fn publish(&self, payload: Option<Payload>, event: Option<&str>) -> Result<Option<u64>> {
        self.inner.publish(payload, event)
    }

    /// Publish any serializable value as a JSON payload.
    pub fn publish_json<T: Serialize + ?Sized>(&self, value: &T, event: Option<&str>) -> Result<u64> {
        let payload = Payload::json(value)?;
        let id = self.inner.publish(Some(payload), event)?;
        // A present payload always makes a data-bearing frame
        Ok(id.unwrap_or_default())
    }

    /// Open a stream on `transport`.
    ///
    /// Queues a `retry:` directive and the replay window, registers the
    /// subscriber, then writes the response head. An integer `Last-Event-ID`
    /// on the transport replays everything after that ID still in history (a
    /// negative one replays all of it); otherwise the configured rewind applies.
    pub fn subscribe(
        &self,
        transport: Arc<dyn Transport>,
        filter: Option<EventFilter>,
    ) -> Result<Subscriber> {
        let inner = &self.inner;
        let last_seen = transport.last_event_id().and_then(parse_last_event_id);
        let (queue, frames) = mpsc::unbounded_channel();
        let cancel = inner.shutdown.child_token();

        let id = {
            let mut state = inner.state.lock();
            if !state.active {
                return Err(Error::channel_closed());
            }

            let count = match last_seen {
                Some(last_seen) => replay_count(state.next_id, last_seen),
                None => inner.options.rewind,
            };

            let mut preamble = frame::retry(inner.options.client_retry_interval).into_bytes();
            for replayed in state.history.replay_window(filter.as_ref(), count) {
                preamble.extend_from_slice(&replayed);
            }
            // The receiver is held right here, so this cannot fail
            let _ = queue.send(Bytes::from(preamble));

            state.registry.register(ConnectionInfo {
                filter,
                queue,
                transport: Arc::clone(&transport),
                cancel: cancel.clone(),
                remote_addr: transport.remote_addr(),
            })
        };

        // The driver is not spawned yet, so the head still precedes every chunk
        transport.write_head(inner.head.clone());

        debug!(
            "Subscribed SSE client {id} from {:?} (last_event_id={last_seen:?})",
            transport.remote_addr()
        );

        tokio::spawn(drive(
            Arc::downgrade(inner),
            id,
            Arc::clone(&transport),
            frames,
            cancel.clone(),
            inner.options.max_stream_duration,
        ));

        Ok(Subscriber {
            id,
            transport,
            cancel,
        })
    }

    /// Remove a subscriber and end its stream. Safe to call repeatedly and
    /// after the stream has already closed.
    pub fn unsubscribe(&self, subscriber: &Subscriber) {
        self.inner.release(subscriber.id, CloseReason::Unsubscribed);
        subscriber.cancel.cancel();
        subscriber.transport.end();
    }

    /// End every stream, drop the history and stop the ping timer. The
    /// channel rejects all later publish and subscribe calls.
    pub fn close(&self) {
        let drained = {
            let mut state = self.inner.state.lock();
            if !state.active {
                return;
            }
            state.active = false;
            state.history.clear();
            state.registry.drain()
        };

        self.inner.shutdown.cancel();
        for (id, info) in &drained {
            debug!("Closing SSE client {id}: {}", CloseReason::ChannelClosed);
            info.transport.end();
        }

        info!("Closed SSE channel, disconnected {} subscriber(s)", drained.len());
    }

    /// Number of subscribers per client address.
    pub fn list_clients(&self) -> HashMap<IpAddr, usize> {
        self.inner.state.lock().registry.count_by_remote_address()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.state.lock().registry.len()
    }

    pub fn is_active(&self) -> bool {
        self.inner.state.lock().active
    }

    /// Number of data-bearing frames currently held for replay.
    pub fn history_len(&self) -> usize {
        self.inner.state.lock().history.len()
    }

    pub fn options(&self) -> &ChannelOptions {
        &self.inner.options
    }
}

impl Inner {
    fn publish(&self, payload: Option<Payload>, event: Option<&str>) -> Result<Option<u64>> {
        let event = event.filter(|name| !name.is_empty());
        if event.is_some_and(|name| name.contains(['\r', '\n'])) {
            return Err(Error::new(ErrorKind::InvalidEventName));
        }

        let mut state = self.state.lock();
        if !state.active {
            return Err(Error::channel_closed());
        }

        let (frame, id, scope) = match (payload, event) {
            (None, None) => {
                if state.registry.is_empty() {
                    return Ok(None);
                }
                (frame::ping(), None, Scope::Broadcast)
            }
            (payload, event) => {
                let data = payload.as_ref().map(Payload::to_text).transpose()?;
                let id = state.next_id;
                state.next_id += 1;

                let frame = frame::encode(id, event, data.as_deref());
                state.history.append(Message {
                    id,
                    event: event.map(str::to_owned),
                    frame: frame.clone(),
                });
                (frame, Some(id), Scope::Event(event))
            }
        };

        let failed = state.registry.deliver(&frame, scope);
        let dropped: Vec<_> = failed
            .into_iter()
            .filter_map(|id| state.registry.unregister(id).map(|info| (id, info)))
            .collect();
        drop(state);

        for (id, info) in dropped {
            debug!("Removed SSE client {id}: {}", CloseReason::WriteFailed);
            info.cancel.cancel();
            info.transport.end();
        }

        trace!("Published SSE frame (id={id:?}, event={event:?})");
        Ok(id)
    }

    /// Remove a subscriber from the registry. Returns whether it was still present.
    fn release(&self, id: SubscriberId, reason: CloseReason) -> bool {
        let removed = self.state.lock().registry.unregister(id).is_some();
        if removed {
            debug!("Removed SSE client {id}: {reason}");
        }
        removed
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Lenient `Last-Event-ID` parsing: anything that is not an integer is
/// ignored and the configured rewind applies instead.
fn parse_last_event_id(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

/// How many frames a reconnecting client has missed. A negative last seen ID
/// predates every issued ID.
fn replay_count(next_id: u64, last_seen: i64) -> usize {
    let Ok(last_seen) = u64::try_from(last_seen) else {
        return usize::MAX;
    };
    let last_issued = next_id.saturating_sub(1);
    usize::try_from(last_issued.saturating_sub(last_seen)).unwrap_or(usize::MAX)
}

/// Keep-alive timer. Stops when the channel is closed or dropped.
async fn ping(inner: Weak<Inner>, period: Duration, shutdown: CancellationToken) {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                let Some(inner) = inner.upgrade() else { break };
                if inner.publish(None, None).is_err() {
                    break;
                }
            }
        }
    }

    trace!("SSE ping timer stopped");
}

/// Per-subscriber task: writes queued frames to the transport and enforces
/// the stream's lifetime. Every way out removes the subscriber and ends the
/// transport, so unsubscribe, client hang-up and timeout all converge here.
async fn drive(
    inner: Weak<Inner>,
    id: SubscriberId,
    transport: Arc<dyn Transport>,
    mut frames: UnboundedReceiver<Bytes>,
    cancel: CancellationToken,
    max_duration: Duration,
) {
    let deadline = time::sleep(max_duration);
    tokio::pin!(deadline);

    let reason = loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break None,
            _ = transport.closed() => break Some(CloseReason::PeerClosed),
            _ = &mut deadline => break Some(CloseReason::Timeout),
            frame = frames.recv() => match frame {
                Some(frame) => {
                    if let Err(e) = transport.write(frame).await {
                        warn!("Failed to write to SSE client {id}: {e}");
                        break Some(CloseReason::WriteFailed);
                    }
                }
                // The registry dropped our queue: someone else removed us
                None => break None,
            },
        }
    };

    if let (Some(reason), Some(inner)) = (reason, inner.upgrade()) {
        inner.release(id, reason);
    }
    cancel.cancel();
    transport.end();
}
