//! Server-Sent Events (SSE) broadcast channels.
//!
//! This crate provides the channel engine behind every event stream the
//! server exposes: one long-lived, one-way stream multiplexed to many
//! subscribers, with reconnection replay and keep-alive pings.
//!
//! # Architecture
//!
//! - **Monotonic IDs**: every data-bearing event gets the next ID of its
//!   channel. Pings carry no ID and are never stored.
//! - **Bounded history**: the last `history_size` frames are kept so a client
//!   reconnecting with `Last-Event-ID` gets exactly what it missed.
//! - **Per-subscriber filters**: literal names or regular expressions; a
//!   filtered subscriber never sees unnamed events.
//! - **One lock, no I/O under it**: ID assignment, history and the subscriber
//!   registry change together under a single mutex. Frames are queued per
//!   subscriber and written to the transport by that subscriber's own task,
//!   so a slow client never stalls a publish.
//! - **Convergent teardown**: unsubscribe, client hang-up, write failure and
//!   the max stream duration all end in the same idempotent removal.
//!
//! # Message Flow
//!
//! 1. The HTTP layer builds a [`transport::StreamTransport`] for the request
//!    (remote address plus `Last-Event-ID` header).
//! 2. [`Channel::subscribe`] writes the response head, a `retry:` directive and
//!    the replay window, then registers the subscriber.
//! 3. [`Channel::publish`] assigns an ID, records the frame and queues it for
//!    every subscriber whose filter accepts the event name.
//! 4. The HTTP layer streams the [`transport::FrameStream`] as the response body.
//!
//! # Example
//!
//! ```rust,ignore
//! use sse::{Channel, ChannelOptions};
//! use sse::transport::StreamTransport;
//!
//! let channel = Channel::new(ChannelOptions::default());
//! let (transport, body) = StreamTransport::new(Some(remote_ip), last_event_id);
//! channel.subscribe(transport.clone(), None)?;
//! // respond with transport.take_head() and `body`
//!
//! channel.publish(Some("hello".into()), Some("greeting"))?;
//! ```
//!
//! # Modules
//!
//! - `channel`: the engine (publish, subscribe, unsubscribe, close)
//! - `connection`: subscriber registry with a per-address index
//! - `filter`: event name matching
//! - `frame`: SSE wire encoding
//! - `history`: bounded replay buffer
//! - `manager`: a named set of channels
//! - `message`: payloads and history entries
//! - `options`: channel configuration
//! - `transport`: the contract with the hosting HTTP layer

pub mod channel;
pub mod connection;
pub mod error;
pub mod filter;
pub mod frame;
pub mod history;
pub mod manager;
pub mod message;
pub mod options;
pub mod transport;

pub use channel::{Channel, CloseReason, Subscriber};
pub use error::{Error, ErrorKind, Result};
pub use filter::{EventFilter, EventMatcher};
pub use manager::Manager;
pub use message::Payload;
pub use options::ChannelOptions;
