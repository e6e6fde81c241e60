//! The contract between the channel engine and the HTTP layer hosting a stream.
//!
//! The engine never touches sockets. It writes a response head once, then raw
//! frame chunks, and ends the stream when a subscriber is removed. The hosting
//! layer reports client hang-ups through [`Transport::closed`].

use crate::error::{Error, Result};
use crate::options::ChannelOptions;
use async_stream::stream;
use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use futures::Stream;
use log::*;
use parking_lot::Mutex;
use std::net::IpAddr;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Status and headers that open an event stream.
#[derive(Debug, Clone)]
pub struct StreamHead {
    pub status: StatusCode,
    pub headers: HeaderMap,
}

impl StreamHead {
    /// The head for a stream on a channel configured with `options`.
    ///
    /// Shared caches may hold the stream for (almost) its whole lifetime so
    /// that many clients behind one cache share one upstream connection;
    /// clients themselves must never reuse it.
    pub fn for_options(options: &ChannelOptions) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/event-stream"),
        );
        let cache_control = format!(
            "s-maxage={}, max-age=0, stale-while-revalidate=0, stale-if-error=0",
            options.shared_cache_max_age()
        );
        if let Ok(value) = HeaderValue::from_str(&cache_control) {
            headers.insert(header::CACHE_CONTROL, value);
        }
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));

        Self {
            status: StatusCode::OK,
            headers,
        }
    }
}

/// A writable, closable response stream belonging to one subscriber.
///
/// The engine never calls into a transport with its coordination lock held.
/// `write_head` and `end` are synchronous and should still return promptly.
/// `write` is only ever awaited from the subscriber's own driver task.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Called exactly once, before any chunk is written.
    fn write_head(&self, head: StreamHead);

    /// Write one chunk of wire text. An error means the stream is gone.
    async fn write(&self, chunk: Bytes) -> Result<()>;

    /// Finish the response. Must be idempotent.
    fn end(&self);

    /// Whether the stream has been ended by either side.
    fn is_finished(&self) -> bool;

    /// Resolves once the client side of the stream has gone away.
    async fn closed(&self);

    /// The raw `Last-Event-ID` reconnection hint, if the client sent one.
    fn last_event_id(&self) -> Option<&str> {
        None
    }

    /// Address of the connected client, used to group subscribers.
    fn remote_addr(&self) -> Option<IpAddr> {
        None
    }
}

/// The body half of a [`StreamTransport`]: every chunk written to the transport,
/// in order. Dropping it signals that the client has gone away.
pub type FrameStream = Pin<Box<dyn Stream<Item = Bytes> + Send>>;

/// A queue-backed transport any HTTP server can wrap: chunks are buffered in
/// an unbounded channel and handed out through a [`FrameStream`].
pub struct StreamTransport {
    remote_addr: Option<IpAddr>,
    last_event_id: Option<String>,
    head: Mutex<Option<StreamHead>>,
    sender: Mutex<Option<mpsc::UnboundedSender<Bytes>>>,
    closed: CancellationToken,
}

impl StreamTransport {
    pub fn new(
        remote_addr: Option<IpAddr>,
        last_event_id: Option<String>,
    ) -> (Arc<Self>, FrameStream) {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let closed = CancellationToken::new();
        let guard = closed.clone().drop_guard();

        // Frames arrive from the channel until the transport is ended; the
        // guard fires the close notification when the body is dropped.
        let frames = stream! {
            let _guard = guard;
            while let Some(chunk) = rx.recv().await {
                yield chunk;
            }
        };

        let transport = Arc::new(Self {
            remote_addr,
            last_event_id,
            head: Mutex::new(None),
            sender: Mutex::new(Some(tx)),
            closed,
        });

        (transport, Box::pin(frames))
    }

    /// Take the head written by the engine, if it has been written.
    pub fn take_head(&self) -> Option<StreamHead> {
        self.head.lock().take()
    }

    fn send(&self, chunk: Bytes) -> Result<()> {
        match self.sender.lock().as_ref() {
            Some(tx) => tx.send(chunk).map_err(|_| Error::transport()),
            None => Err(Error::transport()),
        }
    }
}

#[async_trait]
impl Transport for StreamTransport {
    fn write_head(&self, head: StreamHead) {
        let mut slot = self.head.lock();
        if slot.is_some() {
            warn!("Ignoring second response head for SSE stream");
            return;
        }
        *slot = Some(head);
    }

    async fn write(&self, chunk: Bytes) -> Result<()> {
        self.send(chunk)
    }

    fn end(&self) {
        self.sender.lock().take();
    }

    fn is_finished(&self) -> bool {
        self.sender.lock().is_none() || self.closed.is_cancelled()
    }

    async fn closed(&self) {
        self.closed.cancelled().await
    }

    fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    fn remote_addr(&self) -> Option<IpAddr> {
        self.remote_addr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[test]
    fn test_head_for_options() {
        let options = ChannelOptions::default().with_max_stream_duration(std::time::Duration::from_secs(20));
        let head = StreamHead::for_options(&options);
        assert_eq!(head.status, StatusCode::OK);
        assert_eq!(head.headers[header::CONTENT_TYPE], "text/event-stream");
        assert_eq!(head.headers[header::CONNECTION], "keep-alive");

        let cache_control = head.headers[header::CACHE_CONTROL].to_str().unwrap();
        assert!(cache_control.contains("s-maxage=19"));
        assert!(cache_control.contains("max-age=0"));
    }

    #[tokio::test]
    async fn test_chunks_flow_until_end() {
        let (transport, mut frames) = StreamTransport::new(None, None);
        transport.write(Bytes::from_static(b"one")).await.unwrap();
        transport.write(Bytes::from_static(b"two")).await.unwrap();
        transport.end();
        transport.end();

        assert!(transport.is_finished());
        assert!(transport.write(Bytes::from_static(b"three")).await.is_err());
        assert_eq!(frames.next().await.unwrap(), "one");
        assert_eq!(frames.next().await.unwrap(), "two");
        assert!(frames.next().await.is_none());
    }

    #[tokio::test]
    async fn test_dropping_body_signals_closed() {
        let (transport, frames) = StreamTransport::new(None, None);
        assert!(!transport.is_finished());
        drop(frames);

        tokio::time::timeout(std::time::Duration::from_secs(1), transport.closed())
            .await
            .expect("close notification");
        assert!(transport.is_finished());
        assert!(transport.write(Bytes::from_static(b"late")).await.is_err());
    }

    #[test]
    fn test_head_is_written_once() {
        let (transport, _frames) = StreamTransport::new(None, Some("4".to_string()));
        let head = StreamHead::for_options(&ChannelOptions::default());
        transport.write_head(head.clone());
        transport.write_head(head);

        assert_eq!(transport.last_event_id(), Some("4"));
        assert!(transport.take_head().is_some());
        assert!(transport.take_head().is_none());
    }
}
