use anyhow::Result;
use eventsource_client::{self as es, Client, ReconnectOptions};
use futures_util::stream::StreamExt;
use log::*;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub struct Event {
    pub id: Option<u64>,
    pub event_type: String,
    pub data: String,
}

impl Event {
    /// Pings carry no ID and an empty data line.
    pub fn is_ping(&self) -> bool {
        self.id.is_none() && self.data.is_empty()
    }
}

pub struct Connection {
    pub url: String,
    event_rx: mpsc::UnboundedReceiver<Event>,
    _handle: tokio::task::JoinHandle<()>,
}

impl Connection {
    /// Opens `/stream/{channel}`, optionally filtered and resuming after
    /// `last_event_id`. The connection is not re-established when the server
    /// ends the stream.
    pub async fn establish(
        base_url: &str,
        channel: &str,
        events: Option<&str>,
        last_event_id: Option<u64>,
    ) -> Result<Self> {
        let mut url = format!("{}/stream/{}", base_url.trim_end_matches('/'), channel);
        if let Some(events) = events {
            url.push_str("?events=");
            url.push_str(events);
        }
        let (tx, rx) = mpsc::unbounded_channel();

        let mut builder = es::ClientBuilder::for_url(&url)?
            .reconnect(ReconnectOptions::reconnect(false).build());
        if let Some(id) = last_event_id {
            builder = builder.header("Last-Event-ID", &id.to_string())?;
        }
        let client = builder.build();

        let label = url.clone();
        let handle = tokio::spawn(async move {
            let mut stream = client.stream();
            // The parser keeps reporting the last seen ID on later events
            let mut previous_id: Option<String> = None;

            loop {
                match stream.next().await {
                    Some(Ok(es::SSE::Event(event))) => {
                        let fresh_id = match event.id {
                            Some(id) if previous_id.as_ref() != Some(&id) => {
                                previous_id = Some(id.clone());
                                id.parse().ok()
                            }
                            _ => None,
                        };
                        let sse_event = Event {
                            id: fresh_id,
                            event_type: event.event_type,
                            data: event.data,
                        };

                        if tx.send(sse_event).is_err() {
                            debug!("SSE receiver dropped for {}", label);
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("SSE error for {}: {}", label, e);
                        break;
                    }
                    None => {
                        debug!("SSE stream ended for {}", label);
                        break;
                    }
                }
            }
        });

        Ok(Self {
            url,
            event_rx: rx,
            _handle: handle,
        })
    }

    /// Next event of any kind, or `None` once the stream has ended.
    pub async fn next_event(&mut self, timeout: Duration) -> Result<Option<Event>> {
        match tokio::time::timeout(timeout, self.event_rx.recv()).await {
            Ok(event) => Ok(event),
            Err(_) => anyhow::bail!("Timeout waiting for an event on {}", self.url),
        }
    }
}

/// Tracks that event IDs arrive consecutively.
#[derive(Debug, Default)]
pub struct IdContinuity {
    last: Option<u64>,
    gaps: Vec<(u64, u64)>,
}

impl IdContinuity {
    pub fn observe(&mut self, id: u64) {
        if let Some(last) = self.last {
            if id != last + 1 {
                self.gaps.push((last, id));
            }
        }
        self.last = Some(id);
    }

    pub fn last(&self) -> Option<u64> {
        self.last
    }

    /// Each gap as the (previous, received) ID pair.
    pub fn gaps(&self) -> &[(u64, u64)] {
        &self.gaps
    }
}
