use crate::router::not_found;
use crate::Error;
use axum::body::Body;
use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::{HeaderMap, HeaderName};
use axum::response::Response;
use futures::StreamExt;
use log::*;
use serde::Deserialize;
use service::AppState;
use sse::transport::{StreamHead, StreamTransport};
use sse::EventFilter;
use std::convert::Infallible;
use std::net::SocketAddr;

static LAST_EVENT_ID: HeaderName = HeaderName::from_static("last-event-id");

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StreamParams {
    /// Comma separated event names; entries wrapped in `/.../` are regular expressions.
    events: Option<String>,
}

/// SSE handler that subscribes the request to a channel.
/// The channel owns the stream from here on: it ends when the client goes
/// away, when the channel closes it, or at the channel's max stream duration.
pub(crate) async fn sse_handler(
    Path(channel_name): Path<String>,
    Query(params): Query<StreamParams>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    State(app_state): State<AppState>,
) -> Result<Response, Error> {
    // If the requested channel doesn't exist, answer like any unknown route
    let Some(channel) = app_state.channel(&channel_name) else {
        return Ok(not_found().await);
    };

    let filter = params.events.as_deref().map(EventFilter::parse).transpose()?;
    let remote_addr = connect_info.map(|ConnectInfo(addr)| addr.ip().to_canonical());
    let last_event_id = headers
        .get(&LAST_EVENT_ID)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    debug!(
        "Establishing SSE connection on {channel_name} for {remote_addr:?} (filter: {:?})",
        params.events
    );

    let (transport, frames) = StreamTransport::new(remote_addr, last_event_id);
    channel.subscribe(transport.clone(), filter)?;

    let head = transport
        .take_head()
        .unwrap_or_else(|| StreamHead::for_options(channel.options()));

    let mut response = Response::new(Body::from_stream(frames.map(Ok::<_, Infallible>)));
    *response.status_mut() = head.status;
    *response.headers_mut() = head.headers;

    Ok(response)
}
