use crate::controller::ApiResponse;
use crate::router::not_found;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::*;
use serde::Serialize;
use service::AppState;
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
pub(crate) struct ChannelClients {
    pub active: bool,
    pub subscribers: usize,
    /// Subscriber count per client address
    pub clients: BTreeMap<String, usize>,
}

/// GET the clients currently subscribed to a channel
pub async fn index(
    Path(channel_name): Path<String>,
    State(app_state): State<AppState>,
) -> Response {
    let Some(channel) = app_state.channel(&channel_name) else {
        return not_found().await;
    };

    let clients: BTreeMap<String, usize> = channel
        .list_clients()
        .into_iter()
        .map(|(addr, count)| (addr.to_string(), count))
        .collect();

    debug!("Listing {} client address(es) on {channel_name}", clients.len());

    Json(ApiResponse::new(
        StatusCode::OK.into(),
        ChannelClients {
            active: channel.is_active(),
            subscribers: channel.subscriber_count(),
            clients,
        },
    ))
    .into_response()
}
