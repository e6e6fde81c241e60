use log::*;
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::json;
use sse::Manager;
use std::sync::Arc;
use std::time::Duration;

const EVENT_NAME: &str = "myEvent";

/// Publishes `{"newVal": <0..=1000>}` to a random channel every 150-400ms
/// until the chosen channel reports it is closed.
pub async fn publish_random_values(channels: Arc<Manager>) {
    let names: Vec<String> = channels.names().map(str::to_owned).collect();
    info!("Demo publisher started on {names:?}");

    loop {
        // ThreadRng is not Send, so it must not live across the sleep below
        let (name, value, delay) = {
            let mut rng = rand::thread_rng();
            let Some(name) = names.choose(&mut rng) else {
                warn!("Demo publisher has no channels to publish to");
                return;
            };
            (name, rng.gen_range(0..=1000), rng.gen_range(150..=400))
        };

        if let Some(channel) = channels.get(name) {
            match channel.publish_json(&json!({ "newVal": value }), Some(EVENT_NAME)) {
                Ok(id) => trace!("Demo event {id} published on {name}"),
                Err(e) if e.is_channel_closed() => break,
                Err(e) => warn!("Demo publish on {name} failed: {e}"),
            }
        }

        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    info!("Demo publisher stopped");
}
