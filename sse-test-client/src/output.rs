use crate::sse_client::Event;
use colored::*;
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
pub struct ClientListing {
    pub data: ChannelClients,
}

#[derive(Debug, Deserialize)]
pub struct ChannelClients {
    pub active: bool,
    pub subscribers: usize,
    pub clients: BTreeMap<String, usize>,
}

pub fn print_event(event: &Event) {
    let id = event
        .id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{} [{}] {} {}",
        "←".blue(),
        id.bright_white(),
        event.event_type.cyan(),
        event.data
    );
}

pub fn print_clients(channel: &str, listing: &ChannelClients) {
    let state = if listing.active {
        "active".green()
    } else {
        "closed".red()
    };
    println!(
        "{} {} is {} with {} subscriber(s)",
        "→".blue(),
        channel.bright_white(),
        state,
        listing.subscribers
    );
    for (address, count) in &listing.clients {
        println!("  {address}: {count}");
    }
}

pub fn print_summary(received: usize, pings: usize, gaps: &[(u64, u64)]) -> bool {
    println!("\n{}", "=== RESULTS ===".bright_white().bold());
    println!("Events received: {received}");
    println!("Pings received:  {pings}");

    for (previous, next) in gaps {
        println!(
            "{} Expected ID {} after {}, got {}",
            "✗".red(),
            previous + 1,
            previous,
            next
        );
    }

    if gaps.is_empty() {
        println!("\n{}", "Event IDs were consecutive ✓".bright_green().bold());
        true
    } else {
        println!("\n{}", "Event IDs had gaps ✗".bright_red().bold());
        false
    }
}
