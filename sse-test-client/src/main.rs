use anyhow::Result;
use clap::Parser;
use colored::*;
use std::time::Duration;

mod output;
mod sse_client;

use output::{print_clients, print_event, print_summary, ClientListing};
use sse_client::{Connection, IdContinuity};

#[derive(Parser)]
#[command(name = "sse-test-client")]
#[command(about = "Subscribes to an SSE channel and checks event ID continuity")]
struct Cli {
    /// Base URL of the server (e.g., http://localhost:3101)
    #[arg(long, default_value = "http://127.0.0.1:3101")]
    base_url: String,

    /// Channel to subscribe to
    #[arg(long, default_value = "ch1")]
    channel: String,

    /// Comma separated event names to receive; /pattern/ entries are regular expressions
    #[arg(long)]
    events: Option<String>,

    /// Resume after this event ID
    #[arg(long)]
    last_event_id: Option<u64>,

    /// Stop after this many events (pings excluded)
    #[arg(long, default_value_t = 10)]
    count: usize,

    /// Seconds to wait for any single frame
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Enable verbose output
    #[arg(long, short)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    }

    let client = reqwest::Client::new();
    let clients_url = format!(
        "{}/stream/{}/clients",
        cli.base_url.trim_end_matches('/'),
        cli.channel
    );

    println!("{} Subscribing to {}...", "→".blue(), cli.channel);
    let mut connection = Connection::establish(
        &cli.base_url,
        &cli.channel,
        cli.events.as_deref(),
        cli.last_event_id,
    )
    .await?;

    let mut ids = IdContinuity::default();
    let mut received = 0;
    let mut pings = 0;
    let timeout = Duration::from_secs(cli.timeout_secs);

    while received < cli.count {
        let Some(event) = connection.next_event(timeout).await? else {
            println!("{} Stream ended by the server", "!".yellow());
            break;
        };

        if event.is_ping() {
            pings += 1;
            if cli.verbose {
                println!("{} ping", "·".dimmed());
            }
            continue;
        }

        // A filtered subscription legitimately skips IDs
        if let (Some(id), None) = (event.id, cli.events.as_ref()) {
            ids.observe(id);
        }
        received += 1;
        print_event(&event);

        if received == 1 {
            let listing: ClientListing = client.get(&clients_url).send().await?.json().await?;
            print_clients(&cli.channel, &listing.data);
        }
    }

    if let Some(last) = ids.last() {
        println!("{} Resume with --last-event-id {}", "→".blue(), last);
    }

    let passed = print_summary(received, pings, ids.gaps());
    std::process::exit(if passed { 0 } else { 1 });
}
