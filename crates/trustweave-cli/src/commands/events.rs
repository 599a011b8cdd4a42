//! `trustweave events`: Replay the ledger event log.

use clap::Args;
use serde::Deserialize;

use crate::client::{NodeArgs, NodeClient};

#[derive(Args, Debug)]
pub struct EventsArgs {
    /// Only show events after this sequence number.
    #[arg(short, long, default_value_t = 0)]
    pub since: u64,

    /// Maximum number of events to fetch (the node caps this too).
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Print raw JSON records.
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub node: NodeArgs,
}

#[derive(Deserialize)]
struct EventsResponse {
    last_event_seq: u64,
    events: Vec<EventRecord>,
}

#[derive(Deserialize)]
struct EventRecord {
    seq: u64,
    event: serde_json::Value,
}

fn events_path(args: &EventsArgs) -> String {
    match args.limit {
        Some(limit) => format!("events?since={}&limit={limit}", args.since),
        None => format!("events?since={}", args.since),
    }
}

pub async fn run(args: &EventsArgs) -> anyhow::Result<()> {
    let client = NodeClient::new(&args.node);
    let resp: EventsResponse = client.get(&events_path(args)).await?;

    if resp.events.is_empty() {
        println!("No events after #{} (last is #{})", args.since, resp.last_event_seq);
        return Ok(());
    }
    for record in &resp.events {
        if args.json {
            println!("{}", serde_json::json!({ "seq": record.seq, "event": record.event }));
        } else {
            let kind = record.event["type"].as_str().unwrap_or("unknown");
            println!("#{:<6} {}", record.seq, kind);
        }
    }
    Ok(())
}
