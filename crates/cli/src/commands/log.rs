use anyhow::Result;
use shirt_tracker_core::EventLogEntry;

use super::{AppContext, print_json};

pub(crate) fn run(ctx: &AppContext, query: &str, limit: usize, json: bool) -> Result<()> {
    let entries: Vec<EventLogEntry> =
        ctx.storage.load_event_log()?.into_iter().filter(|e| e.matches(query)).take(limit).collect();
    if json {
        return print_json(&entries);
    }
    if entries.is_empty() {
        println!("No changes logged");
    }
    for entry in &entries {
        println!("{}\t{}\t{}\t{}", entry.at, entry.tab_name, entry.action, entry.detail);
    }
    Ok(())
}
