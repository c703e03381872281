use anyhow::Result;
use chrono::Utc;
use owo_colors::OwoColorize;
use taskcal_core::gateway::{RecordQuery, RecordStore};
use taskcal_core::rules::pending_actions;
use taskcal_core::schedule::local_working_date;

use crate::airtable::AirtableStore;
use crate::config;

/// Dry run: list the records whose triggers would fire, without touching
/// the calendar or the store.
pub async fn run() -> Result<()> {
    let cfg = config::load_config()?;
    let store = AirtableStore::new(&cfg.airtable);

    let records = store.fetch(&RecordQuery::active_deadlines()).await?;
    let today = local_working_date(Utc::now());

    let mut pending = 0;
    for record in &records {
        let actions = pending_actions(record, today);
        if actions.is_empty() {
            continue;
        }
        pending += 1;

        let name = record.fields.name.as_deref().unwrap_or("(unnamed)");
        let labels: Vec<String> = actions.iter().map(ToString::to_string).collect();
        println!(
            "{} [{}]: {}",
            name.bold(),
            record.id,
            labels.join(", ").yellow()
        );
    }

    if pending == 0 {
        println!("Everything in sync ({} active records).", records.len());
    } else {
        println!(
            "\n{pending} of {} active records need reconciliation.",
            records.len()
        );
    }
    Ok(())
}
