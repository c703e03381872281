use anyhow::Result;
use owo_colors::OwoColorize;
use taskcal_core::sync::{SyncReport, run_deadline_sync, run_today_sync};

use crate::airtable::AirtableStore;
use crate::config;
use crate::gcal::GoogleCalendar;

pub async fn run() -> Result<()> {
    let cfg = config::load_config()?;
    let store = AirtableStore::new(&cfg.airtable);
    let calendar = GoogleCalendar::connect(&cfg.google).await?;

    println!("Scheduling today's records...");
    let today = run_today_sync(&store, &calendar).await?;
    print_report(&today);

    println!("Reconciling deadlines...");
    let deadlines = run_deadline_sync(&store, &calendar).await?;
    print_report(&deadlines);

    if today.is_clean() && deadlines.is_clean() {
        Ok(())
    } else {
        anyhow::bail!("sync finished with failures (see above)")
    }
}

fn print_report(report: &SyncReport) {
    println!("  {}", report.summary());

    for skipped in &report.skipped_records {
        eprintln!("  {} {skipped}", "skipped:".yellow());
    }
    for failure in &report.calendar_failures {
        eprintln!("  {} {failure}", "calendar:".red());
    }
    for failure in &report.batch_failures {
        eprintln!("  {} {failure}", "store:".red());
    }
}
