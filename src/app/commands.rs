use crate::app::render::lease_table;
use crate::config::{CliConfig, Command, Settings};
use crate::core::alerts::{summarize, AlertLevel};
use crate::core::export::export;
use crate::core::{Clock, LeaseQuery, LeaseStore, SystemClock};
use crate::utils::error::{LeaseError, Result};
use std::io::Write;

/// 執行 CLI 指令，輸出寫到 `out`
pub fn run<W: Write>(config: &CliConfig, out: &mut W) -> Result<()> {
    let settings = config.resolve()?;
    run_with_clock(&config.command, &settings, SystemClock, out)
}

pub fn run_with_clock<C: Clock, W: Write>(
    command: &Command,
    settings: &Settings,
    clock: C,
    out: &mut W,
) -> Result<()> {
    let mut store = LeaseStore::open_with_clock(settings.store.clone(), clock)?;
    for warning in store.warnings() {
        writeln!(out, "⚠️ line {}: {}", warning.line, warning.message)?;
    }
    let today = store.today();

    match command {
        Command::Add(form) => {
            let record = store.insert(form.to_form(None, None))?;
            writeln!(
                out,
                "✅ Saved contract #{} for {} (unit {}, ends {})",
                record.id, record.tenant_name, record.unit_code, record.end_date
            )?;
        }
        Command::Update { id, form } => {
            let base = store.get(*id).cloned();
            let record = store.update(form.to_form(Some(*id), base.as_ref()))?;
            writeln!(out, "✅ Updated contract #{} (ends {})", record.id, record.end_date)?;
        }
        Command::Deactivate { id } => {
            let record = store.deactivate(*id)?;
            writeln!(
                out,
                "🗄️ Contract #{} is inactive; unit {} is free",
                record.id, record.unit_code
            )?;
        }
        Command::List { all } => {
            let records = store.find(&LeaseQuery::new().include_inactive(*all));
            if records.is_empty() {
                writeln!(out, "No contracts yet. Use `add` to record the first one.")?;
            } else {
                writeln!(out, "{}", lease_table(&records, today, &settings.tiers))?;
            }
        }
        Command::Find(args) => {
            let records = store.find(&args.to_query());
            if records.is_empty() {
                writeln!(out, "No contracts match the given filters.")?;
            } else {
                writeln!(out, "{}", lease_table(&records, today, &settings.tiers))?;
            }
        }
        Command::Expiring { within } => {
            let window = within.unwrap_or(settings.store.warn_window_days);
            let summary = summarize(store.records(), today, &settings.tiers);
            let marker = match summary.level {
                AlertLevel::Urgent => "🚨",
                AlertLevel::Warning => "⏰",
                AlertLevel::Clear => "✅",
            };
            writeln!(out, "{} {}", marker, summary.message())?;

            let due = store.upcoming_expirations(window);
            if !due.is_empty() {
                writeln!(out, "{}", lease_table(&due, today, &settings.tiers))?;
            }
        }
        Command::Export {
            query,
            format,
            out: target,
        } => {
            let records = store.find(&query.to_query());
            let bytes = export(&records, today, settings.store.warn_window_days, *format)?;
            match target {
                Some(path) => {
                    std::fs::write(path, &bytes)
                        .map_err(|e| LeaseError::storage(path, e.to_string()))?;
                    writeln!(
                        out,
                        "📁 Exported {} contract(s) to {}",
                        records.len(),
                        path.display()
                    )?;
                }
                None => out.write_all(&bytes)?,
            }
        }
    }

    Ok(())
}
