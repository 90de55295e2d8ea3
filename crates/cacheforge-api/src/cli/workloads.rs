//! `cforge workloads`: configured workloads and what the store has seen.

use std::collections::HashMap;

use anyhow::Result;
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;

use cacheforge_core::prompt::composer::known_workloads;
use cacheforge_core::repository::trial::TrialRepository;

use crate::state::AppState;

pub async fn list_workloads(state: &AppState, json: bool) -> Result<()> {
    let repo = state.repository();
    let known = known_workloads(&repo, &state.config.workloads).await?;
    let (_, artifacts) = repo.workloads_with_artifacts().await?;

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for row in &artifacts {
        *counts.entry(row.label.as_str()).or_default() += 1;
    }

    let rows: Vec<_> = known
        .iter()
        .map(|w| {
            let trace = state
                .config
                .workloads
                .iter()
                .find(|c| c.name == w.label)
                .map(|c| c.trace.display().to_string());
            (w, trace, counts.get(w.label.as_str()).copied().unwrap_or(0))
        })
        .collect();

    if json {
        let out: Vec<_> = rows
            .iter()
            .map(|(w, trace, trials)| {
                serde_json::json!({
                    "workload": w.label,
                    "description": w.description,
                    "trace": trace,
                    "configured": trace.is_some(),
                    "trials": trials,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("  {}", style("No workloads configured or recorded.").dim());
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Workload").fg(Color::White),
        Cell::new("Trace").fg(Color::White),
        Cell::new("Trials").fg(Color::White),
        Cell::new("Description").fg(Color::White),
    ]);

    for (w, trace, trials) in &rows {
        let trace_cell = match trace {
            Some(t) => Cell::new(t),
            None => Cell::new("not configured").fg(Color::DarkGrey),
        };
        table.add_row(vec![
            Cell::new(&w.label).fg(Color::Cyan),
            trace_cell,
            Cell::new(trials),
            Cell::new(&w.description),
        ]);
    }

    println!("{table}");
    Ok(())
}
