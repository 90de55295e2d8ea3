//! `cforge run`: the full search loop.

use anyhow::Result;
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;

use cacheforge_core::search::controller::RunSummary;
use cacheforge_types::trial::format_percent;

use crate::state::AppState;

/// Run the search loop and print one row per evaluated iteration.
///
/// Any fatal loop error (parse failure, exhausted build retries, metric or
/// store failure, generation failure) ends the command with that error.
pub async fn run(state: &AppState, iterations: Option<u32>, json: bool) -> Result<()> {
    let controller = state.controller(iterations)?;

    if !json {
        println!();
        println!(
            "  {} Searching with {} over {} workloads",
            style("⚡").bold(),
            style(&state.config.generation.model).cyan(),
            state.config.workloads.len()
        );
        println!(
            "  {}",
            style(format!("Artifacts: {}", state.config.toolchain.artifact_dir.display())).dim()
        );
        println!();
    }

    let summary = controller.run().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("#").fg(Color::White),
        Cell::new("Policy").fg(Color::White),
        Cell::new("Attempts").fg(Color::White),
        Cell::new("Mean Hit Rate").fg(Color::White),
        Cell::new("").fg(Color::White),
    ]);

    for it in &summary.iterations {
        let marker = if it.improved {
            Cell::new("best").fg(Color::Green)
        } else {
            Cell::new("")
        };
        table.add_row(vec![
            Cell::new(it.iteration),
            Cell::new(&it.report.policy),
            Cell::new(it.attempts),
            Cell::new(format_percent(it.report.aggregate)),
            marker,
        ]);
    }

    println!("{table}");
    println!();
    match &summary.best_policy {
        Some(policy) => println!(
            "  {} {} raised the best mean hit rate from {} to {}",
            style("✓").green(),
            style(policy).cyan().bold(),
            format_percent(summary.initial_best),
            style(format_percent(summary.best_score)).bold()
        ),
        None => println!(
            "  {} No candidate beat the previous best of {}",
            style("·").dim(),
            format_percent(summary.initial_best)
        ),
    }
    println!("  {}", style(format!("Run {}", summary.run_id)).dim());
    println!();
}
