//! `cforge history <workload>`: natural-language report of the best policies.

use anyhow::Result;
use console::style;

use cacheforge_core::prompt::composer::{history_report, Retrieval};
use cacheforge_core::repository::trial::TrialRepository;

use crate::state::AppState;

pub async fn history(state: &AppState, workload: &str, top: u32, json: bool) -> Result<()> {
    let repo = state.repository();

    if json {
        let trials = repo.top_by_hit_rate(workload, top).await?;
        println!("{}", serde_json::to_string_pretty(&trials)?);
        return Ok(());
    }

    match history_report(&repo, workload, top).await? {
        Retrieval::Found(report) => print!("{report}"),
        no_data @ Retrieval::NoData { .. } => {
            println!("  {} {no_data}", style("!").yellow().bold());
        }
    }
    Ok(())
}
