//! `cforge evaluate <file>`: run the pipeline on an existing policy.
//!
//! Used to seed the store with baselines (LRU, SRRIP, ...) before a search,
//! or to re-score a saved model answer.

use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;

use cacheforge_core::eval::pipeline::{ArtifactTag, PipelineOutcome};
use cacheforge_core::prompt::parser::ResponseParser;
use cacheforge_types::contract::POLICY_OUTPUT_CONTRACT;
use cacheforge_types::policy::PolicyCandidate;
use cacheforge_types::trial::format_percent;

use crate::state::AppState;

pub async fn evaluate(
    state: &AppState,
    file: &Path,
    name: Option<String>,
    description: Option<String>,
    json: bool,
) -> Result<()> {
    let content = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let candidate = load_candidate(file, &content, name, description);

    let repo = state.repository();
    let outcome = state
        .pipeline()
        .run(&repo, ArtifactTag::Seed, &candidate)
        .await?;

    let report = match outcome {
        PipelineOutcome::Evaluated(report) => report,
        PipelineOutcome::BuildFailed {
            artifact,
            status,
            diagnostics,
        } => {
            if !json {
                eprintln!("{}", diagnostics.trim_end());
            }
            anyhow::bail!(
                "{} failed to build (exit status {})",
                artifact.display(),
                status.map_or_else(|| "unknown".to_string(), |s| s.to_string())
            );
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Workload").fg(Color::White),
        Cell::new("Hit Rate").fg(Color::White),
    ]);
    for result in &report.results {
        table.add_row(vec![
            Cell::new(&result.workload),
            Cell::new(format_percent(result.hit_rate)),
        ]);
    }
    table.add_row(vec![
        Cell::new("all").fg(Color::Cyan),
        Cell::new(format_percent(report.aggregate)).fg(Color::Cyan),
    ]);

    println!();
    println!(
        "  {} {} ({})",
        style("✓").green(),
        style(&report.policy).cyan().bold(),
        style(report.artifact.display()).dim()
    );
    println!("{table}");
    Ok(())
}

/// A saved model answer is used as-is; anything else is raw C++ named after
/// `name` or the file stem.
fn load_candidate(
    file: &Path,
    content: &str,
    name: Option<String>,
    description: Option<String>,
) -> PolicyCandidate {
    if let Ok(mut parsed) = ResponseParser::new(POLICY_OUTPUT_CONTRACT).parse(content) {
        if let Some(name) = name {
            parsed.name = name;
        }
        if let Some(description) = description {
            parsed.description = description;
        }
        return parsed;
    }

    let name = name.unwrap_or_else(|| {
        file.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "policy".to_string())
    });
    PolicyCandidate::new(name, description.unwrap_or_default(), content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cacheforge_core::prompt::composer::PromptComposer;

    #[test]
    fn raw_source_is_named_after_file_stem() {
        let c = load_candidate(Path::new("baselines/srrip.cc"), "// srrip\n", None, None);
        assert_eq!(c.name, "srrip");
        assert_eq!(c.description, "");
        assert_eq!(c.source, "// srrip\n");
    }

    #[test]
    fn explicit_name_and_description_win() {
        let c = load_candidate(
            Path::new("lru.cc"),
            "// lru",
            Some("LRU".to_string()),
            Some("least recently used".to_string()),
        );
        assert_eq!(c.name, "LRU");
        assert_eq!(c.description, "least recently used");
    }

    #[test]
    fn saved_answer_is_parsed() {
        let answer = PromptComposer::new(POLICY_OUTPUT_CONTRACT).render_sections(
            "Dueling RRIP",
            "Set dueling between SRRIP and BRRIP.",
            "// drrip",
        );
        let c = load_candidate(Path::new("answer.md"), &answer, None, None);
        assert_eq!(c.name, "Dueling RRIP");
        assert_eq!(c.source.trim(), "// drrip");
    }
}
