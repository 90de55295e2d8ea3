//! `cforge prompt <workload>`: the single-workload retrieval prompt.

use anyhow::Result;
use console::style;

use cacheforge_core::llm::provider::LlmProvider;
use cacheforge_core::prompt::composer::Retrieval;
use cacheforge_infra::filesystem::LocalFileSystem;
use cacheforge_types::llm::CompletionRequest;

use crate::state::AppState;

/// Print the retrieval prompt for `workload`, optionally sending it to the
/// generation service.
///
/// A workload with no recorded trials prints the no-data notice and never
/// reaches the generation service.
pub async fn prompt(
    state: &AppState,
    workload: &str,
    top: u32,
    generate: bool,
    json: bool,
) -> Result<()> {
    let repo = state.repository();
    let fs = LocalFileSystem::new();
    let retrieval = state.composer().top_n_prompt(&repo, &fs, workload, top).await?;

    let prompt = match retrieval {
        Retrieval::Found(prompt) => prompt,
        no_data @ Retrieval::NoData { .. } => {
            if json {
                let out = serde_json::json!({
                    "workload": workload,
                    "status": "no_data",
                    "message": no_data.to_string(),
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("  {} {no_data}", style("!").yellow().bold());
            }
            return Ok(());
        }
    };

    let response = if generate {
        let provider = state.provider()?;
        let generation = &state.config.generation;
        let request = CompletionRequest {
            model: generation.model.clone(),
            prompt: prompt.clone(),
            reasoning_effort: Some(generation.reasoning_effort),
            max_tokens: generation.max_tokens,
        };
        let completion = tokio::time::timeout(generation.timeout(), provider.complete(&request))
            .await
            .map_err(|_| anyhow::anyhow!("generation timed out after {}s", generation.timeout_secs))??;
        Some(completion.content)
    } else {
        None
    };

    if json {
        let out = serde_json::json!({
            "workload": workload,
            "status": "found",
            "prompt": prompt,
            "response": response,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{prompt}");
    if let Some(response) = response {
        println!("{}", style("── Response ──").dim());
        println!("{response}");
    }
    Ok(())
}
