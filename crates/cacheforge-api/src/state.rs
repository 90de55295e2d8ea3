//! Application state wiring the concrete adapters together.
//!
//! The core types are generic over their ports; `AppState` pins them to the
//! infra implementations.

use std::path::PathBuf;

use anyhow::Context;

use cacheforge_core::eval::pipeline::EvaluationPipeline;
use cacheforge_core::prompt::composer::PromptComposer;
use cacheforge_core::search::controller::{SearchController, SearchSettings};
use cacheforge_infra::config::{load_search_config, load_search_config_strict};
use cacheforge_infra::filesystem::{resolve_data_dir, LocalFileSystem};
use cacheforge_infra::llm::create_provider;
use cacheforge_infra::llm::openai_compat::OpenAiCompatibleProvider;
use cacheforge_infra::process::harness::ChampSimHarness;
use cacheforge_infra::process::toolchain::GxxToolchain;
use cacheforge_infra::sqlite::pool::DatabasePool;
use cacheforge_infra::sqlite::trial::SqliteTrialRepository;
use cacheforge_types::config::SearchConfig;
use cacheforge_types::contract::POLICY_OUTPUT_CONTRACT;

/// Concrete type aliases for the core generics pinned to infra implementations.
pub type ConcretePipeline = EvaluationPipeline<LocalFileSystem, GxxToolchain, ChampSimHarness>;

pub type ConcreteController = SearchController<
    SqliteTrialRepository,
    OpenAiCompatibleProvider,
    LocalFileSystem,
    GxxToolchain,
    ChampSimHarness,
>;

/// Loaded configuration plus the open experiment store.
pub struct AppState {
    pub config: SearchConfig,
    pub data_dir: PathBuf,
    pub config_path: PathBuf,
    pub database_path: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Load and validate configuration, then open (and migrate) the store.
    pub async fn init(
        config_path: Option<PathBuf>,
        database_path: Option<PathBuf>,
    ) -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("failed to create data dir {}", data_dir.display()))?;

        // A path given on the command line must load; the default one is optional.
        let (config_path, config) = match config_path {
            Some(path) => {
                let config = load_search_config_strict(&path).await?;
                (path, config)
            }
            None => {
                let path = LocalFileSystem::config_path(&data_dir);
                let config = load_search_config(&path).await;
                (path, config)
            }
        };
        config
            .validate()
            .with_context(|| format!("invalid configuration in {}", config_path.display()))?;

        let database_path =
            database_path.unwrap_or_else(|| LocalFileSystem::database_path(&data_dir));
        let db_pool = DatabasePool::open(&database_path)
            .await
            .with_context(|| format!("failed to open database {}", database_path.display()))?;

        tracing::debug!(
            config = %config_path.display(),
            database = %database_path.display(),
            workloads = config.workloads.len(),
            "state initialized"
        );

        Ok(Self {
            config,
            data_dir,
            config_path,
            database_path,
            db_pool,
        })
    }

    pub fn repository(&self) -> SqliteTrialRepository {
        SqliteTrialRepository::new(self.db_pool.clone())
    }

    pub fn composer(&self) -> PromptComposer {
        PromptComposer::new(POLICY_OUTPUT_CONTRACT)
    }

    pub fn pipeline(&self) -> ConcretePipeline {
        EvaluationPipeline::new(
            LocalFileSystem::new(),
            GxxToolchain::new(&self.config.toolchain),
            ChampSimHarness::new(&self.config.harness),
            self.config.toolchain.artifact_dir.clone(),
            self.config.workloads.clone(),
        )
    }

    pub fn provider(&self) -> anyhow::Result<OpenAiCompatibleProvider> {
        create_provider(&self.config.generation).with_context(|| {
            format!(
                "cannot reach the generation service (is {} set?)",
                self.config.generation.api_key_env
            )
        })
    }

    /// Controller for a full run, with `max_iterations` optionally overridden.
    pub fn controller(&self, max_iterations: Option<u32>) -> anyhow::Result<ConcreteController> {
        let mut settings = SearchSettings::from(&self.config);
        if let Some(n) = max_iterations {
            anyhow::ensure!(n > 0, "--iterations must be at least 1");
            settings.max_iterations = n;
        }
        Ok(SearchController::new(
            self.repository(),
            self.provider()?,
            self.pipeline(),
            POLICY_OUTPUT_CONTRACT,
            settings,
        ))
    }
}
