//! Application state wiring all services together.
//!
//! Services are generic over repository traits; AppState pins them to the
//! SQLite implementations and owns the shared model client, prompt cache,
//! training executor and metrics handle.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusHandle;
use tracing::{info, warn};

use persona_core::agent::cache::PromptCache;
use persona_core::chat::orchestrator::ChatOrchestrator;
use persona_core::llm::box_client::BoxModelClient;
use persona_core::metrics::MetricsSink;
use persona_core::service::agent::AgentService;
use persona_core::training::manager::TrainingJobManager;
use persona_core::training::trainer::BoxTrainer;
use persona_infra::llm::create_client;
use persona_infra::metrics::prometheus::{FacadeMetrics, install_prometheus};
use persona_infra::sqlite::agent::SqliteAgentRepository;
use persona_infra::sqlite::conversation::SqliteConversationRepository;
use persona_infra::sqlite::job::SqliteJobRepository;
use persona_infra::sqlite::pool::{DatabasePool, database_url};
use persona_infra::training::simulated::SimulatedTrainer;
use persona_types::config::ServiceConfig;

pub type ConcreteAgentService = AgentService<SqliteAgentRepository, SqliteConversationRepository>;

pub type ConcreteChatOrchestrator =
    ChatOrchestrator<SqliteAgentRepository, SqliteConversationRepository>;

pub type ConcreteTrainingManager = TrainingJobManager<SqliteAgentRepository, SqliteJobRepository>;

/// Shared application state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub agent_service: Arc<ConcreteAgentService>,
    pub chat: Arc<ConcreteChatOrchestrator>,
    pub training: Arc<ConcreteTrainingManager>,
    pub metrics: Arc<dyn MetricsSink>,
    pub prometheus: PrometheusHandle,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Connect to the database, build the model client, wire services, and
    /// re-schedule training work left by a previous process.
    pub async fn init(config: &ServiceConfig, data_dir: &Path) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(data_dir).await?;

        let db_pool = DatabasePool::new(&database_url(data_dir)).await?;
        let model = create_client(&config.llm)?;
        info!(
            provider = model.name(),
            model = model.default_model(),
            "language model client ready"
        );

        let prometheus = install_prometheus()?;
        let trainer = BoxTrainer::new(SimulatedTrainer::new(Duration::from_millis(
            config.training.simulated_duration_ms,
        )));

        let state = Self::from_parts(
            config,
            db_pool,
            model,
            trainer,
            Arc::new(FacadeMetrics),
            prometheus,
        );

        let stale_after = Duration::from_secs(config.training.stale_after_secs);
        if let Err(e) = state.training.recover(stale_after).await {
            warn!(error = %e, "training recovery sweep failed");
        }
        Ok(state)
    }

    /// Wire services from already-built collaborators.
    ///
    /// Starts the training executor, so it must run inside a Tokio runtime.
    pub fn from_parts(
        config: &ServiceConfig,
        db_pool: DatabasePool,
        model: BoxModelClient,
        trainer: BoxTrainer,
        metrics: Arc<dyn MetricsSink>,
        prometheus: PrometheusHandle,
    ) -> Self {
        let agents = Arc::new(SqliteAgentRepository::new(db_pool.clone()));
        let conversations = Arc::new(SqliteConversationRepository::new(db_pool.clone()));
        let jobs = Arc::new(SqliteJobRepository::new(db_pool.clone()));

        let cache = Arc::new(PromptCache::new(
            Duration::from_secs(config.chat.prompt_cache_ttl_secs),
            config.chat.prompt_cache_capacity,
        ));

        let agent_service = AgentService::new(Arc::clone(&agents), Arc::clone(&conversations));
        let chat = ChatOrchestrator::new(
            Arc::clone(&agents),
            conversations,
            Arc::new(model),
            cache,
            Arc::clone(&metrics),
            config.chat.default_context_turns,
        );
        let training = TrainingJobManager::start(
            agents,
            jobs,
            trainer,
            Arc::clone(&metrics),
            config.training.workers,
        );

        Self {
            agent_service: Arc::new(agent_service),
            chat: Arc::new(chat),
            training: Arc::new(training),
            metrics,
            prometheus,
            db_pool,
        }
    }

    /// Drain background training, then close the database.
    pub async fn shutdown(&self, grace: Duration) {
        if !self.training.shutdown(grace).await {
            warn!("training jobs still running at shutdown were abandoned");
        }
        self.db_pool.close().await;
    }
}
