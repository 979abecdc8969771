//! In-memory collaborators shared by the unit tests in this crate.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use persona_types::agent::{AgentConfig, AgentId, AgentRecord, AgentStatus, Capabilities, Personality};
use persona_types::conversation::{ConversationId, ConversationTurn, TurnBatch};
use persona_types::error::{RepositoryError, TrainerError};
use persona_types::llm::{CompletionRequest, CompletionResponse, LlmError, MessageRole, Usage};
use persona_types::training::{JobId, JobStatus, JobTransition, TrainingJob};

use crate::agent::prompt::PromptCompiler;
use crate::llm::client::LanguageModelClient;
use crate::metrics::MetricsSink;
use crate::repository::agent::AgentRepository;
use crate::repository::conversation::ConversationRepository;
use crate::repository::job::JobRepository;
use crate::training::trainer::Trainer;

pub fn agent_config(id: &str) -> AgentConfig {
    AgentConfig {
        agent_id: AgentId::new(id),
        name: "Luna".to_string(),
        creator_id: "creator-1".to_string(),
        personality: Personality {
            tone: "warm".to_string(),
            expertise: vec!["astronomy".to_string()],
            response_style: "concise".to_string(),
            language_style: "casual".to_string(),
            template_id: None,
        },
        capabilities: Capabilities::default(),
        temperature: 0.7,
        max_tokens: 1000,
        max_context_turns: 10,
        version: 1,
    }
}

pub fn agent_record(config: AgentConfig) -> AgentRecord {
    let now = Utc::now();
    AgentRecord {
        system_prompt: PromptCompiler::compile(&config),
        config,
        status: AgentStatus::Active,
        created_at: now,
        updated_at: now,
        last_trained_at: None,
        training_status: None,
    }
}

// ---------------------------------------------------------------------------
// Agents
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryAgentRepo {
    pub agents: Mutex<HashMap<AgentId, AgentRecord>>,
    pub get_calls: AtomicUsize,
    pub fail_reads: AtomicBool,
    pub fail_mark_trained: AtomicBool,
}

impl MemoryAgentRepo {
    pub fn with_agent(config: AgentConfig) -> Self {
        let repo = Self::default();
        repo.agents
            .lock()
            .unwrap()
            .insert(config.agent_id.clone(), agent_record(config));
        repo
    }

    pub fn record(&self, id: &str) -> Option<AgentRecord> {
        self.agents.lock().unwrap().get(&AgentId::new(id)).cloned()
    }
}

impl AgentRepository for MemoryAgentRepo {
    async fn create(&self, record: &AgentRecord) -> Result<(), RepositoryError> {
        let mut agents = self.agents.lock().unwrap();
        if agents.contains_key(record.id()) {
            return Err(RepositoryError::Conflict(record.id().to_string()));
        }
        agents.insert(record.id().clone(), record.clone());
        Ok(())
    }

    async fn get(&self, id: &AgentId) -> Result<Option<AgentRecord>, RepositoryError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(RepositoryError::Connection);
        }
        Ok(self.agents.lock().unwrap().get(id).cloned())
    }

    async fn update_last_trained(
        &self,
        id: &AgentId,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        if self.fail_mark_trained.load(Ordering::SeqCst) {
            return Err(RepositoryError::Query("disk full".to_string()));
        }
        let mut agents = self.agents.lock().unwrap();
        let record = agents.get_mut(id).ok_or(RepositoryError::NotFound)?;
        record.last_trained_at = Some(at);
        record.training_status = Some(JobStatus::Completed);
        record.updated_at = at;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Conversations
// ---------------------------------------------------------------------------

struct StoredConversation {
    agent_id: AgentId,
    turns: Vec<ConversationTurn>,
}

#[derive(Default)]
pub struct MemoryConversationRepo {
    conversations: Mutex<HashMap<ConversationId, StoredConversation>>,
    pub append_calls: AtomicUsize,
    /// When set, report one fewer persisted turn than requested.
    pub short_write: AtomicBool,
    pub fail_appends: AtomicBool,
}

impl MemoryConversationRepo {
    pub fn seed(&self, batch: TurnBatch) {
        let mut conversations = self.conversations.lock().unwrap();
        let entry = conversations
            .entry(batch.conversation_id)
            .or_insert_with(|| StoredConversation {
                agent_id: batch.agent_id,
                turns: Vec::new(),
            });
        entry.turns.extend(batch.turns);
    }

    pub fn turns(&self, id: &ConversationId) -> Vec<ConversationTurn> {
        self.conversations
            .lock()
            .unwrap()
            .get(id)
            .map(|c| c.turns.clone())
            .unwrap_or_default()
    }
}

impl ConversationRepository for MemoryConversationRepo {
    async fn append_turns(&self, batch: &TurnBatch) -> Result<usize, RepositoryError> {
        self.append_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(RepositoryError::Query("locked".to_string()));
        }
        // Yield so concurrent appends genuinely race for the lock.
        tokio::task::yield_now().await;
        self.seed(batch.clone());
        let n = batch.turns.len();
        if self.short_write.load(Ordering::SeqCst) {
            Ok(n.saturating_sub(1))
        } else {
            Ok(n)
        }
    }

    async fn read_window(
        &self,
        conversation_id: &ConversationId,
        limit: u32,
    ) -> Result<Vec<ConversationTurn>, RepositoryError> {
        let turns = self.turns(conversation_id);
        let skip = turns.len().saturating_sub(limit as usize);
        Ok(turns.into_iter().skip(skip).collect())
    }

    async fn read_all(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<ConversationTurn>, RepositoryError> {
        Ok(self.turns(conversation_id))
    }

    async fn count_exchanges(&self, agent_id: &AgentId) -> Result<u64, RepositoryError> {
        let conversations = self.conversations.lock().unwrap();
        Ok(conversations
            .values()
            .filter(|c| &c.agent_id == agent_id)
            .flat_map(|c| c.turns.iter())
            .filter(|t| t.role == MessageRole::User)
            .count() as u64)
    }
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryJobRepo {
    pub jobs: Mutex<HashMap<JobId, TrainingJob>>,
    /// Every status a job has been observed in, in write order.
    pub history: Mutex<Vec<(JobId, JobStatus)>>,
    pub fail_create: AtomicBool,
    pub fail_start: AtomicBool,
    pub fail_complete: AtomicBool,
    pub fail_fail: AtomicBool,
}

impl MemoryJobRepo {
    pub fn insert(&self, job: TrainingJob) {
        self.jobs.lock().unwrap().insert(job.job_id.clone(), job);
    }

    pub fn job(&self, id: &JobId) -> Option<TrainingJob> {
        self.jobs.lock().unwrap().get(id).cloned()
    }

    pub fn statuses(&self, id: &JobId) -> Vec<JobStatus> {
        self.history
            .lock()
            .unwrap()
            .iter()
            .filter(|(j, _)| j == id)
            .map(|(_, s)| *s)
            .collect()
    }
}

impl JobRepository for MemoryJobRepo {
    async fn create(&self, job: &TrainingJob) -> Result<(), RepositoryError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(RepositoryError::Connection);
        }
        self.history
            .lock()
            .unwrap()
            .push((job.job_id.clone(), job.status));
        self.insert(job.clone());
        Ok(())
    }

    async fn get(&self, id: &JobId) -> Result<Option<TrainingJob>, RepositoryError> {
        Ok(self.job(id))
    }

    async fn transition(
        &self,
        id: &JobId,
        transition: &JobTransition,
    ) -> Result<bool, RepositoryError> {
        match transition {
            JobTransition::Start { .. } if self.fail_start.load(Ordering::SeqCst) => {
                return Err(RepositoryError::Connection);
            }
            JobTransition::Complete { .. } if self.fail_complete.load(Ordering::SeqCst) => {
                return Err(RepositoryError::Query("write failed".to_string()));
            }
            JobTransition::Fail { .. } if self.fail_fail.load(Ordering::SeqCst) => {
                return Err(RepositoryError::Connection);
            }
            _ => {}
        }
        let mut jobs = self.jobs.lock().unwrap();
        let Some(job) = jobs.get_mut(id) else {
            return Ok(false);
        };
        let applied = transition.apply(job);
        if applied {
            self.history.lock().unwrap().push((id.clone(), job.status));
        }
        Ok(applied)
    }

    async fn list_by_status(&self, status: JobStatus) -> Result<Vec<TrainingJob>, RepositoryError> {
        let mut jobs: Vec<TrainingJob> = self
            .jobs
            .lock()
            .unwrap()
            .values()
            .filter(|j| j.status == status)
            .cloned()
            .collect();
        jobs.sort_by_key(|j| j.created_at);
        Ok(jobs)
    }
}

// ---------------------------------------------------------------------------
// Model client
// ---------------------------------------------------------------------------

/// Replays scripted results, then falls back to a fixed reply.
#[derive(Default)]
pub struct ScriptedModel {
    pub script: Mutex<VecDeque<Result<CompletionResponse, LlmError>>>,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedModel {
    pub fn failing(err: LlmError) -> Self {
        let model = Self::default();
        model.script.lock().unwrap().push_back(Err(err));
        model
    }

    pub fn reply(content: &str) -> CompletionResponse {
        CompletionResponse {
            id: "resp-1".to_string(),
            content: content.to_string(),
            model: "test-model".to_string(),
            usage: Some(Usage {
                input_tokens: 20,
                output_tokens: 5,
            }),
        }
    }
}

impl LanguageModelClient for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "test-model"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(Self::reply("Hello! I'm Luna, an AI agent.")))
    }
}

impl LanguageModelClient for Arc<ScriptedModel> {
    fn name(&self) -> &str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "test-model"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.as_ref().complete(request).await
    }
}

// ---------------------------------------------------------------------------
// Trainer
// ---------------------------------------------------------------------------

pub struct StubTrainer {
    pub delay: Duration,
    pub fail_with: Option<String>,
    pub calls: AtomicUsize,
}

impl StubTrainer {
    pub fn ok() -> Self {
        Self {
            delay: Duration::ZERO,
            fail_with: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::ok()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::ok()
        }
    }
}

impl Trainer for StubTrainer {
    fn name(&self) -> &str {
        "stub"
    }

    async fn train(&self, _job: &TrainingJob) -> Result<(), TrainerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.fail_with {
            Some(msg) => Err(TrainerError::Backend(msg.clone())),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingMetrics {
    pub counters: Mutex<Vec<(&'static str, Vec<(&'static str, String)>)>>,
    pub durations: Mutex<Vec<(&'static str, f64)>>,
}

impl RecordingMetrics {
    pub fn count(&self, name: &str) -> usize {
        self.counters
            .lock()
            .unwrap()
            .iter()
            .filter(|(n, _)| *n == name)
            .count()
    }

    pub fn count_with(&self, name: &str, label: &str, value: &str) -> usize {
        self.counters
            .lock()
            .unwrap()
            .iter()
            .filter(|(n, labels)| {
                *n == name && labels.iter().any(|(k, v)| *k == label && v == value)
            })
            .count()
    }

    pub fn observations(&self, name: &str) -> usize {
        self.durations
            .lock()
            .unwrap()
            .iter()
            .filter(|(n, _)| *n == name)
            .count()
    }
}

impl MetricsSink for RecordingMetrics {
    fn increment_counter(&self, name: &'static str, labels: &[(&'static str, String)]) {
        self.counters.lock().unwrap().push((name, labels.to_vec()));
    }

    fn observe_duration(&self, name: &'static str, seconds: f64) {
        self.durations.lock().unwrap().push((name, seconds));
    }
}
