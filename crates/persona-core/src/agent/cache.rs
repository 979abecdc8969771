//! Cache of compiled agents keyed by agent id.
//!
//! Never the source of truth: entries expire after a TTL and are re-read from
//! the [`AgentRepository`]. Missing agents are not cached, so an agent created
//! right after a failed lookup is visible immediately.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use persona_types::agent::{AgentId, AgentRecord};
use persona_types::error::RepositoryError;

use crate::repository::agent::AgentRepository;

use super::prompt::PromptCompiler;

/// An agent record together with its compiled system prompt.
#[derive(Debug)]
pub struct CompiledAgent {
    pub record: AgentRecord,
    pub system_prompt: String,
}

struct CacheEntry {
    agent: Arc<CompiledAgent>,
    loaded_at: Instant,
}

pub struct PromptCache {
    entries: DashMap<AgentId, CacheEntry>,
    /// Held across the capacity check and the insert, so racing misses for
    /// different ids cannot overshoot `capacity`.
    insert_lock: Mutex<()>,
    ttl: Duration,
    capacity: usize,
}

impl PromptCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            insert_lock: Mutex::new(()),
            ttl,
            capacity,
        }
    }

    /// Return the cached agent, or load and compile it on miss or expiry.
    pub async fn get_or_load<R: AgentRepository>(
        &self,
        repo: &R,
        id: &AgentId,
    ) -> Result<Option<Arc<CompiledAgent>>, RepositoryError> {
        let cached = self
            .entries
            .get(id)
            .filter(|e| e.loaded_at.elapsed() < self.ttl)
            .map(|e| Arc::clone(&e.agent));
        if let Some(agent) = cached {
            return Ok(Some(agent));
        }

        let Some(record) = repo.get(id).await? else {
            self.entries.remove(id);
            return Ok(None);
        };

        let system_prompt = PromptCompiler::compile(&record.config);
        let agent = Arc::new(CompiledAgent {
            record,
            system_prompt,
        });
        self.insert(id.clone(), Arc::clone(&agent));
        tracing::debug!(agent_id = %id, "compiled agent cached");
        Ok(Some(agent))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&self, id: AgentId, agent: Arc<CompiledAgent>) {
        if self.capacity == 0 {
            return;
        }
        let _guard = self.insert_lock.lock().unwrap_or_else(|e| e.into_inner());
        if !self.entries.contains_key(&id) && self.entries.len() >= self.capacity {
            let ttl = self.ttl;
            self.entries.retain(|_, e| e.loaded_at.elapsed() < ttl);
        }
        if !self.entries.contains_key(&id) && self.entries.len() >= self.capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|e| e.loaded_at)
                .map(|e| e.key().clone());
            if let Some(key) = oldest {
                self.entries.remove(&key);
            }
        }
        self.entries.insert(
            id,
            CacheEntry {
                agent,
                loaded_at: Instant::now(),
            },
        );
    }
}
