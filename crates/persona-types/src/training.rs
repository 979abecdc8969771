//! Training job types and the job lifecycle state machine.
//!
//! A job moves `Queued -> Processing -> Completed | Failed`. Every write goes
//! through a [`JobTransition`], which names the status it expects to find.
//! Stores apply a transition only when the current status matches, so two
//! writers racing on one job cannot both win.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::agent::AgentId;
use crate::conversation::random_suffix;

/// Unique training job identifier: `train_{agent}_{millis}_{suffix}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn mint(agent_id: &AgentId, now: DateTime<Utc>) -> Self {
        Self(format!(
            "train_{agent_id}_{}_{}",
            now.timestamp_millis(),
            random_suffix()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle state of a training job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// `Completed` and `Failed` admit no further transition.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "queued"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "queued" => Ok(JobStatus::Queued),
            "processing" => Ok(JobStatus::Processing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(format!("invalid job status: '{other}'")),
        }
    }
}

/// What kind of data a training payload carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainingMode {
    Conversation,
    Documents,
    Examples,
}

impl fmt::Display for TrainingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainingMode::Conversation => write!(f, "conversation"),
            TrainingMode::Documents => write!(f, "documents"),
            TrainingMode::Examples => write!(f, "examples"),
        }
    }
}

impl FromStr for TrainingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "conversation" => Ok(TrainingMode::Conversation),
            "documents" => Ok(TrainingMode::Documents),
            "examples" => Ok(TrainingMode::Examples),
            other => Err(format!("invalid training type: '{other}'")),
        }
    }
}

/// A training job record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingJob {
    pub job_id: JobId,
    pub agent_id: AgentId,
    /// Ordered opaque records handed to the trainer.
    pub payload: Vec<serde_json::Value>,
    pub mode: TrainingMode,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl TrainingJob {
    /// A fresh job in `Queued` with a newly minted id.
    pub fn queued(
        agent_id: AgentId,
        payload: Vec<serde_json::Value>,
        mode: TrainingMode,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            job_id: JobId::mint(&agent_id, now),
            agent_id,
            payload,
            mode,
            status: JobStatus::Queued,
            created_at: now,
            started_at: None,
            completed_at: None,
            failed_at: None,
            error: None,
        }
    }
}

/// A conditional status change for one job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobTransition {
    /// `Queued -> Processing`.
    Start { at: DateTime<Utc> },
    /// `Processing -> Completed`.
    Complete { at: DateTime<Utc> },
    /// `Processing -> Failed`.
    Fail { at: DateTime<Utc>, error: String },
    /// `Processing -> Queued` for jobs whose `started_at` is older than
    /// `started_before`. Used by the startup recovery sweep.
    Requeue { started_before: DateTime<Utc> },
}

impl JobTransition {
    pub fn from_status(&self) -> JobStatus {
        match self {
            JobTransition::Start { .. } => JobStatus::Queued,
            JobTransition::Complete { .. }
            | JobTransition::Fail { .. }
            | JobTransition::Requeue { .. } => JobStatus::Processing,
        }
    }

    pub fn to_status(&self) -> JobStatus {
        match self {
            JobTransition::Start { .. } => JobStatus::Processing,
            JobTransition::Complete { .. } => JobStatus::Completed,
            JobTransition::Fail { .. } => JobStatus::Failed,
            JobTransition::Requeue { .. } => JobStatus::Queued,
        }
    }

    /// Apply to an in-memory job. Returns `false` and leaves the job untouched
    /// when the precondition does not hold.
    pub fn apply(&self, job: &mut TrainingJob) -> bool {
        if job.status != self.from_status() {
            return false;
        }
        match self {
            JobTransition::Start { at } => {
                job.started_at = Some(*at);
            }
            JobTransition::Complete { at } => {
                job.completed_at = Some(*at);
            }
            JobTransition::Fail { at, error } => {
                job.failed_at = Some(*at);
                job.error = Some(error.clone());
            }
            JobTransition::Requeue { started_before } => {
                match job.started_at {
                    Some(started) if started < *started_before => {}
                    _ => return false,
                }
                job.started_at = None;
            }
        }
        job.status = self.to_status();
        true
    }
}
