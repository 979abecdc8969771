//! Training job handlers for the REST API.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};

use persona_types::agent::AgentId;
use persona_types::training::{JobId, JobStatus, TrainingJob, TrainingMode};

use crate::http::error::AppError;
use crate::http::response::{ApiResponse, RequestClock};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TrainRequest {
    pub training_data: Vec<serde_json::Value>,
    /// One of `conversation`, `documents`, `examples`.
    #[serde(default = "default_training_type")]
    pub training_type: String,
}

fn default_training_type() -> String {
    TrainingMode::Conversation.to_string()
}

#[derive(Debug, Serialize)]
pub struct TrainAccepted {
    pub job_id: JobId,
    pub status: JobStatus,
    pub message: String,
}

/// POST /api/v1/agents/{id}/train - Queue a training job.
///
/// Returns as soon as the job is stored; poll the job link for progress.
pub async fn start_training(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<TrainRequest>, JsonRejection>,
) -> Result<ApiResponse<TrainAccepted>, AppError> {
    let clock = RequestClock::start();
    let Json(body) = payload?;

    let job = state
        .training
        .enqueue(&AgentId::new(id), body.training_data, &body.training_type)
        .await?;
    let href = format!("/api/v1/training-jobs/{}", job.job_id);

    Ok(clock
        .success(TrainAccepted {
            message: format!("Training job queued for agent {}", job.agent_id),
            job_id: job.job_id,
            status: job.status,
        })
        .with_link("job", &href))
}

/// GET /api/v1/training-jobs/{id}
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<TrainingJob>, AppError> {
    let clock = RequestClock::start();
    let job = state.training.status(&JobId::new(id)).await?;
    Ok(clock.success(job))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use serde_json::json;

    use persona_types::error::EngineError;

    use crate::state::test_support::{agent_config, test_state};

    fn body(records: Vec<serde_json::Value>, mode: &str) -> TrainRequest {
        TrainRequest {
            training_data: records,
            training_type: mode.to_string(),
        }
    }

    #[tokio::test]
    async fn test_training_runs_to_completion() {
        let (state, _dir) = test_state().await;
        state
            .agent_service
            .create_agent(agent_config("luna"))
            .await
            .unwrap();

        let accepted = start_training(
            State(state.clone()),
            Path("luna".to_string()),
            Ok(Json(body(vec![json!({"text": "hi"})], "conversation"))),
        )
        .await
        .unwrap()
        .data
        .unwrap();
        assert_eq!(accepted.status, JobStatus::Queued);

        let mut job = None;
        for _ in 0..50 {
            let current = get_job(State(state.clone()), Path(accepted.job_id.to_string()))
                .await
                .unwrap()
                .data
                .unwrap();
            if current.status.is_terminal() {
                job = Some(current);
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        let job = job.expect("job never finished");
        assert_eq!(job.status, JobStatus::Completed);
        assert!(job.completed_at.is_some());

        let agent = state
            .agent_service
            .get_agent(&AgentId::new("luna"))
            .await
            .unwrap();
        assert!(agent.last_trained_at.is_some());
    }

    #[tokio::test]
    async fn test_empty_training_data_rejected() {
        let (state, _dir) = test_state().await;
        state
            .agent_service
            .create_agent(agent_config("luna"))
            .await
            .unwrap();

        let err = start_training(
            State(state),
            Path("luna".to_string()),
            Ok(Json(body(vec![], "conversation"))),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            AppError::Engine(EngineError::InvalidTrainingRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_job() {
        let (state, _dir) = test_state().await;
        let err = get_job(State(state), Path("train_ghost".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Engine(EngineError::JobNotFound(_))));
    }

    #[test]
    fn test_training_type_defaults_to_conversation() {
        let req: TrainRequest = serde_json::from_str(r#"{"training_data": [{}]}"#).unwrap();
        assert_eq!(req.training_type, "conversation");
    }
}
