//! Agent handlers for the REST API.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use serde::Serialize;

use persona_types::agent::{AgentAnalytics, AgentConfig, AgentId, AgentRecord};

use crate::http::error::AppError;
use crate::http::response::{ApiResponse, RequestClock};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AgentCreated {
    pub agent_id: AgentId,
    pub status: &'static str,
}

/// POST /api/v1/agents - Create a new agent.
pub async fn create_agent(
    State(state): State<AppState>,
    payload: Result<Json<AgentConfig>, JsonRejection>,
) -> Result<ApiResponse<AgentCreated>, AppError> {
    let clock = RequestClock::start();
    let Json(config) = payload?;

    let record = state.agent_service.create_agent(config).await?;
    let href = format!("/api/v1/agents/{}", record.id());

    Ok(clock
        .success(AgentCreated {
            agent_id: record.id().clone(),
            status: "created",
        })
        .with_link("self", &href))
}

/// GET /api/v1/agents/{id} - Full agent record, compiled prompt included.
pub async fn get_agent(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<AgentRecord>, AppError> {
    let clock = RequestClock::start();
    let record = state.agent_service.get_agent(&AgentId::new(id)).await?;
    let href = format!("/api/v1/agents/{}", record.id());
    let analytics = format!("{href}/analytics");

    Ok(clock
        .success(record)
        .with_link("self", &href)
        .with_link("analytics", &analytics))
}

/// GET /api/v1/agents/{id}/analytics - Conversation counts.
pub async fn get_analytics(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<AgentAnalytics>, AppError> {
    let clock = RequestClock::start();
    let analytics = state.agent_service.analytics(&AgentId::new(id)).await?;
    Ok(clock.success(analytics))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::state::test_support::{agent_config as config, test_state};

    #[tokio::test]
    async fn test_create_then_get() {
        let (state, _dir) = test_state().await;

        let created = create_agent(State(state.clone()), Ok(Json(config("luna"))))
            .await
            .unwrap();
        let data = created.data.unwrap();
        assert_eq!(data.agent_id.as_str(), "luna");
        assert_eq!(data.status, "created");
        assert_eq!(created.links["self"], "/api/v1/agents/luna");

        let fetched = get_agent(State(state), Path("luna".to_string()))
            .await
            .unwrap()
            .data
            .unwrap();
        assert!(fetched.system_prompt.starts_with("You are Luna"));
        assert_eq!(fetched.config.max_tokens, 500);
    }

    #[tokio::test]
    async fn test_duplicate_create_is_conflict() {
        let (state, _dir) = test_state().await;
        create_agent(State(state.clone()), Ok(Json(config("luna"))))
            .await
            .unwrap();

        let err = create_agent(State(state), Ok(Json(config("luna"))))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Engine(persona_types::error::EngineError::AgentConflict(_))
        ));
    }

    #[tokio::test]
    async fn test_get_unknown_agent() {
        let (state, _dir) = test_state().await;
        let err = get_agent(State(state), Path("ghost".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Engine(persona_types::error::EngineError::AgentNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_analytics_for_unknown_agent() {
        let (state, _dir) = test_state().await;
        let stats = get_analytics(State(state), Path("ghost".to_string()))
            .await
            .unwrap()
            .data
            .unwrap();
        assert_eq!(stats.total_conversations, 0);
        assert_eq!(stats.status, "active");
    }
}
