//! Conversation history handler for the REST API.

use axum::extract::{Path, State};

use persona_types::conversation::{ConversationId, ConversationLog};

use crate::http::error::AppError;
use crate::http::response::{ApiResponse, RequestClock};
use crate::state::AppState;

/// GET /api/v1/conversations/{id} - All turns in order.
///
/// An unknown id is not an error: the message list is simply empty.
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<ConversationLog>, AppError> {
    let clock = RequestClock::start();
    let log = state.chat.conversation(&ConversationId::new(id)).await?;
    Ok(clock.success(log))
}
