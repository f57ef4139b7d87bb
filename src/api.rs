//! REST API for the investment assistant
//!
//! Stateless chat endpoint plus explicit access to the analysis tools.
//! Conversation history is kept by the caller.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::error::AssistantError;
use crate::models::TurnState;
use crate::pipeline::Pipeline;
use crate::tools::ToolRegistry;

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub pipeline: Arc<Pipeline>,
    pub tools: Arc<ToolRegistry>,
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Chat Endpoint
/// =============================

async fn chat_handler(
    State(state): State<ApiState>,
    Json(req): Json<ChatRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    let Some(user_msg) = req
        .messages
        .iter()
        .rev()
        .find(|m| m.role.eq_ignore_ascii_case("user"))
    else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("No user message found".into())),
        );
    };

    // Only the latest user turn enters the pipeline.
    let turn = TurnState::from_user_message(user_msg.content.clone());
    info!(turn_id = %turn.turn_id, history_len = req.messages.len(), "Received chat request");

    let result = state.pipeline.run(turn).await;

    (
        StatusCode::OK,
        Json(ApiResponse::success(serde_json::json!({
            "turn_id": result.turn_id,
            "answer": result.output(),
            "intermediate_steps": result.intermediate_steps,
        }))),
    )
}

/// =============================
/// Tool Endpoints
/// =============================

async fn list_tools(State(state): State<ApiState>) -> Json<ApiResponse> {
    let tools: Vec<Value> = state
        .tools
        .list()
        .into_iter()
        .filter_map(|name| state.tools.get(name))
        .map(|tool| {
            serde_json::json!({
                "name": tool.name(),
                "description": tool.description(),
            })
        })
        .collect();

    Json(ApiResponse::success(tools))
}

async fn run_tool(
    State(state): State<ApiState>,
    Path(name): Path<String>,
    Json(parameters): Json<Value>,
) -> (StatusCode, Json<ApiResponse>) {
    match state.tools.invoke(&name, parameters).await {
        Ok(output) => (StatusCode::OK, Json(ApiResponse::success(output.data))),
        Err(e) => {
            warn!(tool = %name, "Tool invocation failed: {}", e);
            let status = match e {
                AssistantError::ToolNotFound(_) => StatusCode::NOT_FOUND,
                AssistantError::InvalidToolInput(_) | AssistantError::InvalidHoldings(_) => {
                    StatusCode::BAD_REQUEST
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, Json(ApiResponse::error(e.to_string())))
        }
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(pipeline: Arc<Pipeline>, tools: Arc<ToolRegistry>) -> Router {
    let state = ApiState { pipeline, tools };

    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat_handler))
        .route("/api/tools", get(list_tools))
        .route("/api/tools/:name", post(run_tool))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    pipeline: Arc<Pipeline>,
    tools: Arc<ToolRegistry>,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(pipeline, tools);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
