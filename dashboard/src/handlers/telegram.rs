//! HTTP handlers for Telegram opt-in, passed through to the forecast backend

use axum::{extract::State, Json};
use shared::{validate_chat_id, EnableTelegramRequest, TelegramResponse, TelegramSettings};

use crate::error::{AppError, AppResult};
use crate::AppState;

pub async fn get_telegram_settings(
    State(state): State<AppState>,
) -> AppResult<Json<TelegramSettings>> {
    let settings = state.api.telegram_settings().await?;
    Ok(Json(settings))
}

/// Enable delivery to a chat; the backend sends a test message on success
pub async fn enable_telegram(
    State(state): State<AppState>,
    Json(input): Json<EnableTelegramRequest>,
) -> AppResult<Json<TelegramResponse>> {
    validate_chat_id(&input.chat_id).map_err(|m| AppError::validation("chatId", m))?;

    let mut response = state.api.enable_telegram(&input.chat_id).await?;
    if response.success {
        tracing::info!("Telegram notifications enabled");
        response.message =
            Some("Telegram notifications enabled! Check your Telegram for a test message.".into());
    }
    Ok(Json(response))
}

pub async fn disable_telegram(State(state): State<AppState>) -> AppResult<Json<TelegramResponse>> {
    let mut response = state.api.disable_telegram().await?;
    if response.success {
        tracing::info!("Telegram notifications disabled");
        response.message = Some("Telegram notifications disabled".into());
    }
    Ok(Json(response))
}

pub async fn test_telegram(State(state): State<AppState>) -> AppResult<Json<TelegramResponse>> {
    let mut response = state.api.test_telegram().await?;
    if response.success {
        response.message = Some("Test notification sent! Check your Telegram.".into());
    }
    Ok(Json(response))
}
