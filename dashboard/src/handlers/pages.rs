//! HTML page handlers: marketing site, login, contact and the dashboard shell

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use chrono::Utc;
use serde::Deserialize;
use shared::{ContactForm, LoginForm, NotificationFilter};
use validator::Validate;

use crate::error::AppError;
use crate::render::pages::{self, Notice};
use crate::AppState;

pub async fn landing_page() -> Html<String> {
    Html(pages::landing().into_string())
}

pub async fn login_page() -> Html<String> {
    Html(pages::login("", None).into_string())
}

/// Validate the form, then open a backend session
pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    if let Err(errors) = form.validate() {
        let message = AppError::from(errors).user_message();
        return rejected_login(&form.email, StatusCode::BAD_REQUEST, message);
    }

    match state.api.login(&form).await {
        Ok(user) => {
            tracing::info!("User {} logged in", user.id);
            Redirect::to("/dashboard").into_response()
        }
        Err(AppError::Http { status: 401, .. }) => rejected_login(
            &form.email,
            StatusCode::UNAUTHORIZED,
            "Invalid credentials".to_string(),
        ),
        Err(e) => {
            tracing::warn!("Login failed: {}", e);
            rejected_login(&form.email, StatusCode::BAD_GATEWAY, e.user_message())
        }
    }
}

fn rejected_login(email: &str, status: StatusCode, message: String) -> Response {
    let page = pages::login(email, Some(&Notice::Error(message)));
    (status, Html(page.into_string())).into_response()
}

pub async fn logout(State(state): State<AppState>) -> Redirect {
    if let Err(e) = state.api.logout().await {
        tracing::warn!("Logout failed: {}", e);
    }
    Redirect::to("/")
}

pub async fn contact_page() -> Html<String> {
    Html(pages::contact(None).into_string())
}

/// Acknowledge a contact message; nothing is delivered
pub async fn submit_contact(Form(form): Form<ContactForm>) -> Response {
    if let Err(errors) = form.validate() {
        let message = AppError::from(errors).user_message();
        let page = pages::contact(Some(&Notice::Error(message)));
        return (StatusCode::BAD_REQUEST, Html(page.into_string())).into_response();
    }

    tracing::info!(
        "Contact message from {} <{}>: {}",
        form.name,
        form.email,
        form.subject.as_deref().unwrap_or("(no subject)")
    );
    let notice = Notice::Success("Thanks for reaching out! We'll get back to you soon.".into());
    Html(pages::contact(Some(&notice)).into_string()).into_response()
}

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    #[serde(default)]
    pub category: NotificationFilter,
}

pub async fn dashboard_page(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Html<String> {
    let controller = state.controller.lock().await;
    let snapshot = controller.snapshot();
    let notifications = controller.notifications().visible(query.category);
    Html(pages::dashboard(&snapshot, &notifications, query.category, Utc::now()).into_string())
}
