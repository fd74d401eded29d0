use crate::audit::{AuthEvent, client_ip};
use crate::db::repositories::user_repository;
use crate::error::AuthError;
use crate::startup::AppState;
use axum::{
    extract::{ConnectInfo, Extension, Json},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use tower_sessions::Session;
use tracing::info;
use uuid::Uuid;

const USER_ID_KEY: &str = "user_id";
const USERNAME_KEY: &str = "username";

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// The logged-in user as recorded in the session cookie.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub id: Uuid,
    pub username: String,
}

pub async fn session_user(session: &Session) -> Result<SessionUser, AuthError> {
    let id = session
        .get::<Uuid>(USER_ID_KEY)
        .await
        .map_err(|_| AuthError::Unauthorized)?
        .ok_or(AuthError::Unauthorized)?;
    let username = session
        .get::<String>(USERNAME_KEY)
        .await
        .map_err(|_| AuthError::Unauthorized)?
        .ok_or(AuthError::Unauthorized)?;

    Ok(SessionUser { id, username })
}

pub async fn maybe_session_user(session: &Session) -> Option<SessionUser> {
    session_user(session).await.ok()
}

/// Create an account (username must be free)
pub async fn signup(
    Extension(app_state): Extension<AppState>,
    Json(payload): Json<Credentials>,
) -> Result<impl IntoResponse, AuthError> {
    if payload.username.is_empty() || payload.password.is_empty() {
        return Err(AuthError::InvalidRequest);
    }

    if user_repository::get_user_by_username(&app_state.db, &payload.username)
        .await?
        .is_some()
    {
        return Err(AuthError::UserAlreadyExists);
    }

    let password_hash =
        bcrypt::hash(&payload.password, bcrypt::DEFAULT_COST).map_err(|_| AuthError::PasswordHash)?;
    user_repository::create_user(&app_state.db, Uuid::new_v4(), &payload.username, &password_hash)
        .await?;

    info!("account created: {}", payload.username);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "message": "Account created"
        })),
    ))
}

/// Log in with username and password, starting an authenticated session
pub async fn login(
    Extension(app_state): Extension<AppState>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    session: Session,
    Json(payload): Json<Credentials>,
) -> Result<impl IntoResponse, AuthError> {
    let ip = client_ip(&headers, remote);

    let Some(user) = user_repository::get_user_by_username(&app_state.db, &payload.username).await?
    else {
        app_state.auth_events.emit(&AuthEvent::LoginFailed {
            username: payload.username.clone(),
            ip,
            at: Utc::now(),
        });
        return Err(AuthError::InvalidCredentials);
    };

    if !bcrypt::verify(&payload.password, &user.password_hash).unwrap_or(false) {
        app_state.auth_events.emit(&AuthEvent::LoginFailed {
            username: payload.username.clone(),
            ip,
            at: Utc::now(),
        });
        return Err(AuthError::InvalidCredentials);
    }

    session
        .insert(USER_ID_KEY, user.id)
        .await
        .map_err(|_| AuthError::CorruptSession)?;
    session
        .insert(USERNAME_KEY, user.username.clone())
        .await
        .map_err(|_| AuthError::CorruptSession)?;

    app_state.auth_events.emit(&AuthEvent::LoginSucceeded {
        username: user.username,
        ip,
        at: Utc::now(),
    });

    Ok((
        StatusCode::OK,
        Json(json!({
            "status": "success",
            "message": "Logged in"
        })),
    ))
}

/// End the authenticated session
pub async fn logout(
    Extension(app_state): Extension<AppState>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    session: Session,
) -> Result<impl IntoResponse, AuthError> {
    let user = session_user(&session).await?;
    let ip = client_ip(&headers, remote);

    session
        .flush()
        .await
        .map_err(|_| AuthError::CorruptSession)?;

    app_state.auth_events.emit(&AuthEvent::LoggedOut {
        username: user.username,
        ip,
        at: Utc::now(),
    });

    Ok((
        StatusCode::OK,
        Json(json!({
            "status": "success",
            "message": "Logged out"
        })),
    ))
}
