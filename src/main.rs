use crate::auth::{login, logout, signup};
use crate::db::connection::init_db;
use crate::db::repositories::{choice_repository, question_repository};
use crate::polls::{detail, index, results, vote};
use crate::startup::AppState;
use axum::{
    Router,
    extract::Extension,
    http::{
        StatusCode,
        header::{ACCEPT, CONTENT_TYPE},
    },
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{Duration as ChronoDuration, Utc};
use std::net::SocketAddr;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_sessions::{
    Expiry, SessionManagerLayer,
    cookie::{SameSite, time::Duration},
};
use tower_sessions_sqlx_store::PostgresStore;

#[macro_use]
extern crate tracing;

mod audit;
mod auth;
mod db;
mod error;
mod polls;
mod startup;
mod voting;

#[tokio::main]
async fn main() {
    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "INFO");
        }
    }
    // initialize tracing
    tracing_subscriber::fmt::init();

    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse::<u16>()
        .expect("PORT must be a valid number");

    let db = init_db(&database_url)
        .await
        .expect("Unable to initialize database");

    if std::env::var("SEED_DEMO_DATA").is_ok_and(|v| v == "1" || v == "true") {
        seed_demo_data(&db).await.expect("Unable to seed demo data");
    }

    let app_state = AppState::new(db.clone()).await;

    let session_store = PostgresStore::new(db);
    session_store
        .migrate()
        .await
        .expect("Unable to create session table");

    // build our application with a route
    let app = Router::new()
        .route("/", get(index))
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/:question_id", get(detail))
        .route("/:question_id/results", get(results))
        .route("/:question_id/vote", post(vote))
        .layer(Extension(app_state))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::mirror_request())
                .allow_credentials(true)
                .allow_methods([
                    axum::http::Method::POST,
                    axum::http::Method::GET,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([CONTENT_TYPE, ACCEPT]),
        )
        .layer(
            SessionManagerLayer::new(session_store)
                .with_name("polls")
                .with_same_site(SameSite::Lax)
                .with_secure(false) // TODO: change this to true when running on an HTTPS/production server instead of locally
                .with_expiry(Expiry::OnInactivity(Duration::seconds(360))),
        )
        .fallback(handler_404);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Unable to spawn tcp listener");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}

async fn handler_404() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "nothing to see here")
}

/// One sample question for local development, open for a week.
async fn seed_demo_data(db: &db::connection::DbPool) -> Result<(), sqlx::Error> {
    let now = Utc::now();
    let question_id = question_repository::create_question(
        db,
        "What's your favorite programming language?",
        now,
        now + ChronoDuration::days(7),
    )
    .await?;

    for choice_text in ["Rust", "Python", "Go"] {
        choice_repository::add_choice(db, question_id, choice_text).await?;
    }

    info!("seeded demo question {question_id}");
    Ok(())
}
