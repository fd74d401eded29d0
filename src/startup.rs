use crate::audit::{AuthEventSource, register_audit_log};
use crate::db::connection::DbPool;
use std::sync::Arc;
use tokio::time::{Duration, interval};
use tracing::error;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub auth_events: Arc<AuthEventSource>,
}

impl AppState {
    pub async fn new(db: DbPool) -> Self {
        let mut auth_events = AuthEventSource::new();
        register_audit_log(&mut auth_events);

        let db_clone = db.clone();
        tokio::spawn(async move {
            let mut interval = interval(Duration::from_secs(60));
            loop {
                interval.tick().await;
                match db_clone.acquire().await {
                    Ok(conn) => {
                        drop(conn);
                    }
                    Err(e) => {
                        error!("Database connection health check failed: {}", e);
                    }
                }
            }
        });

        AppState {
            db,
            auth_events: Arc::new(auth_events),
        }
    }
}
