use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use std::net::SocketAddr;
use tracing::{info, warn};
use uuid::Uuid;

/// Authentication and voting events observed by the audit log.
///
/// Login failures carry the submitted username, which may not match any
/// account.
#[derive(Debug, Clone)]
pub enum AuthEvent {
    LoginSucceeded {
        username: String,
        ip: String,
        at: DateTime<Utc>,
    },
    LoginFailed {
        username: String,
        ip: String,
        at: DateTime<Utc>,
    },
    LoggedOut {
        username: String,
        ip: String,
        at: DateTime<Utc>,
    },
    VoteCast {
        username: String,
        ip: String,
        question_id: Uuid,
        at: DateTime<Utc>,
    },
}

pub type AuthEventHandler = Box<dyn Fn(&AuthEvent) + Send + Sync>;

/// Dispatches [`AuthEvent`]s to subscribed handlers.
///
/// Handlers are registered once during startup, before the source is shared
/// with the request handlers. Dispatch is synchronous and best-effort:
/// handlers return nothing and cannot fail the emitting request.
#[derive(Default)]
pub struct AuthEventSource {
    handlers: Vec<AuthEventHandler>,
}

impl AuthEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, handler: AuthEventHandler) {
        self.handlers.push(handler);
    }

    pub fn emit(&self, event: &AuthEvent) {
        for handler in &self.handlers {
            handler(event);
        }
    }
}

/// Subscribe the audit log sink: one tracing line per event.
pub fn register_audit_log(events: &mut AuthEventSource) {
    events.subscribe(Box::new(|event| match event {
        AuthEvent::LoginSucceeded { username, ip, at } => {
            info!("login user: {username}, ip: {ip}, date: {at}");
        }
        AuthEvent::LoggedOut { username, ip, at } => {
            info!("logout user: {username}, ip: {ip}, date: {at}");
        }
        AuthEvent::LoginFailed { username, ip, at } => {
            warn!("login failed for user: {username}, ip: {ip}, date: {at}");
        }
        AuthEvent::VoteCast {
            username,
            ip,
            question_id,
            at,
        } => {
            info!("vote by user: {username}, ip: {ip}, question: {question_id}, date: {at}");
        }
    }));
}

/// The client address for audit records: the first entry of the
/// `x-forwarded-for` header when a proxy supplied one, else the peer address.
pub fn client_ip(headers: &HeaderMap, remote: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|entry| entry.trim().to_string())
        .filter(|entry| !entry.is_empty())
        .unwrap_or_else(|| remote.ip().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn remote() -> SocketAddr {
        "192.0.2.7:44321".parse().expect("valid socket address")
    }

    #[test]
    fn client_ip_prefers_forwarded_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );
        assert_eq!(client_ip(&headers, remote()), "203.0.113.9");
    }

    #[test]
    fn client_ip_trims_single_forwarded_entry() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(" 203.0.113.9 "));
        assert_eq!(client_ip(&headers, remote()), "203.0.113.9");
    }

    #[test]
    fn client_ip_falls_back_to_peer_address() {
        assert_eq!(client_ip(&HeaderMap::new(), remote()), "192.0.2.7");
    }

    #[test]
    fn client_ip_ignores_empty_forwarded_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(""));
        assert_eq!(client_ip(&headers, remote()), "192.0.2.7");
    }

    #[test]
    fn emit_reaches_every_subscriber() {
        let mut events = AuthEventSource::new();
        let seen = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let seen = Arc::clone(&seen);
            events.subscribe(Box::new(move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
            }));
        }

        events.emit(&AuthEvent::LoggedOut {
            username: "pat".to_string(),
            ip: "192.0.2.7".to_string(),
            at: Utc::now(),
        });
        events.emit(&AuthEvent::LoginFailed {
            username: "pat".to_string(),
            ip: "192.0.2.7".to_string(),
            at: Utc::now(),
        });

        assert_eq!(seen.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn emit_with_no_subscribers_is_a_no_op() {
        let events = AuthEventSource::new();
        events.emit(&AuthEvent::LoginSucceeded {
            username: "pat".to_string(),
            ip: "192.0.2.7".to_string(),
            at: Utc::now(),
        });
    }
}
