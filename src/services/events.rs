// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fire-and-forget user lifecycle events.

use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::Serialize;
use std::sync::Mutex;

/// Event payloads, tagged by `event` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuthEvent {
    UserCreated {
        id: i64,
        email: String,
        ts: DateTime<Utc>,
    },
    Login {
        id: i64,
        ts: DateTime<Utc>,
    },
}

impl AuthEvent {
    pub fn user_created(id: i64, email: &str) -> Self {
        AuthEvent::UserCreated {
            id,
            email: email.to_string(),
            ts: Utc::now(),
        }
    }

    pub fn login(id: i64) -> Self {
        AuthEvent::Login { id, ts: Utc::now() }
    }

    /// Partition key: the user id.
    pub fn key(&self) -> i64 {
        match self {
            AuthEvent::UserCreated { id, .. } | AuthEvent::Login { id, .. } => *id,
        }
    }
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: AuthEvent) -> Result<(), AppError>;
}

/// Appends events to a Redis stream (`XADD <stream> * key <id> payload <json>`).
#[derive(Clone)]
pub struct RedisEventPublisher {
    conn: ConnectionManager,
    stream: String,
}

impl RedisEventPublisher {
    pub fn new(conn: ConnectionManager, stream: impl Into<String>) -> Self {
        Self {
            conn,
            stream: stream.into(),
        }
    }
}

#[async_trait]
impl EventPublisher for RedisEventPublisher {
    async fn publish(&self, event: AuthEvent) -> Result<(), AppError> {
        let payload = serde_json::to_string(&event)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("event encode failed: {}", e)))?;
        let key = event.key().to_string();

        let mut conn = self.conn.clone();
        let _: String = conn
            .xadd(
                &self.stream,
                "*",
                &[("key", key.as_str()), ("payload", payload.as_str())],
            )
            .await?;
        Ok(())
    }
}

/// Keeps published events in memory; used by tests and local runs.
#[derive(Default)]
pub struct MemoryEventPublisher {
    events: Mutex<Vec<AuthEvent>>,
    fail: bool,
}

impl MemoryEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A publisher whose every call fails, for exercising best-effort paths.
    pub fn failing() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn events(&self) -> Vec<AuthEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl EventPublisher for MemoryEventPublisher {
    async fn publish(&self, event: AuthEvent) -> Result<(), AppError> {
        if self.fail {
            return Err(AppError::Internal(anyhow::anyhow!("event broker unavailable")));
        }
        self.events
            .lock()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("event log poisoned")))?
            .push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_format() {
        let event = AuthEvent::user_created(7, "a@x.com");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "user_created");
        assert_eq!(json["id"], 7);
        assert_eq!(json["email"], "a@x.com");
        assert!(json["ts"].is_string());

        let json = serde_json::to_value(AuthEvent::login(3)).unwrap();
        assert_eq!(json["event"], "login");
        assert_eq!(json.get("email"), None);
    }
}
