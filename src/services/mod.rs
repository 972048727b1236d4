// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod events;
pub mod password;
pub mod profile;
pub mod session;
pub mod session_store;
pub mod storage;
pub mod tokens;

pub use events::{AuthEvent, EventPublisher, MemoryEventPublisher, RedisEventPublisher};
pub use password::PasswordHasher;
pub use profile::ProfileService;
pub use session::SessionService;
pub use session_store::{MemorySessionStore, RedisSessionStore, SessionStore};
pub use storage::{AvatarStorage, AvatarUpload, S3Presigner};
pub use tokens::{Claims, TokenKind, TokenManager, TokenPair};
