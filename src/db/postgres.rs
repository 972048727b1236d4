// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Postgres-backed [`UserRepository`].

use crate::db::UserRepository;
use crate::error::AppError;
use crate::models::{NewUser, Profile, SecurityFlag, SecurityFlags, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

const MAX_CONNECTIONS: u32 = 10;

const USER_COLUMNS: &str = "id, email, nickname, password_hash, provider, provider_id, \
     created_at, two_fa_enabled, login_alerts, allow_new_devices";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    nickname: Option<String>,
    password_hash: Option<Vec<u8>>,
    provider: Option<String>,
    provider_id: Option<String>,
    created_at: DateTime<Utc>,
    two_fa_enabled: bool,
    login_alerts: bool,
    allow_new_devices: bool,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            nickname: row.nickname,
            password_hash: row.password_hash,
            provider: row.provider,
            provider_id: row.provider_id,
            created_at: row.created_at,
            security: SecurityFlags {
                two_fa_enabled: row.two_fa_enabled,
                login_alerts: row.login_alerts,
                allow_new_devices: row.allow_new_devices,
            },
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    email: String,
    full_name: String,
    about: String,
    avatar: String,
    city: String,
    phone: String,
    birthday: String,
}

/// Postgres account store.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Connect and apply pending migrations.
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(database_url)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Postgres: {}", e)))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AppError::Database(format!("Migration failed: {}", e)))?;

        tracing::info!("Connected to Postgres, migrations applied");

        Ok(Self { pool })
    }

    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_user(&self, filter: &str, binds: &[&str]) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {filter}");
        let mut query = sqlx::query_as::<_, UserRow>(&sql);
        for value in binds {
            query = query.bind(*value);
        }
        Ok(query.fetch_optional(&self.pool).await?.map(User::from))
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.fetch_user("email = $1", &[email]).await
    }

    async fn find_by_provider(
        &self,
        provider: &str,
        provider_id: &str,
    ) -> Result<Option<User>, AppError> {
        self.fetch_user("provider = $1 AND provider_id = $2", &[provider, provider_id])
            .await
    }

    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        let sql = format!(
            r#"
            INSERT INTO users (email, nickname, password_hash, provider, provider_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&user.email)
            .bind(&user.nickname)
            .bind(&user.password_hash)
            .bind(&user.provider)
            .bind(&user.provider_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn update_password(&self, id: i64, password_hash: Vec<u8>) -> Result<(), AppError> {
        let rows = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if rows == 0 {
            return Err(AppError::NotFound(format!("User {} not found", id)));
        }
        Ok(())
    }

    async fn set_security_flag(
        &self,
        id: i64,
        flag: SecurityFlag,
        enabled: bool,
    ) -> Result<(), AppError> {
        // Column name comes from a closed enum, never from user input.
        let sql = format!("UPDATE users SET {} = $2 WHERE id = $1", flag.column());
        let rows = sqlx::query(&sql)
            .bind(id)
            .bind(enabled)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if rows == 0 {
            return Err(AppError::NotFound(format!("User {} not found", id)));
        }
        Ok(())
    }

    async fn create_blank_profile(&self, user_id: i64) -> Result<(), AppError> {
        sqlx::query("INSERT INTO profiles (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_profile(&self, user_id: i64) -> Result<Option<Profile>, AppError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT u.email,
                   COALESCE(p.full_name, u.nickname, '')              AS full_name,
                   COALESCE(p.about, '')                              AS about,
                   COALESCE(p.avatar, '')                             AS avatar,
                   COALESCE(p.city, '')                               AS city,
                   COALESCE(p.phone, '')                              AS phone,
                   COALESCE(to_char(p.birthday, 'YYYY-MM-DD'), '')    AS birthday
              FROM users u
              JOIN profiles p ON p.user_id = u.id
             WHERE u.id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Profile {
            user_id,
            full_name: row.full_name,
            about: row.about,
            email: row.email,
            avatar: row.avatar,
            city: row.city,
            phone: row.phone,
            birthday: row.birthday,
        }))
    }

    async fn save_profile(&self, profile: &Profile) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO profiles (user_id, full_name, about, avatar, city, phone, birthday)
            VALUES ($1, NULLIF($2, ''), NULLIF($3, ''), NULLIF($4, ''), NULLIF($5, ''),
                    NULLIF($6, ''), NULLIF($7, '')::date)
            ON CONFLICT (user_id) DO UPDATE
               SET full_name = EXCLUDED.full_name,
                   about     = EXCLUDED.about,
                   avatar    = EXCLUDED.avatar,
                   city      = EXCLUDED.city,
                   phone     = EXCLUDED.phone,
                   birthday  = EXCLUDED.birthday
            "#,
        )
        .bind(profile.user_id)
        .bind(&profile.full_name)
        .bind(&profile.about)
        .bind(&profile.avatar)
        .bind(&profile.city)
        .bind(&profile.phone)
        .bind(&profile.birthday)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
