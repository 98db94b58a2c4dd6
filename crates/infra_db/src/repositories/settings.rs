//! User settings repository
//!
//! The only setting the scheduler cares about is the user's timezone, which
//! anchors all recurring date arithmetic. A missing row or an unparsable
//! identifier falls back to UTC.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::warn;

use core_kernel::{DomainPort, PortError, Timezone, UserId};
use domain_invoicing::TimezoneDirectory;

use crate::error::DatabaseError;

/// PostgreSQL adapter for the `TimezoneDirectory` port
#[derive(Debug, Clone)]
pub struct PgTimezoneDirectory {
    pool: PgPool,
}

impl PgTimezoneDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Upserts a user's timezone setting
    pub async fn set_timezone(&self, user_id: UserId, tz: Timezone) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO user_settings (user_id, timezone) VALUES ($1, $2) \
             ON CONFLICT (user_id) DO UPDATE SET timezone = $2, updated_at = now()",
        )
        .bind(user_id.as_uuid())
        .bind(tz.name())
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::classify)?;
        Ok(())
    }
}

impl DomainPort for PgTimezoneDirectory {}

#[async_trait]
impl TimezoneDirectory for PgTimezoneDirectory {
    async fn timezone_for(&self, user_id: UserId) -> Result<Timezone, PortError> {
        let name: Option<String> =
            sqlx::query_scalar("SELECT timezone FROM user_settings WHERE user_id = $1")
                .bind(user_id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| PortError::from(DatabaseError::classify(e)))?;

        match name {
            Some(name) => match Timezone::parse(&name) {
                Ok(tz) => Ok(tz),
                Err(_) => {
                    warn!(user_id = %user_id, timezone = %name, "unparsable timezone setting, using UTC");
                    Ok(Timezone::default())
                }
            },
            None => Ok(Timezone::default()),
        }
    }
}
