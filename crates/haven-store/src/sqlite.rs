//! SQLite durable store
//!
//! Default durable backend: an embedded database holding user profiles,
//! the conversation log, crisis events, and check-in bookkeeping. The
//! schema is created on open; WAL keeps concurrent readers cheap.

use crate::durable::{
    CheckInRecord, ConversationRecord, CrisisEventRecord, DurableStore, UserProfile,
};
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use haven_risk::RiskLevel;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// SQLite-backed durable store
pub struct SqliteStore {
    pool: SqlitePool,
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_level(raw: &str) -> RiskLevel {
    RiskLevel::parse(raw).unwrap_or(RiskLevel::None)
}

fn parse_categories(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

impl SqliteStore {
    /// Open (creating if missing) a store at the given path
    ///
    /// # Errors
    ///
    /// Returns error if the database cannot be created or the schema
    /// cannot be initialized.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::Durable(format!("Failed to create database directory: {}", e))
            })?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
            .map_err(|e| Error::Durable(format!("Invalid SQLite path: {}", e)))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| Error::Durable(format!("Failed to connect to SQLite: {}", e)))?;

        let store = Self { pool };
        store.init_schema().await?;

        info!(path = %path.display(), "SQLite durable store initialized");
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS users (
                phone_number TEXT PRIMARY KEY,
                first_interaction TEXT NOT NULL,
                last_interaction TEXT NOT NULL,
                total_messages INTEGER NOT NULL DEFAULT 0,
                risk_level TEXT NOT NULL DEFAULT 'none',
                is_active INTEGER NOT NULL DEFAULT 1,
                metadata TEXT NOT NULL DEFAULT '{}'
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS conversations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                phone_number TEXT NOT NULL,
                message TEXT NOT NULL,
                direction TEXT NOT NULL,
                risk_level TEXT NOT NULL DEFAULT 'none',
                risk_categories TEXT NOT NULL DEFAULT '[]',
                timestamp TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS crisis_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                phone_number TEXT NOT NULL,
                risk_level TEXT NOT NULL,
                risk_categories TEXT NOT NULL DEFAULT '[]',
                message_preview TEXT NOT NULL,
                escalated INTEGER NOT NULL DEFAULT 0,
                resolved INTEGER NOT NULL DEFAULT 0,
                timestamp TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS check_ins (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                phone_number TEXT NOT NULL,
                sent_at TEXT NOT NULL,
                responded INTEGER NOT NULL DEFAULT 0,
                response_text TEXT,
                response_time TEXT
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_conversations_phone ON conversations(phone_number)",
            "CREATE INDEX IF NOT EXISTS idx_crisis_events_phone ON crisis_events(phone_number)",
            "CREATE INDEX IF NOT EXISTS idx_check_ins_phone ON check_ins(phone_number, responded)",
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| Error::Durable(format!("Failed to initialize schema: {}", e)))?;
        }

        debug!("durable schema initialized");
        Ok(())
    }

    /// Check database health
    pub async fn health_check(&self) -> Result<bool> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Error::Durable(format!("Health check failed: {}", e)))?;
        Ok(true)
    }
}

#[async_trait]
impl DurableStore for SqliteStore {
    async fn get_user(&self, phone_number: &str) -> Result<Option<UserProfile>> {
        let row: Option<(String, String, String, i64, String, i64, String)> = sqlx::query_as(
            "SELECT phone_number, first_interaction, last_interaction, total_messages, \
             risk_level, is_active, metadata FROM users WHERE phone_number = ?",
        )
        .bind(phone_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Durable(format!("Failed to get user: {}", e)))?;

        Ok(row.map(
            |(phone, first, last, total, level, active, metadata)| UserProfile {
                phone_number: phone,
                first_interaction: parse_timestamp(&first),
                last_interaction: parse_timestamp(&last),
                total_messages: total,
                risk_level: parse_level(&level),
                is_active: active != 0,
                metadata: serde_json::from_str(&metadata).unwrap_or(serde_json::Value::Null),
            },
        ))
    }

    async fn upsert_user_activity(&self, phone_number: &str, level: RiskLevel) -> Result<()> {
        // High-water risk comparison happens in Rust; levels are stored as
        // text and ordered only via RiskLevel ranks.
        let current = self
            .get_user(phone_number)
            .await?
            .map(|p| p.risk_level)
            .unwrap_or(RiskLevel::None);
        let high_water = if level > current { level } else { current };
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO users (phone_number, first_interaction, last_interaction,
                               total_messages, risk_level, is_active, metadata)
            VALUES (?, ?, ?, 1, ?, 1, '{}')
            ON CONFLICT(phone_number) DO UPDATE SET
                total_messages = total_messages + 1,
                last_interaction = excluded.last_interaction,
                risk_level = excluded.risk_level
            "#,
        )
        .bind(phone_number)
        .bind(&now)
        .bind(&now)
        .bind(high_water.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Durable(format!("Failed to upsert user: {}", e)))?;

        debug!(phone = %phone_number, level = %high_water, "user activity recorded");
        Ok(())
    }

    async fn set_user_active(&self, phone_number: &str, active: bool) -> Result<()> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO users (phone_number, first_interaction, last_interaction,
                               total_messages, risk_level, is_active, metadata)
            VALUES (?, ?, ?, 0, 'none', ?, '{}')
            ON CONFLICT(phone_number) DO UPDATE SET
                is_active = excluded.is_active
            "#,
        )
        .bind(phone_number)
        .bind(&now)
        .bind(&now)
        .bind(i64::from(active))
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Durable(format!("Failed to set user active: {}", e)))?;

        Ok(())
    }

    async fn record_conversation(&self, record: &ConversationRecord) -> Result<()> {
        let categories = serde_json::to_string(&record.risk_categories)
            .map_err(|e| Error::Serialization(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO conversations (phone_number, message, direction, risk_level,
                                       risk_categories, timestamp)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.phone_number)
        .bind(&record.message)
        .bind(record.direction.as_str())
        .bind(record.risk_level.as_str())
        .bind(&categories)
        .bind(record.timestamp.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Durable(format!("Failed to record conversation: {}", e)))?;

        Ok(())
    }

    async fn record_crisis_event(&self, event: &CrisisEventRecord) -> Result<i64> {
        let categories = serde_json::to_string(&event.risk_categories)
            .map_err(|e| Error::Serialization(e.to_string()))?;

        let result = sqlx::query(
            r#"
            INSERT INTO crisis_events (phone_number, risk_level, risk_categories,
                                       message_preview, escalated, resolved, timestamp)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&event.phone_number)
        .bind(event.risk_level.as_str())
        .bind(&categories)
        .bind(&event.message_preview)
        .bind(i64::from(event.escalated))
        .bind(i64::from(event.resolved))
        .bind(event.timestamp.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Durable(format!("Failed to record crisis event: {}", e)))?;

        Ok(result.last_insert_rowid())
    }

    async fn record_checkin_sent(&self, phone_number: &str) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO check_ins (phone_number, sent_at, responded) VALUES (?, ?, 0)",
        )
        .bind(phone_number)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Durable(format!("Failed to record check-in: {}", e)))?;

        Ok(result.last_insert_rowid())
    }

    async fn open_checkin(&self, phone_number: &str) -> Result<Option<CheckInRecord>> {
        let row: Option<(i64, String, String)> = sqlx::query_as(
            "SELECT id, phone_number, sent_at FROM check_ins \
             WHERE phone_number = ? AND responded = 0 \
             ORDER BY sent_at DESC LIMIT 1",
        )
        .bind(phone_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Durable(format!("Failed to query check-ins: {}", e)))?;

        Ok(row.map(|(id, phone, sent_at)| CheckInRecord {
            id,
            phone_number: phone,
            sent_at: parse_timestamp(&sent_at),
            responded: false,
            response_text: None,
            response_time: None,
        }))
    }

    async fn mark_checkin_responded(&self, id: i64, response_text: &str) -> Result<()> {
        sqlx::query(
            "UPDATE check_ins SET responded = 1, response_text = ?, response_time = ? \
             WHERE id = ?",
        )
        .bind(response_text)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Durable(format!("Failed to mark check-in responded: {}", e)))?;

        Ok(())
    }

    async fn crisis_events_for(&self, phone_number: &str) -> Result<Vec<CrisisEventRecord>> {
        let rows: Vec<(i64, String, String, String, String, i64, i64, String)> = sqlx::query_as(
            "SELECT id, phone_number, risk_level, risk_categories, message_preview, \
             escalated, resolved, timestamp FROM crisis_events \
             WHERE phone_number = ? ORDER BY id DESC",
        )
        .bind(phone_number)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::Durable(format!("Failed to query crisis events: {}", e)))?;

        Ok(rows
            .into_iter()
            .map(
                |(id, phone, level, categories, preview, escalated, resolved, ts)| {
                    CrisisEventRecord {
                        id: Some(id),
                        phone_number: phone,
                        risk_level: parse_level(&level),
                        risk_categories: parse_categories(&categories),
                        message_preview: preview,
                        escalated: escalated != 0,
                        resolved: resolved != 0,
                        timestamp: parse_timestamp(&ts),
                    }
                },
            )
            .collect())
    }
}
