use anyhow::{Context as _, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteConnectOptions, ConnectOptions, SqlitePool};
use std::{path::Path, str::FromStr};
use uuid::Uuid;

// ─── Domain enums ────────────────────────────────────────────────────────────

/// Kind of product change a feature announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureType {
    New,
    Update,
    Fix,
}

impl FeatureType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureType::New => "new",
            FeatureType::Update => "update",
            FeatureType::Fix => "fix",
        }
    }
}

impl FromStr for FeatureType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(FeatureType::New),
            "update" => Ok(FeatureType::Update),
            "fix" => Ok(FeatureType::Fix),
            other => Err(format!("unknown feature type '{other}'")),
        }
    }
}

/// Tracked event kinds. Anything else is rejected at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpressionType {
    View,
    Click,
}

impl ImpressionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImpressionType::View => "view",
            ImpressionType::Click => "click",
        }
    }
}

impl FromStr for ImpressionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(ImpressionType::View),
            "click" => Ok(ImpressionType::Click),
            other => Err(format!("unknown impression type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Editor,
    Owner,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Editor => "editor",
            Role::Owner => "owner",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Starter,
    Pro,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Starter => "starter",
            Plan::Pro => "pro",
        }
    }

    pub fn is_free(&self) -> bool {
        matches!(self, Plan::Free)
    }
}

impl FromStr for Plan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Plan::Free),
            "starter" => Ok(Plan::Starter),
            "pro" => Ok(Plan::Pro),
            other => Err(format!("unknown plan '{other}'")),
        }
    }
}

// ─── Row types ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct FeatureRow {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub feature_type: String,
    /// Denormalized view counter. Mutated only by the impression tracker.
    pub impressions: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct ImpressionRow {
    pub id: String,
    pub feature_id: String,
    pub user_id: String,
    pub impression_type: String,
    pub created_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct TeamMemberRow {
    pub id: String,
    pub user_id: String,
    pub invited_email: String,
    pub role: String,
    pub created_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct UserSettingsRow {
    pub user_id: String,
    pub primary_color: String,
    pub hide_branding: bool,
    pub plan: String,
}

impl UserSettingsRow {
    /// Defaults for a user who has never saved settings.
    pub fn defaults(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            primary_color: crate::embed::DEFAULT_COLOR.to_string(),
            hide_branding: false,
            plan: Plan::Free.as_str().to_string(),
        }
    }

    pub fn plan(&self) -> Plan {
        Plan::from_str(&self.plan).unwrap_or(Plan::Free)
    }
}

// ─── Storage ─────────────────────────────────────────────────────────────────

/// Queries slower than this are logged at WARN level.
const SLOW_QUERY_MS: u64 = 250;

#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    pub async fn new(data_dir: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(data_dir).await?;
        let db_path = data_dir.join("blastd.db");
        let opts =
            SqliteConnectOptions::from_str(&format!("sqlite://{}?mode=rwc", db_path.display()))?
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
                .create_if_missing(true)
                .log_slow_statements(
                    log::LevelFilter::Warn,
                    std::time::Duration::from_millis(SLOW_QUERY_MS),
                );

        let pool = SqlitePool::connect_with(opts).await?;
        sqlx::migrate!("src/storage/migrations")
            .run(&pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(Self { pool })
    }

    /// Return a clone of the connection pool (cheap — Arc-backed).
    /// Used to create AnalyticsStorage that shares the same SQLite connection.
    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    // ─── Features ───────────────────────────────────────────────────────────

    pub async fn create_feature(
        &self,
        user_id: &str,
        title: &str,
        description: &str,
        feature_type: FeatureType,
    ) -> Result<FeatureRow, sqlx::Error> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO features (id, user_id, title, description, feature_type, impressions, created_at)
             VALUES (?, ?, ?, ?, ?, 0, ?)",
        )
        .bind(&id)
        .bind(user_id)
        .bind(title)
        .bind(description)
        .bind(feature_type.as_str())
        .bind(&now)
        .execute(&self.pool)
        .await?;
        self.get_feature(&id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn get_feature(&self, id: &str) -> Result<Option<FeatureRow>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM features WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Feature looked up by id and owner together. This is the authorization
    /// boundary for the impression tracker: a (featureId, uid) pair that does
    /// not match an owned feature yields None.
    pub async fn get_feature_owned(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<Option<FeatureRow>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM features WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn list_features(&self, user_id: &str) -> Result<Vec<FeatureRow>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM features WHERE user_id = ? ORDER BY created_at DESC")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
    }

    /// The `limit` most recently created features for a user, newest first.
    pub async fn latest_features(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<FeatureRow>, sqlx::Error> {
        sqlx::query_as(
            "SELECT * FROM features WHERE user_id = ? ORDER BY created_at DESC LIMIT ?",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    /// Atomic increment of the denormalized view counter.
    pub async fn increment_feature_impressions(&self, id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE features SET impressions = impressions + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ─── Impressions ────────────────────────────────────────────────────────

    pub async fn insert_impression(
        &self,
        feature_id: &str,
        user_id: &str,
        impression_type: ImpressionType,
    ) -> Result<(), sqlx::Error> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO impressions (id, feature_id, user_id, impression_type, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(feature_id)
        .bind(user_id)
        .bind(impression_type.as_str())
        .bind(&now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn count_impressions(&self, feature_id: &str) -> Result<i64, sqlx::Error> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM impressions WHERE feature_id = ?")
                .bind(feature_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(row.0)
    }

    // ─── Team members ───────────────────────────────────────────────────────

    pub async fn list_team_members(
        &self,
        user_id: &str,
    ) -> Result<Vec<TeamMemberRow>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM team_members WHERE user_id = ? ORDER BY created_at DESC")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
    }

    /// Insert an invite. (user_id, invited_email) is unique — a duplicate
    /// surfaces as a database unique violation for the caller to map.
    pub async fn invite_team_member(
        &self,
        user_id: &str,
        invited_email: &str,
        role: Role,
    ) -> Result<TeamMemberRow, sqlx::Error> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO team_members (id, user_id, invited_email, role, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(user_id)
        .bind(invited_email)
        .bind(role.as_str())
        .bind(&now)
        .execute(&self.pool)
        .await?;
        sqlx::query_as("SELECT * FROM team_members WHERE id = ?")
            .bind(&id)
            .fetch_one(&self.pool)
            .await
    }

    /// Remove an invite. Owner-scoped: deleting someone else's row is a no-op.
    /// Returns whether a row was actually removed.
    pub async fn remove_team_member(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM team_members WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ─── User settings ──────────────────────────────────────────────────────

    pub async fn get_user_settings(
        &self,
        user_id: &str,
    ) -> Result<Option<UserSettingsRow>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM user_settings WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Settings for a user, falling back to defaults when none were saved yet.
    pub async fn get_user_settings_or_default(
        &self,
        user_id: &str,
    ) -> Result<UserSettingsRow, sqlx::Error> {
        Ok(self
            .get_user_settings(user_id)
            .await?
            .unwrap_or_else(|| UserSettingsRow::defaults(user_id)))
    }

    pub async fn upsert_user_settings(
        &self,
        user_id: &str,
        primary_color: &str,
        hide_branding: bool,
        plan: Plan,
    ) -> Result<UserSettingsRow, sqlx::Error> {
        sqlx::query(
            "INSERT INTO user_settings (user_id, primary_color, hide_branding, plan)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET
               primary_color = excluded.primary_color,
               hide_branding = excluded.hide_branding,
               plan = excluded.plan",
        )
        .bind(user_id)
        .bind(primary_color)
        .bind(hide_branding)
        .bind(plan.as_str())
        .execute(&self.pool)
        .await?;
        sqlx::query_as("SELECT * FROM user_settings WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
    }
}
