use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqlitePoolOptions, FromRow, SqlitePool};
use uuid::Uuid;

use crate::config::FeedConfig;

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Feed {
    #[serde(rename = "ID", alias = "id")]
    pub id: String,
    pub name: String,
    pub url: String,
}

/// Payload for creating a feed. The identifier is optional and generated
/// when absent or blank.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewFeed {
    #[serde(
        rename = "ID",
        alias = "id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    pub name: String,
    pub url: String,
}

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn initialize(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS rss_feeds (
                id TEXT PRIMARY KEY NOT NULL,
                name TEXT NOT NULL,
                url TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert configured feeds whose URL is not stored yet.
    pub async fn seed_feeds(&self, configs: &[FeedConfig]) -> anyhow::Result<u64> {
        let mut inserted = 0;
        for config in configs {
            let result = sqlx::query(
                r#"
                INSERT INTO rss_feeds (id, name, url)
                SELECT ?, ?, ?
                WHERE NOT EXISTS (SELECT 1 FROM rss_feeds WHERE url = ?)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&config.name)
            .bind(&config.url)
            .bind(&config.url)
            .execute(&self.pool)
            .await?;
            inserted += result.rows_affected();
        }
        Ok(inserted)
    }

    pub async fn list_feeds(&self) -> anyhow::Result<Vec<Feed>> {
        let feeds =
            sqlx::query_as::<_, Feed>("SELECT id, name, url FROM rss_feeds ORDER BY rowid")
                .fetch_all(&self.pool)
                .await?;
        Ok(feeds)
    }

    pub async fn get_feed(&self, id: &str) -> anyhow::Result<Option<Feed>> {
        let feed = sqlx::query_as::<_, Feed>("SELECT id, name, url FROM rss_feeds WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(feed)
    }

    pub async fn create_feed(&self, new_feed: NewFeed) -> anyhow::Result<Feed> {
        let id = new_feed
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let feed = sqlx::query_as::<_, Feed>(
            r#"
            INSERT INTO rss_feeds (id, name, url)
            VALUES (?, ?, ?)
            RETURNING id, name, url
            "#,
        )
        .bind(&id)
        .bind(&new_feed.name)
        .bind(&new_feed.url)
        .fetch_one(&self.pool)
        .await?;

        Ok(feed)
    }

    /// Returns `false` when no feed has this identifier.
    pub async fn delete_feed(&self, id: &str) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM rss_feeds WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
