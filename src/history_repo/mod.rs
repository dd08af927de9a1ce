// SQLite score history. Summary scores live in columns for cheap queries;
// the full report is a version-prefixed wincode blob.

mod blob;

use crate::models::{HealthReport, ScoreSample};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use std::path::Path;
use std::str::FromStr;
use tracing::instrument;

pub struct HistoryRepo {
    pool: SqlitePool,
    retention_ms: i64,
}

impl HistoryRepo {
    pub async fn connect(path: &str, retention_days: u32) -> anyhow::Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new().connect_with(opts).await?;
        let retention_ms = i64::from(retention_days) * 24 * 60 * 60 * 1000;
        Ok(Self { pool, retention_ms })
    }

    pub async fn init(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS score_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                created_at INTEGER NOT NULL,
                global_score INTEGER NOT NULL,
                hardware_score INTEGER NOT NULL,
                application_score INTEGER NOT NULL,
                report_data BLOB NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_score_history_created_at ON score_history(created_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[instrument(skip(self, samples), fields(repo = "history", operation = "save_samples", samples_count = samples.len()))]
    pub async fn save_samples(&self, samples: &[ScoreSample]) -> anyhow::Result<()> {
        if samples.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await?;
        for s in samples {
            let report_data = blob::with_version_prefix(
                blob::REPORT_BLOB_VERSION,
                wincode::serialize(&s.report).map_err(|e| anyhow::anyhow!("wincode: {}", e))?,
            );
            sqlx::query(
                "INSERT INTO score_history (created_at, global_score, hardware_score, application_score, report_data) VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(s.timestamp as i64)
            .bind(i64::from(s.report.global_score))
            .bind(i64::from(s.report.hardware_score))
            .bind(i64::from(s.report.application_score))
            .bind(&report_data)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Most recent `limit` samples, oldest first.
    #[instrument(skip(self), fields(repo = "history", operation = "get_recent_samples"))]
    pub async fn get_recent_samples(&self, limit: u32) -> anyhow::Result<Vec<ScoreSample>> {
        let rows = sqlx::query(
            "SELECT created_at, report_data FROM score_history ORDER BY id DESC LIMIT $1",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(Self::parse_sample_row(&row)?);
        }
        out.reverse();
        Ok(out)
    }

    pub async fn latest_sample(&self) -> anyhow::Result<Option<ScoreSample>> {
        let row = sqlx::query(
            "SELECT created_at, report_data FROM score_history ORDER BY id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(Self::parse_sample_row).transpose()
    }

    pub async fn count(&self) -> anyhow::Result<u64> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM score_history")
            .fetch_one(&self.pool)
            .await?;
        Ok(n.max(0) as u64)
    }

    /// Deletes samples older than the retention window. Returns rows removed.
    #[instrument(skip(self), fields(repo = "history", operation = "prune_old_data"))]
    pub async fn prune_old_data(&self) -> anyhow::Result<u64> {
        let now_ms = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)?
            .as_millis() as i64;
        self.prune_before(now_ms - self.retention_ms).await
    }

    /// Deletes samples with created_at < cutoff_ms. Returns rows removed.
    pub async fn prune_before(&self, cutoff_ms: i64) -> anyhow::Result<u64> {
        let r = sqlx::query("DELETE FROM score_history WHERE created_at < $1")
            .bind(cutoff_ms)
            .execute(&self.pool)
            .await?;
        Ok(r.rows_affected())
    }

    #[instrument(skip(self), fields(repo = "history", operation = "vacuum"))]
    pub async fn vacuum(&self) -> anyhow::Result<()> {
        sqlx::query("VACUUM").execute(&self.pool).await?;
        Ok(())
    }

    fn parse_sample_row(row: &SqliteRow) -> anyhow::Result<ScoreSample> {
        let created_at: i64 = row.try_get("created_at")?;
        let data: Vec<u8> = row.try_get("report_data")?;
        let report = match blob::split_version(&data) {
            Some((blob::REPORT_BLOB_VERSION, payload)) => wincode::deserialize::<HealthReport>(
                payload,
            )
            .map_err(|e| anyhow::anyhow!("wincode deserialize report: {}", e))?,
            Some((version, _)) => anyhow::bail!("unsupported report blob version {}", version),
            None => anyhow::bail!("empty report blob"),
        };
        Ok(ScoreSample {
            timestamp: created_at.max(0) as u64,
            report,
        })
    }
}
