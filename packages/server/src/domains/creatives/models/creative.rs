use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::StoreError;

/// Creative model - SQL persistence layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Creative {
    pub id: i64,
    #[serde(skip_serializing, default)]
    pub user_id: i64,
    /// Path of the stored file.
    pub creative_url: String,
    pub scheduled_at: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Creatives going out today and tomorrow.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScheduledCreatives {
    pub today: Vec<Creative>,
    pub tomorrow: Vec<Creative>,
}

impl ScheduledCreatives {
    /// Bucket creatives by date relative to `today`; anything else is dropped.
    pub fn group(creatives: Vec<Creative>, today: NaiveDate) -> Self {
        let tomorrow = today + Duration::days(1);
        let mut grouped = Self::default();

        for creative in creatives {
            if creative.scheduled_at == today {
                grouped.today.push(creative);
            } else if creative.scheduled_at == tomorrow {
                grouped.tomorrow.push(creative);
            }
        }

        grouped
    }
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Creative {
    /// Insert a new creative for `user_id`
    pub async fn insert(
        user_id: i64,
        creative_url: &str,
        scheduled_at: NaiveDate,
        pool: &PgPool,
    ) -> Result<Self, StoreError> {
        let creative = sqlx::query_as::<_, Creative>(
            r#"
            INSERT INTO creatives (user_id, creative_url, scheduled_at)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, creative_url, scheduled_at, created_at
            "#,
        )
        .bind(user_id)
        .bind(creative_url)
        .bind(scheduled_at)
        .fetch_one(pool)
        .await?;
        Ok(creative)
    }

    /// Find creatives scheduled on any of `dates`
    pub async fn find_scheduled_on(
        dates: &[NaiveDate],
        pool: &PgPool,
    ) -> Result<Vec<Self>, StoreError> {
        let creatives = sqlx::query_as::<_, Creative>(
            r#"
            SELECT id, user_id, creative_url, scheduled_at, created_at
            FROM creatives
            WHERE scheduled_at = ANY($1)
            ORDER BY scheduled_at, created_at
            "#,
        )
        .bind(dates)
        .fetch_all(pool)
        .await?;
        Ok(creatives)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creative(id: i64, scheduled_at: NaiveDate) -> Creative {
        Creative {
            id,
            user_id: 1,
            creative_url: format!("./uploads/{id}.png"),
            scheduled_at,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_group_buckets_today_and_tomorrow() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let tomorrow = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        let later = NaiveDate::from_ymd_opt(2026, 10, 20).unwrap();

        let grouped = ScheduledCreatives::group(
            vec![creative(1, today), creative(2, tomorrow), creative(3, later), creative(4, today)],
            today,
        );

        assert_eq!(grouped.today.iter().map(|c| c.id).collect::<Vec<_>>(), vec![1, 4]);
        assert_eq!(grouped.tomorrow.iter().map(|c| c.id).collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_creative_json_hides_user_id() {
        let json = serde_json::to_value(creative(9, NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()))
            .unwrap();
        assert!(json.get("user_id").is_none());
        assert_eq!(json["scheduled_at"], "2026-10-17");
        assert_eq!(json["creative_url"], "./uploads/9.png");
    }
}
