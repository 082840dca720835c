use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize, TS, EnumString, Display,
)]
#[sqlx(type_name = "entry_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EntryType {
    Income,
    Expense,
}

#[derive(Debug, Clone, FromRow, Serialize, TS)]
pub struct FinanceEntry {
    pub id: Uuid,
    pub entry_date: NaiveDate,
    pub entry_type: EntryType,
    pub amount_cents: i64,
    pub category: String,
    pub note: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Per-day income/expense totals, one row per day that has entries.
#[derive(Debug, Clone, FromRow)]
pub struct DailyTotals {
    pub day: NaiveDate,
    pub income_cents: i64,
    pub expense_cents: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct CategoryTotal {
    pub entry_type: EntryType,
    pub category: String,
    pub total_cents: i64,
}

const ENTRY_COLUMNS: &str =
    "id, entry_date, entry_type, amount_cents, category, note, created_by, created_at";

impl FinanceEntry {
    pub async fn find_in_range(
        pool: &SqlitePool,
        from: NaiveDate,
        to: NaiveDate,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM finance_entries
             WHERE entry_date BETWEEN $1 AND $2
             ORDER BY entry_date DESC, created_at DESC
             LIMIT $3"
        ))
        .bind(from)
        .bind(to)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    pub async fn insert(
        pool: &SqlitePool,
        entry_date: NaiveDate,
        entry_type: EntryType,
        amount_cents: i64,
        category: &str,
        note: Option<&str>,
        created_by: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            "INSERT INTO finance_entries
                 (id, entry_date, entry_type, amount_cents, category, note, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {ENTRY_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(entry_date)
        .bind(entry_type)
        .bind(amount_cents)
        .bind(category)
        .bind(note)
        .bind(created_by)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM finance_entries WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn daily_totals(
        pool: &SqlitePool,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyTotals>, sqlx::Error> {
        sqlx::query_as::<_, DailyTotals>(
            "SELECT entry_date AS day,
                    COALESCE(SUM(CASE WHEN entry_type = 'income' THEN amount_cents ELSE 0 END), 0)
                        AS income_cents,
                    COALESCE(SUM(CASE WHEN entry_type = 'expense' THEN amount_cents ELSE 0 END), 0)
                        AS expense_cents
             FROM finance_entries
             WHERE entry_date BETWEEN $1 AND $2
             GROUP BY entry_date
             ORDER BY entry_date ASC",
        )
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await
    }

    pub async fn category_totals(
        pool: &SqlitePool,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<CategoryTotal>, sqlx::Error> {
        sqlx::query_as::<_, CategoryTotal>(
            "SELECT entry_type, category, COALESCE(SUM(amount_cents), 0) AS total_cents
             FROM finance_entries
             WHERE entry_date BETWEEN $1 AND $2
             GROUP BY entry_type, category
             ORDER BY total_cents DESC",
        )
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await
    }
}
