//! Finance ledger and the `finance_series` / `finance_summary` procedures.
//! The daily series is gap-filled so a chart gets one point per civil day.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use db::models::finance_entry::{CategoryTotal, DailyTotals, EntryType, FinanceEntry};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use ts_rs::TS;
use utils::date::add_days;
use uuid::Uuid;

use super::auth::Actor;

/// Longest series a single request may ask for, in days.
const MAX_RANGE_DAYS: i64 = 1000;

#[derive(Debug, Error)]
pub enum FinanceError {
    #[error("{0}")]
    Validation(String),
    #[error("only admins may delete entries")]
    Forbidden,
    #[error("entry not found")]
    NotFound,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct CreateEntryRequest {
    pub entry_date: NaiveDate,
    pub entry_type: EntryType,
    pub amount_cents: i64,
    pub category: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
pub struct SeriesPoint {
    pub day: NaiveDate,
    pub income_cents: i64,
    pub expense_cents: i64,
    pub balance_cents: i64,
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct FinanceSummary {
    pub total_income_cents: i64,
    pub total_expense_cents: i64,
    pub balance_cents: i64,
    pub income_by_category: BTreeMap<String, i64>,
    pub expense_by_category: BTreeMap<String, i64>,
    pub average_daily_balance_cents: i64,
    pub best_day: Option<SeriesPoint>,
    pub worst_day: Option<SeriesPoint>,
}

#[derive(Clone)]
pub struct FinanceService {
    pool: SqlitePool,
}

impl FinanceService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn entries(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<FinanceEntry>, FinanceError> {
        check_range(from, to)?;
        Ok(FinanceEntry::find_in_range(&self.pool, from, to, 200).await?)
    }

    pub async fn add_entry(
        &self,
        actor: Actor,
        request: CreateEntryRequest,
    ) -> Result<FinanceEntry, FinanceError> {
        if request.amount_cents <= 0 {
            return Err(FinanceError::Validation("amount must be positive".into()));
        }
        let category = request
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or("General");
        let note = request
            .note
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());

        Ok(FinanceEntry::insert(
            &self.pool,
            request.entry_date,
            request.entry_type,
            request.amount_cents,
            category,
            note,
            actor.id,
        )
        .await?)
    }

    pub async fn delete_entry(&self, actor: Actor, id: Uuid) -> Result<(), FinanceError> {
        if !actor.is_admin() {
            return Err(FinanceError::Forbidden);
        }
        let deleted = FinanceEntry::delete(&self.pool, id).await?;
        if deleted == 0 {
            return Err(FinanceError::NotFound);
        }
        Ok(())
    }

    /// `finance_series`: one point per day in [from, to], zeros where the
    /// ledger has no entries.
    pub async fn series(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<SeriesPoint>, FinanceError> {
        check_range(from, to)?;
        let totals = FinanceEntry::daily_totals(&self.pool, from, to).await?;
        Ok(fill_series(from, to, &totals))
    }

    /// `finance_summary`: range totals, per-category breakdowns, and the
    /// derived stats the dashboard shows.
    pub async fn summary(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<FinanceSummary, FinanceError> {
        check_range(from, to)?;
        let series = self.series(from, to).await?;
        let categories = FinanceEntry::category_totals(&self.pool, from, to).await?;

        let mut income_by_category = BTreeMap::new();
        let mut expense_by_category = BTreeMap::new();
        for CategoryTotal {
            entry_type,
            category,
            total_cents,
        } in categories
        {
            match entry_type {
                EntryType::Income => income_by_category.insert(category, total_cents),
                EntryType::Expense => expense_by_category.insert(category, total_cents),
            };
        }

        let total_income_cents: i64 = income_by_category.values().sum();
        let total_expense_cents: i64 = expense_by_category.values().sum();

        Ok(FinanceSummary {
            total_income_cents,
            total_expense_cents,
            balance_cents: total_income_cents - total_expense_cents,
            income_by_category,
            expense_by_category,
            average_daily_balance_cents: average_daily_balance(&series),
            best_day: best_day(&series).cloned(),
            worst_day: worst_day(&series).cloned(),
        })
    }
}

fn check_range(from: NaiveDate, to: NaiveDate) -> Result<(), FinanceError> {
    if from > to {
        return Err(FinanceError::Validation("'from' is after 'to'".into()));
    }
    if (to - from).num_days() >= MAX_RANGE_DAYS {
        return Err(FinanceError::Validation(format!(
            "range longer than {MAX_RANGE_DAYS} days"
        )));
    }
    Ok(())
}

fn fill_series(from: NaiveDate, to: NaiveDate, totals: &[DailyTotals]) -> Vec<SeriesPoint> {
    let mut by_day: BTreeMap<NaiveDate, (i64, i64)> = BTreeMap::new();
    for row in totals {
        by_day.insert(row.day, (row.income_cents, row.expense_cents));
    }

    let mut series = Vec::new();
    let mut day = from;
    while day <= to {
        let (income_cents, expense_cents) = by_day.get(&day).copied().unwrap_or((0, 0));
        series.push(SeriesPoint {
            day,
            income_cents,
            expense_cents,
            balance_cents: income_cents - expense_cents,
        });
        day = add_days(day, 1);
    }
    series
}

/// Zero for an empty series.
fn average_daily_balance(series: &[SeriesPoint]) -> i64 {
    if series.is_empty() {
        return 0;
    }
    let total: i64 = series.iter().map(|p| p.balance_cents).sum();
    total / series.len() as i64
}

fn best_day(series: &[SeriesPoint]) -> Option<&SeriesPoint> {
    series.iter().max_by_key(|p| p.balance_cents)
}

fn worst_day(series: &[SeriesPoint]) -> Option<&SeriesPoint> {
    series.iter().min_by_key(|p| p.balance_cents)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn point(day: &str, income: i64, expense: i64) -> SeriesPoint {
        SeriesPoint {
            day: d(day),
            income_cents: income,
            expense_cents: expense,
            balance_cents: income - expense,
        }
    }

    #[test]
    fn empty_series_has_defined_defaults() {
        let series: Vec<SeriesPoint> = Vec::new();
        assert_eq!(average_daily_balance(&series), 0);
        assert!(best_day(&series).is_none());
        assert!(worst_day(&series).is_none());
    }

    #[test]
    fn fill_series_covers_every_day_in_range() {
        let totals = vec![DailyTotals {
            day: d("2025-02-02"),
            income_cents: 10_000,
            expense_cents: 2_500,
        }];
        let series = fill_series(d("2025-02-01"), d("2025-02-04"), &totals);

        assert_eq!(series.len(), 4);
        assert_eq!(series[0], point("2025-02-01", 0, 0));
        assert_eq!(series[1], point("2025-02-02", 10_000, 2_500));
        assert_eq!(series[3], point("2025-02-04", 0, 0));
    }

    #[test]
    fn best_and_worst_days() {
        let series = vec![
            point("2025-02-01", 1_000, 0),
            point("2025-02-02", 0, 5_000),
            point("2025-02-03", 9_000, 100),
        ];
        assert_eq!(best_day(&series).unwrap().day, d("2025-02-03"));
        assert_eq!(worst_day(&series).unwrap().day, d("2025-02-02"));
        assert_eq!(average_daily_balance(&series), (1_000 - 5_000 + 8_900) / 3);
    }

    #[test]
    fn range_validation() {
        assert!(check_range(d("2025-02-02"), d("2025-02-01")).is_err());
        assert!(check_range(d("2020-01-01"), d("2025-01-01")).is_err());
        assert!(check_range(d("2025-02-01"), d("2025-02-01")).is_ok());
    }
}
