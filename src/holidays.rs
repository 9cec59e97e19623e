use chrono::NaiveDate;
use sqlx::SqlitePool;

use crate::errors::AppResult;
use crate::models::holiday::Holiday;

/// Read-only view of the non-working-day table. Zero rows is a valid state:
/// business-day arithmetic then degrades to plain weekday skipping.
#[derive(Clone)]
pub struct HolidayCalendar {
    pool: SqlitePool,
}

impl HolidayCalendar {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Holiday dates inside `[from, to]`, ascending.
    pub async fn range(&self, from: NaiveDate, to: NaiveDate) -> AppResult<Vec<NaiveDate>> {
        let rows = sqlx::query_as::<_, Holiday>(
            "SELECT date FROM holidays WHERE date >= ? AND date <= ? ORDER BY date ASC",
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|holiday| holiday.date).collect())
    }
}
