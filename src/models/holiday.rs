use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A non-working date. Rows are written only by the external ingestion job
/// (the `import-holidays` CLI boundary); the core reads them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, FromRow)]
pub struct Holiday {
    pub date: NaiveDate,
}
