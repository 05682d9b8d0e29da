//! Credentialed access to the spreadsheet that backs the dashboard.

pub mod auth;
pub mod google;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SheetsError;

pub use auth::ServiceAccountAuth;
pub use google::GoogleSheetsClient;

/// One single-cell write: put `value` verbatim into `range`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellUpdate {
    pub range: String,
    pub value: String,
}

impl CellUpdate {
    pub fn new(range: impl Into<String>, value: impl Into<String>) -> Self {
        CellUpdate {
            range: range.into(),
            value: value.into(),
        }
    }
}

/// The two spreadsheet operations the dashboard needs.
///
/// Implementations give no transactionality across calls: each
/// `update_value` lands (or fails) on its own.
#[async_trait]
pub trait SheetsApi: Send + Sync {
    /// Read `range` as row-major strings, without type coercion.
    async fn get_values(&self, sheet_id: &str, range: &str)
    -> Result<Vec<Vec<String>>, SheetsError>;

    /// Write one literal value into the single cell `range`.
    async fn update_value(&self, sheet_id: &str, range: &str, value: &str)
    -> Result<(), SheetsError>;
}
