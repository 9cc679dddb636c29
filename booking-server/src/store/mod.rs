//! 预订存储层
//!
//! 表格式存储抽象：按列名读写行，行号即身份 (无独立主键)。
//!
//! | 实现 | 用途 |
//! |------|------|
//! | [`MemoryStore`] | 开发模式 / 测试 |
//! | [`SheetsStore`] | Google Sheets (生产) |

mod memory;
mod sheets;

pub use memory::MemoryStore;
pub use sheets::SheetsStore;

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::google::GoogleAuthError;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Row not found: {0}")]
    RowNotFound(usize),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Authentication failed: {0}")]
    Auth(#[from] GoogleAuthError),

    #[error("Store API error ({status}): {message}")]
    Api { status: u16, message: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// One data row, addressed by column name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreRow(BTreeMap<String, String>);

impl StoreRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter
    pub fn with(mut self, column: &str, value: impl Into<String>) -> Self {
        self.set(column, value);
        self
    }

    pub fn set(&mut self, column: &str, value: impl Into<String>) {
        self.0.insert(column.to_string(), value.into());
    }

    /// Cell value, `None` when absent or blank
    pub fn get(&self, column: &str) -> Option<&str> {
        self.0
            .get(column)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Cells laid out in header order, missing cells as empty strings
    pub fn to_ordered(&self, headers: &[String]) -> Vec<String> {
        headers
            .iter()
            .map(|h| self.0.get(h).cloned().unwrap_or_default())
            .collect()
    }

    /// Inverse of [`StoreRow::to_ordered`]
    pub fn from_ordered(headers: &[String], cells: &[String]) -> Self {
        let mut row = Self::new();
        for (header, cell) in headers.iter().zip(cells) {
            if !header.is_empty() {
                row.set(header, cell.clone());
            }
        }
        row
    }
}

/// 表格式预订存储
///
/// 行号 `row_index` 从 0 开始，只计数据行 (不含表头)。
#[async_trait]
pub trait ReservationStore: Send + Sync + std::fmt::Debug {
    /// Header row
    async fn headers(&self) -> StoreResult<Vec<String>>;

    /// All data rows in store order
    async fn rows(&self) -> StoreResult<Vec<StoreRow>>;

    /// Append one row; columns absent from the header are dropped
    async fn append(&self, row: StoreRow) -> StoreResult<()>;

    /// Overwrite a single cell
    async fn update_cell(&self, row_index: usize, column: &str, value: &str) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_get_ignores_blank_cells() {
        let row = StoreRow::new().with("Name", "  ").with("PartySize", " 4 ");
        assert_eq!(row.get("Name"), None);
        assert_eq!(row.get("PartySize"), Some("4"));
        assert_eq!(row.get("Email"), None);
    }

    #[test]
    fn test_ordered_layout_follows_headers() {
        let headers = vec!["Name".to_string(), "Email".to_string(), "PartySize".to_string()];
        let row = StoreRow::new().with("PartySize", "2").with("Name", "Ada");
        assert_eq!(row.to_ordered(&headers), vec!["Ada", "", "2"]);

        let back = StoreRow::from_ordered(&headers, &["Ada".to_string()]);
        assert_eq!(back.get("Name"), Some("Ada"));
        assert_eq!(back.get("PartySize"), None);
    }
}
