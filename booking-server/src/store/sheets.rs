//! Google Sheets adapter (Sheets REST API v4)
//!
//! 第 1 行为表头，数据行 `row_index` 对应表格第 `row_index + 2` 行。

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use serde_json::json;

use super::{ReservationStore, StoreError, StoreResult, StoreRow};
use crate::google::ServiceAccountAuth;

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets/";

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Debug)]
pub struct SheetsStore {
    http: reqwest::Client,
    auth: Arc<ServiceAccountAuth>,
    sheet_id: String,
    sheet_name: String,
}

impl SheetsStore {
    pub fn new(
        http: reqwest::Client,
        auth: Arc<ServiceAccountAuth>,
        sheet_id: impl Into<String>,
        sheet_name: impl Into<String>,
    ) -> Self {
        Self {
            http,
            auth,
            sheet_id: sheet_id.into(),
            sheet_name: sheet_name.into(),
        }
    }

    fn values_url(&self, range: &str) -> StoreResult<Url> {
        let mut url = Url::parse(SHEETS_API)
            .and_then(|u| u.join(&format!("{}/", self.sheet_id)))
            .map_err(|e| StoreError::Unavailable(format!("bad sheet url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| StoreError::Unavailable("sheet url cannot be a base".into()))?
            .pop_if_empty()
            .push("values")
            .push(range);
        Ok(url)
    }

    fn quoted_sheet(&self) -> String {
        format!("'{}'", self.sheet_name.replace('\'', "''"))
    }

    async fn read_all(&self) -> StoreResult<Vec<Vec<String>>> {
        let url = self.values_url(&self.quoted_sheet())?;
        let token = self.auth.access_token().await?;
        let resp = self.http.get(url).bearer_auth(token).send().await?;
        let range: ValueRange = check(resp).await?.json().await?;
        Ok(range.values)
    }
}

async fn check(resp: reqwest::Response) -> StoreResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp.text().await.unwrap_or_default();
    Err(StoreError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Zero-based column index to A1 letters (0 → A, 25 → Z, 26 → AA)
pub(crate) fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

#[async_trait]
impl ReservationStore for SheetsStore {
    async fn headers(&self) -> StoreResult<Vec<String>> {
        let values = self.read_all().await?;
        Ok(values
            .into_iter()
            .next()
            .map(|row| row.into_iter().map(|h| h.trim().to_string()).collect())
            .unwrap_or_default())
    }

    async fn rows(&self) -> StoreResult<Vec<StoreRow>> {
        let mut values = self.read_all().await?.into_iter();
        let headers: Vec<String> = match values.next() {
            Some(row) => row.into_iter().map(|h| h.trim().to_string()).collect(),
            None => return Ok(Vec::new()),
        };
        Ok(values
            .map(|cells| StoreRow::from_ordered(&headers, &cells))
            .collect())
    }

    async fn append(&self, row: StoreRow) -> StoreResult<()> {
        let headers = self.headers().await?;
        let mut url = self.values_url(&format!("{}!A1:append", self.quoted_sheet()))?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");

        let token = self.auth.access_token().await?;
        let resp = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&json!({ "values": [row.to_ordered(&headers)] }))
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }

    async fn update_cell(&self, row_index: usize, column: &str, value: &str) -> StoreResult<()> {
        let headers = self.headers().await?;
        let col = headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| StoreError::UnknownColumn(column.to_string()))?;
        let cell = format!(
            "{}!{}{}",
            self.quoted_sheet(),
            column_letter(col),
            row_index + 2
        );
        let mut url = self.values_url(&cell)?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW");

        let token = self.auth.access_token().await?;
        let resp = self
            .http
            .put(url)
            .bearer_auth(token)
            .json(&json!({ "range": cell, "values": [[value]] }))
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }
}
