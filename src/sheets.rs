use std::thread;
use std::time::Duration;

use log::warn;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::LeaveError;

/// Default endpoint of the Google Sheets v4 REST API.
pub const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com";

/// Maximum number of attempts for a single remote call.
const MAX_ATTEMPTS: u32 = 3;

/// Base delay between retry attempts; grows linearly with the attempt number.
const RETRY_BACKOFF: Duration = Duration::from_millis(250);

/// A named tab (sheet) within one spreadsheet.
///
/// The title addresses the tab in value reads/appends; the integer id is
/// required for structural operations such as row deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    pub title: String,
    pub sheet_id: i64,
}

/// Port to the remote spreadsheet backend.
///
/// All operations are synchronous round trips; implementations must not
/// cache. The production implementation is [`GoogleSheetsClient`]; tests use
/// an in-memory fake.
pub trait SheetsApi: Send + Sync {
    /// Read all rows in `range` (a tab title, optionally with an A1 suffix).
    ///
    /// An existing range with no data is an empty `Vec`, not an error.
    fn read_range(&self, spreadsheet_id: &str, range: &str)
        -> Result<Vec<Vec<String>>, LeaveError>;

    /// Append `row` at the end of the named tab. No identifier is returned.
    fn append_row(
        &self,
        spreadsheet_id: &str,
        tab_title: &str,
        row: &[String],
    ) -> Result<(), LeaveError>;

    /// Delete rows `[start_index, end_index)` by structural 0-based position;
    /// subsequent rows shift up.
    fn delete_row_range(
        &self,
        spreadsheet_id: &str,
        sheet_id: i64,
        start_index: usize,
        end_index: usize,
    ) -> Result<(), LeaveError>;

    /// List the tabs of a spreadsheet in their display order.
    fn list_tabs(&self, spreadsheet_id: &str) -> Result<Vec<Tab>, LeaveError>;

    /// Create a tab with the given title.
    ///
    /// Returns the new structural id when the remote reply carries it; the
    /// caller re-lists otherwise. The remote rejects duplicate titles, so
    /// callers check existence first.
    fn create_tab(&self, spreadsheet_id: &str, title: &str) -> Result<Option<i64>, LeaveError>;
}

/// Client for the Google Sheets v4 REST API.
///
/// Assumes an already-authorized bearer token; acquisition and refresh are
/// handled outside this crate. Transient failures (connect/timeout, HTTP 429
/// and 5xx) are retried a bounded number of times with linear backoff; every
/// other failure is surfaced immediately.
pub struct GoogleSheetsClient {
    http: reqwest::blocking::Client,
    base_url: String,
    token: String,
}

impl GoogleSheetsClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self, LeaveError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| LeaveError::RemoteFetch(format!("failed to build HTTP client: {e}")))?;
        Ok(GoogleSheetsClient {
            http,
            base_url: base_url.into(),
            token: token.into(),
        })
    }

    fn values_url(&self, spreadsheet_id: &str, range: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}",
            self.base_url,
            spreadsheet_id,
            urlencoding::encode(range)
        )
    }

    fn batch_update(&self, spreadsheet_id: &str, request: Value) -> Result<Value, String> {
        let url = format!("{}/v4/spreadsheets/{}:batchUpdate", self.base_url, spreadsheet_id);
        let body = json!({ "requests": [request] });
        let resp = self.send_with_retry("batchUpdate", || {
            self.http.post(&url).bearer_auth(&self.token).json(&body)
        })?;
        resp.json::<Value>()
            .map_err(|e| format!("batchUpdate reply was not JSON: {e}"))
    }

    /// Issue a request built by `build`, retrying transient failures.
    fn send_with_retry<F>(
        &self,
        op: &str,
        build: F,
    ) -> Result<reqwest::blocking::Response, String>
    where
        F: Fn() -> reqwest::blocking::RequestBuilder,
    {
        let mut attempt = 1;
        loop {
            match build().send() {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        return Ok(resp);
                    }
                    let transient = status.as_u16() == 429 || status.is_server_error();
                    if !transient || attempt >= MAX_ATTEMPTS {
                        let body = resp.text().unwrap_or_default();
                        let detail = remote_message(&body)
                            .unwrap_or_else(|| format!("HTTP {status}"));
                        return Err(format!("{op}: {detail}"));
                    }
                    warn!("{op}: remote returned {status}, retrying (attempt {attempt})");
                }
                Err(err) => {
                    let transient = err.is_timeout() || err.is_connect();
                    if !transient || attempt >= MAX_ATTEMPTS {
                        return Err(format!("{op}: {err}"));
                    }
                    warn!("{op}: {err}, retrying (attempt {attempt})");
                }
            }
            thread::sleep(RETRY_BACKOFF * attempt);
            attempt += 1;
        }
    }
}

/// Pull the human-readable message out of a Google API error body, if any.
fn remote_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .map(String::from)
}

fn cell_to_string(value: &Value) -> String {
    match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct ValueRangeReply {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetReply {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    #[serde(default)]
    title: String,
    #[serde(default)]
    sheet_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddSheetProperties {
    sheet_id: Option<i64>,
}

impl SheetsApi for GoogleSheetsClient {
    fn read_range(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, LeaveError> {
        let url = self.values_url(spreadsheet_id, range);
        let resp = self
            .send_with_retry("values.get", || self.http.get(&url).bearer_auth(&self.token))
            .map_err(LeaveError::RemoteFetch)?;
        let reply: ValueRangeReply = resp
            .json()
            .map_err(|e| LeaveError::RemoteFetch(format!("values.get reply was not JSON: {e}")))?;
        Ok(reply
            .values
            .iter()
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect())
    }

    fn append_row(
        &self,
        spreadsheet_id: &str,
        tab_title: &str,
        row: &[String],
    ) -> Result<(), LeaveError> {
        let url = format!(
            "{}:append?valueInputOption=RAW",
            self.values_url(spreadsheet_id, tab_title)
        );
        let body = json!({ "values": [row] });
        self.send_with_retry("values.append", || {
            self.http.post(&url).bearer_auth(&self.token).json(&body)
        })
        .map_err(LeaveError::RemoteWrite)?;
        Ok(())
    }

    fn delete_row_range(
        &self,
        spreadsheet_id: &str,
        sheet_id: i64,
        start_index: usize,
        end_index: usize,
    ) -> Result<(), LeaveError> {
        let request = json!({
            "deleteDimension": {
                "range": {
                    "sheetId": sheet_id,
                    "dimension": "ROWS",
                    "startIndex": start_index,
                    "endIndex": end_index,
                }
            }
        });
        self.batch_update(spreadsheet_id, request)
            .map_err(LeaveError::RemoteWrite)?;
        Ok(())
    }

    fn list_tabs(&self, spreadsheet_id: &str) -> Result<Vec<Tab>, LeaveError> {
        let url = format!(
            "{}/v4/spreadsheets/{}?fields=sheets.properties",
            self.base_url, spreadsheet_id
        );
        let resp = self
            .send_with_retry("spreadsheets.get", || {
                self.http.get(&url).bearer_auth(&self.token)
            })
            .map_err(LeaveError::RemoteFetch)?;
        let reply: SpreadsheetReply = resp.json().map_err(|e| {
            LeaveError::RemoteFetch(format!("spreadsheets.get reply was not JSON: {e}"))
        })?;
        Ok(reply
            .sheets
            .into_iter()
            .map(|entry| Tab {
                title: entry.properties.title,
                sheet_id: entry.properties.sheet_id,
            })
            .collect())
    }

    fn create_tab(&self, spreadsheet_id: &str, title: &str) -> Result<Option<i64>, LeaveError> {
        let request = json!({
            "addSheet": {
                "properties": { "title": title }
            }
        });
        let reply = self
            .batch_update(spreadsheet_id, request)
            .map_err(LeaveError::RemoteWrite)?;
        let sheet_id = reply
            .get("replies")
            .and_then(Value::as_array)
            .and_then(|replies| replies.first())
            .and_then(|r| r.get("addSheet"))
            .and_then(|a| a.get("properties"))
            .and_then(|props| {
                serde_json::from_value::<AddSheetProperties>(props.clone()).ok()
            })
            .and_then(|props| props.sheet_id);
        Ok(sheet_id)
    }
}
