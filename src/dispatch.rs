//! The JSON API surface: maps named actions onto the registry, resolver and
//! relocation engine, and converts every outcome into a uniform JSON-able
//! shape. Errors never escape this boundary.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use log::error;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::directory;
use crate::error::LeaveError;
use crate::registry::CompanyRegistry;
use crate::relocate;
use crate::sheets::SheetsApi;

lazy_static! {
    /// Cells starting with an ISO date (`YYYY-MM-DD`) are reformatted for
    /// display.
    static ref ISO_DATE: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}").unwrap();
}

/// The closed set of actions the API supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    GetCompanyList,
    GetSheetData,
    ApproveRow,
    DeclineRow,
    DeleteRow,
    SaveComment,
}

impl Action {
    /// Parse the wire name of an action. Unknown names are reported to the
    /// client as an error body, not a transport failure.
    pub fn parse(name: &str) -> Option<Action> {
        match name {
            "getCompanyList" => Some(Action::GetCompanyList),
            "getSheetData" => Some(Action::GetSheetData),
            "approveRow" => Some(Action::ApproveRow),
            "declineRow" => Some(Action::DeclineRow),
            "deleteRow" => Some(Action::DeleteRow),
            "saveComment" => Some(Action::SaveComment),
            _ => None,
        }
    }
}

/// Query parameters of the single API endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionRequest {
    pub action: String,

    /// Company display name; the configured default applies when absent.
    pub company: Option<String>,

    /// Source/target status tab. Required for `deleteRow`; for
    /// `getSheetData`, absent means the first (main) tab.
    pub status: Option<String>,

    /// Zero-based offset into the values returned by the most recent read of
    /// the relevant tab, header row included.
    #[serde(rename = "rowIndex")]
    pub row_index: Option<usize>,

    pub comment: Option<String>,
}

/// Result shapes of the API. Serialized untagged: a bare array of names, a
/// 2D cell table, or a `{message}`/`{error}` object.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ActionResponse {
    Companies(Vec<String>),
    Table(Vec<Vec<String>>),
    Message { message: String },
    Error { error: String },
}

/// Handle one API request. Always returns a body; the HTTP status stays 200
/// and errors travel inside the JSON (a deliberate contract with the
/// embedded client).
pub fn dispatch(
    registry: &CompanyRegistry,
    api: &dyn SheetsApi,
    req: &ActionRequest,
) -> ActionResponse {
    let Some(action) = Action::parse(&req.action) else {
        return ActionResponse::Error {
            error: format!("Unknown action '{}'", req.action),
        };
    };
    match action {
        Action::GetCompanyList => ActionResponse::Companies(registry.names()),
        Action::GetSheetData => get_sheet_data(registry, api, req),
        Action::ApproveRow => run_mutation(
            registry,
            req,
            |id, idx| relocate::approve_row(api, id, idx),
            "Row approved and moved successfully",
        ),
        Action::DeclineRow => run_mutation(
            registry,
            req,
            |id, idx| relocate::decline_row(api, id, idx),
            "Row Declined successfully",
        ),
        Action::DeleteRow => {
            let Some(status) = req.status.clone() else {
                return ActionResponse::Error {
                    error: "status is required for deleteRow".to_string(),
                };
            };
            run_mutation(
                registry,
                req,
                |id, idx| relocate::delete_row(api, id, &status, idx, None),
                "Row moved to Deleted",
            )
        }
        Action::SaveComment => {
            let Some(comment) = req.comment.clone() else {
                return ActionResponse::Error {
                    error: "comment is required for saveComment".to_string(),
                };
            };
            run_mutation(
                registry,
                req,
                |id, idx| relocate::save_comment(api, id, idx, &comment),
                "Comment saved successfully!",
            )
        }
    }
}

fn requested_company<'a>(registry: &'a CompanyRegistry, req: &'a ActionRequest) -> &'a str {
    req.company.as_deref().unwrap_or_else(|| registry.default_name())
}

/// Shared shape of the mutating actions: resolve the company, require a row
/// index, run the operation, reduce the outcome to `{message}`/`{error}`.
fn run_mutation<F>(
    registry: &CompanyRegistry,
    req: &ActionRequest,
    op: F,
    success: &str,
) -> ActionResponse
where
    F: FnOnce(&str, usize) -> Result<(), LeaveError>,
{
    let company = requested_company(registry, req);
    let spreadsheet_id = match registry.resolve(company) {
        Ok(id) => id,
        Err(e) => return ActionResponse::Error { error: e.to_string() },
    };
    let Some(row_index) = req.row_index else {
        return ActionResponse::Error {
            error: "rowIndex is required".to_string(),
        };
    };
    match op(spreadsheet_id, row_index) {
        Ok(()) => ActionResponse::Message {
            message: success.to_string(),
        },
        Err(e) => {
            error!("{}: {e}", req.action);
            ActionResponse::Error { error: e.to_string() }
        }
    }
}

fn get_sheet_data(
    registry: &CompanyRegistry,
    api: &dyn SheetsApi,
    req: &ActionRequest,
) -> ActionResponse {
    let company = requested_company(registry, req);
    let spreadsheet_id = match registry.resolve(company) {
        Ok(id) => id,
        // Read actions render configuration problems as a two-cell error row.
        Err(e) if e.is_configuration() => {
            return ActionResponse::Table(error_row("Invalid company selected"))
        }
        Err(e) => return ActionResponse::Error { error: e.to_string() },
    };
    match read_tab(api, spreadsheet_id, req.status.as_deref()) {
        Ok(rows) if rows.is_empty() => ActionResponse::Table(error_row("No data available")),
        Ok(mut rows) => {
            format_dates(&mut rows);
            ActionResponse::Table(rows)
        }
        Err(e) => {
            error!("getSheetData: {e}");
            ActionResponse::Table(error_row(e.to_string()))
        }
    }
}

fn read_tab(
    api: &dyn SheetsApi,
    spreadsheet_id: &str,
    status: Option<&str>,
) -> Result<Vec<Vec<String>>, LeaveError> {
    match status {
        Some(tab) => api.read_range(spreadsheet_id, tab),
        None => {
            let main = directory::main_tab(api, spreadsheet_id)?;
            api.read_range(spreadsheet_id, &main.title)
        }
    }
}

/// The two-cell error shape read actions return instead of a data table.
fn error_row(message: impl Into<String>) -> Vec<Vec<String>> {
    vec![vec!["Error".to_string(), message.into()]]
}

/// Rewrite every ISO-dated cell (`YYYY-MM-DD...`) as `MM/DD/YYYY`; other
/// cells pass through untouched.
pub fn format_dates(rows: &mut [Vec<String>]) {
    for row in rows.iter_mut() {
        for cell in row.iter_mut() {
            if let Some(formatted) = reformat_iso_date(cell) {
                *cell = formatted;
            }
        }
    }
}

fn reformat_iso_date(cell: &str) -> Option<String> {
    if !ISO_DATE.is_match(cell) {
        return None;
    }
    let date = NaiveDate::parse_from_str(&cell[..10], "%Y-%m-%d").ok()?;
    Some(date.format("%m/%d/%Y").to_string())
}
