//! Resolution of tabs within a spreadsheet: find a tab by title, or create
//! it on first use.

use crate::error::LeaveError;
use crate::sheets::{SheetsApi, Tab};

/// Find a tab by exact, case-sensitive title.
pub fn find_tab(
    api: &dyn SheetsApi,
    spreadsheet_id: &str,
    title: &str,
) -> Result<Option<Tab>, LeaveError> {
    let tabs = api.list_tabs(spreadsheet_id)?;
    Ok(tabs.into_iter().find(|tab| tab.title == title))
}

/// Find a tab by title, creating it if absent.
///
/// When the creation reply does not carry the new structural id, the tab list
/// is fetched again to resolve it. Not idempotent under concurrent callers:
/// the remote rejects duplicate titles, so the first writer wins.
pub fn ensure_tab(
    api: &dyn SheetsApi,
    spreadsheet_id: &str,
    title: &str,
) -> Result<Tab, LeaveError> {
    if let Some(tab) = find_tab(api, spreadsheet_id, title)? {
        return Ok(tab);
    }
    match api.create_tab(spreadsheet_id, title)? {
        Some(sheet_id) => Ok(Tab {
            title: title.to_string(),
            sheet_id,
        }),
        None => find_tab(api, spreadsheet_id, title)?
            .ok_or_else(|| LeaveError::SheetNotFound(title.to_string())),
    }
}

/// The first tab of the spreadsheet, which holds the pending requests.
pub fn main_tab(api: &dyn SheetsApi, spreadsheet_id: &str) -> Result<Tab, LeaveError> {
    let tabs = api.list_tabs(spreadsheet_id)?;
    tabs.into_iter()
        .next()
        .ok_or_else(|| LeaveError::RemoteFetch("spreadsheet has no sheets".to_string()))
}
