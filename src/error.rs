use thiserror::Error;

/// Error taxonomy for the leave-management core.
///
/// Every fallible operation in the crate funnels into this enum; the
/// dispatcher converts each variant into a user-visible string so that no
/// failure ever crashes the process.
#[derive(Debug, Error)]
pub enum LeaveError {
    /// The requested company name is not present in the registry.
    #[error("Invalid company selected: '{0}' is not a known company")]
    UnknownCompany(String),

    /// The company exists but has no spreadsheet id configured.
    #[error("Invalid company selected: no spreadsheet configured for '{0}'")]
    NotConfigured(String),

    /// A row index fell outside the rows returned by the most recent read.
    #[error("Row {0} is out of range")]
    RowNotFound(usize),

    /// A named tab was required but absent (e.g. deleting from a status tab
    /// that was never created).
    #[error("Sheet '{0}' not found")]
    SheetNotFound(String),

    /// A read against the remote spreadsheet API failed.
    #[error("Could not load sheet: {0}")]
    RemoteFetch(String),

    /// A write against the remote spreadsheet API failed.
    #[error("Could not update sheet: {0}")]
    RemoteWrite(String),
}

impl LeaveError {
    /// True for errors caused by the company configuration rather than the
    /// remote spreadsheet. Read actions render these as a two-cell error row.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            LeaveError::UnknownCompany(_) | LeaveError::NotConfigured(_)
        )
    }
}
