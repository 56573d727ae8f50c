use serde::Deserialize;

use crate::error::LeaveError;

/// One company entry: a display name bound to the spreadsheet holding its
/// leave requests. An empty spreadsheet id means "not configured yet".
#[derive(Debug, Clone, Deserialize)]
pub struct Company {
    pub name: String,
    #[serde(default)]
    pub spreadsheet_id: String,
}

/// Static mapping from company display names to spreadsheet ids.
///
/// Built once from the configuration file and injected into the dispatcher;
/// immutable for the process lifetime.
#[derive(Debug, Clone)]
pub struct CompanyRegistry {
    companies: Vec<Company>,
    default_company: String,
}

impl CompanyRegistry {
    pub fn new(companies: Vec<Company>, default_company: String) -> Self {
        CompanyRegistry {
            companies,
            default_company,
        }
    }

    /// Company display names, in configuration order.
    pub fn names(&self) -> Vec<String> {
        self.companies.iter().map(|c| c.name.clone()).collect()
    }

    /// The company used when a request names none.
    pub fn default_name(&self) -> &str {
        &self.default_company
    }

    /// Resolve a display name to its spreadsheet id.
    ///
    /// Unknown names and names with an empty spreadsheet id are structured
    /// errors, not faults; the dispatcher renders them for the client.
    pub fn resolve(&self, name: &str) -> Result<&str, LeaveError> {
        let company = self
            .companies
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| LeaveError::UnknownCompany(name.to_string()))?;
        if company.spreadsheet_id.is_empty() {
            return Err(LeaveError::NotConfigured(name.to_string()));
        }
        Ok(&company.spreadsheet_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> CompanyRegistry {
        CompanyRegistry::new(
            vec![
                Company {
                    name: "Company A".to_string(),
                    spreadsheet_id: "sheet-a".to_string(),
                },
                Company {
                    name: "Company B".to_string(),
                    spreadsheet_id: String::new(),
                },
            ],
            "Company A".to_string(),
        )
    }

    #[test]
    fn names_keep_configuration_order() {
        assert_eq!(registry().names(), vec!["Company A", "Company B"]);
    }

    #[test]
    fn resolve_returns_spreadsheet_id() {
        assert_eq!(registry().resolve("Company A").unwrap(), "sheet-a");
    }

    #[test]
    fn unknown_company_is_an_error() {
        let err = registry().resolve("Company C").unwrap_err();
        assert!(matches!(err, LeaveError::UnknownCompany(_)));
    }

    #[test]
    fn empty_spreadsheet_id_is_not_configured() {
        let err = registry().resolve("Company B").unwrap_err();
        assert!(matches!(err, LeaveError::NotConfigured(_)));
    }
}
