use std::env;
use std::error::Error;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::registry::{Company, CompanyRegistry};
use crate::sheets::DEFAULT_BASE_URL;

/// Environment variable that overrides the bearer token from `token_file`.
pub const TOKEN_ENV_VAR: &str = "LEAVEBOARD_TOKEN";

/// Process configuration, loaded once at startup from a JSON file.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Address the HTTP server binds to.
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Companies served by this instance, in display order.
    pub companies: Vec<Company>,

    /// Company used when a request does not name one.
    pub default_company: String,

    /// Base URL of the spreadsheet API. Overridable for testing against a
    /// local stand-in.
    #[serde(default = "default_base_url")]
    pub sheets_base_url: String,

    /// File holding the bearer token issued by the credential provider.
    #[serde(default)]
    pub token_file: Option<PathBuf>,
}

fn default_listen() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl AppConfig {
    /// Read and parse the configuration file at `path`.
    pub fn load(path: &str) -> Result<Self, Box<dyn Error>> {
        let raw = fs::read_to_string(path)
            .map_err(|e| format!("failed to read config file '{path}': {e}"))?;
        let config: AppConfig = serde_json::from_str(&raw)
            .map_err(|e| format!("failed to parse config file '{path}': {e}"))?;
        Ok(config)
    }

    /// Build the immutable company registry injected into the dispatcher.
    pub fn registry(&self) -> CompanyRegistry {
        CompanyRegistry::new(self.companies.clone(), self.default_company.clone())
    }

    /// Obtain the bearer token: the environment variable wins, then the
    /// configured token file. Token acquisition itself is out of scope; this
    /// only picks up what the credential provider left behind.
    pub fn token(&self) -> Result<String, Box<dyn Error>> {
        if let Ok(token) = env::var(TOKEN_ENV_VAR) {
            if !token.trim().is_empty() {
                return Ok(token.trim().to_string());
            }
        }
        if let Some(path) = &self.token_file {
            let token = fs::read_to_string(path)
                .map_err(|e| format!("failed to read token file '{}': {e}", path.display()))?;
            let token = token.trim();
            if !token.is_empty() {
                return Ok(token.to_string());
            }
        }
        Err(format!("no bearer token: set {TOKEN_ENV_VAR} or configure token_file").into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_parses_companies_and_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "companies": [
                    {{ "name": "Company A", "spreadsheet_id": "abc123" }},
                    {{ "name": "Company B" }}
                ],
                "default_company": "Company A"
            }}"#
        )
        .unwrap();

        let config = AppConfig::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.listen, "127.0.0.1:3000");
        assert_eq!(config.sheets_base_url, DEFAULT_BASE_URL);
        assert_eq!(config.registry().names(), vec!["Company A", "Company B"]);
        assert_eq!(config.registry().default_name(), "Company A");
    }

    #[test]
    fn load_rejects_malformed_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        assert!(AppConfig::load(file.path().to_str().unwrap()).is_err());
    }

    #[test]
    fn token_comes_from_token_file() {
        let mut token_file = tempfile::NamedTempFile::new().unwrap();
        writeln!(token_file, "ya29.secret").unwrap();

        let config = AppConfig {
            listen: default_listen(),
            companies: Vec::new(),
            default_company: String::new(),
            sheets_base_url: default_base_url(),
            token_file: Some(token_file.path().to_path_buf()),
        };
        assert_eq!(config.token().unwrap(), "ya29.secret");
    }
}
