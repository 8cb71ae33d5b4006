//! Site configuration loaded from environment variables.

use std::path::PathBuf;

const DEFAULT_WWWROOT: &str = "http://localhost:3000";
const DEFAULT_PORT: u16 = 3000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SiteConfig {
    /// Public root URL links are built from (from OGTE_WWWROOT)
    pub wwwroot: String,
    /// Database file (from OGTE_DB_PATH); the platform data directory when unset
    pub db_path: Option<PathBuf>,
    /// HTTP port (from OGTE_PORT)
    pub port: u16,
}

impl SiteConfig {
    pub fn from_env() -> Self {
        let wwwroot = std::env::var("OGTE_WWWROOT").ok();
        let db_path = std::env::var("OGTE_DB_PATH").ok();
        let port = std::env::var("OGTE_PORT").ok();
        Self::from_values(wwwroot, db_path, port)
    }

    fn from_values(wwwroot: Option<String>, db_path: Option<String>, port: Option<String>) -> Self {
        let wwwroot = wwwroot
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_WWWROOT.to_string());

        let port = match port.as_deref().map(str::parse::<u16>) {
            Some(Ok(port)) => port,
            Some(Err(e)) => {
                tracing::warn!("Ignoring invalid OGTE_PORT: {}", e);
                DEFAULT_PORT
            }
            None => DEFAULT_PORT,
        };

        Self {
            wwwroot,
            db_path: db_path.filter(|s| !s.is_empty()).map(PathBuf::from),
            port,
        }
    }

    /// Configuration for tests and local development.
    pub fn local() -> Self {
        Self {
            wwwroot: DEFAULT_WWWROOT.to_string(),
            db_path: None,
            port: DEFAULT_PORT,
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
