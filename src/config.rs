//! Service configuration
//!
//! Configuration is read from an optional YAML file; every section has
//! defaults so an empty file (or no file at all) yields a working setup.
//! Command-line flags are applied on top by the CLI runner.

use crate::error::{Error, Result, ResultExt};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete service configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerSettings,

    /// Record store settings
    #[serde(default)]
    pub store: StoreSettings,

    /// Page size defaults and bounds
    #[serde(default)]
    pub pagination: PaginationLimits,
}

impl ServiceConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        self.pagination.validate()?;
        if self.store.kind == StoreKind::Duckdb {
            validate_identifier(&self.store.table)?;
        }
        Ok(())
    }
}

// ============================================================================
// Server
// ============================================================================

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSettings {
    /// Interface to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Per-request deadline for store calls (0 disables it)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout_ms() -> u64 {
    5000
}

// ============================================================================
// Store
// ============================================================================

/// Which record store backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// In-process collection, optionally seeded with sample products
    #[default]
    Memory,
    /// DuckDB database file (or `:memory:`)
    Duckdb,
}

/// Record store settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreSettings {
    /// Store backend
    #[serde(default)]
    pub kind: StoreKind,

    /// DuckDB database path
    #[serde(default = "default_path")]
    pub path: String,

    /// Table holding the records
    #[serde(default = "default_table")]
    pub table: String,

    /// Number of sample products to seed a memory store with
    #[serde(default)]
    pub seed: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            kind: StoreKind::default(),
            path: default_path(),
            table: default_table(),
            seed: 0,
        }
    }
}

fn default_path() -> String {
    ":memory:".to_string()
}

fn default_table() -> String {
    "products".to_string()
}

/// Validate a SQL table identifier (optionally schema-qualified)
pub fn validate_identifier(name: &str) -> Result<()> {
    let valid_part = |part: &str| {
        let mut chars = part.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    };

    if !name.is_empty() && name.split('.').count() <= 2 && name.split('.').all(valid_part) {
        Ok(())
    } else {
        Err(Error::config(format!("'{name}' is not a valid table name")))
    }
}

// ============================================================================
// Pagination
// ============================================================================

/// Page size defaults and bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaginationLimits {
    /// Page size used when the client sends none
    #[serde(default = "default_limit")]
    pub default_limit: u64,

    /// Largest page size a client may request
    #[serde(default = "default_max_limit")]
    pub max_limit: u64,
}

impl Default for PaginationLimits {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
        }
    }
}

impl PaginationLimits {
    /// Create limits with explicit values
    pub fn new(default_limit: u64, max_limit: u64) -> Self {
        Self {
            default_limit,
            max_limit,
        }
    }

    /// Check that the defaults are usable
    pub fn validate(&self) -> Result<()> {
        if self.default_limit == 0 || self.max_limit == 0 {
            return Err(Error::config("pagination limits must be at least 1"));
        }
        if self.default_limit > self.max_limit {
            return Err(Error::config(format!(
                "default_limit ({}) exceeds max_limit ({})",
                self.default_limit, self.max_limit
            )));
        }
        Ok(())
    }
}

fn default_limit() -> u64 {
    10
}

fn default_max_limit() -> u64 {
    1000
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_empty_yaml_is_default() {
        let config = ServiceConfig::from_yaml("").unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.request_timeout_ms, 5000);
        assert_eq!(config.store.kind, StoreKind::Memory);
        assert_eq!(config.pagination.default_limit, 10);
        assert_eq!(config.pagination.max_limit, 1000);
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = r#"
server:
  port: 9000
store:
  kind: duckdb
  path: /var/lib/products.duckdb
  table: catalog.products
pagination:
  max_limit: 50
"#;
        let config = ServiceConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.store.kind, StoreKind::Duckdb);
        assert_eq!(config.store.table, "catalog.products");
        assert_eq!(config.pagination, PaginationLimits::new(10, 50));
    }

    #[test]
    fn test_rejects_unknown_fields() {
        assert!(ServiceConfig::from_yaml("server:\n  prot: 1\n").is_err());
    }

    #[test]
    fn test_rejects_inconsistent_limits() {
        let yaml = "pagination:\n  default_limit: 20\n  max_limit: 5\n";
        let err = ServiceConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("exceeds max_limit"));

        assert!(PaginationLimits::new(0, 10).validate().is_err());
    }

    #[test]
    fn test_rejects_bad_table_name() {
        let yaml = "store:\n  kind: duckdb\n  table: \"products; DROP TABLE x\"\n";
        assert!(ServiceConfig::from_yaml(yaml).is_err());

        assert!(validate_identifier("products").is_ok());
        assert!(validate_identifier("main.products").is_ok());
        assert!(validate_identifier("_p2").is_ok());
        assert!(validate_identifier("2p").is_err());
        assert!(validate_identifier("a.b.c").is_err());
        assert!(validate_identifier("").is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "server:\n  request_timeout_ms: 250").unwrap();

        let config = ServiceConfig::from_file(file.path()).unwrap();
        assert_eq!(config.server.request_timeout_ms, 250);
    }

    #[test]
    fn test_from_missing_file() {
        let err = ServiceConfig::from_file("/definitely/not/here.yaml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
