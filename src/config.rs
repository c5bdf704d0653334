use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct FacadeConfig {
    /// Backing database file. `None` opens an in-memory database.
    pub db_file: Option<PathBuf>,
    /// Log format: "compact" or "json".
    pub log_format: String,
    /// Extensions installed and loaded before remote storage is used.
    pub remote_extensions: Vec<String>,
    /// Let DuckDB autoload known extensions on first use.
    pub autoload_extensions: bool,
    /// Permit loading extensions without a valid signature. Off unless set.
    pub allow_unsigned_extensions: bool,
    /// Worker threads for the engine. Defaults to DuckDB's own choice.
    pub threads: Option<u32>,
}

impl Default for FacadeConfig {
    fn default() -> Self {
        Self {
            db_file: None,
            log_format: "compact".to_string(),
            remote_extensions: vec!["httpfs".to_string(), "aws".to_string()],
            autoload_extensions: true,
            allow_unsigned_extensions: false,
            threads: None,
        }
    }
}

impl FacadeConfig {
    /// Load defaults overlaid with `DUCKLET_*` environment variables.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::build(None)
    }

    /// Load defaults, then the given file, then `DUCKLET_*` environment variables.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::build(Some(path))
    }

    fn build(path: Option<&Path>) -> anyhow::Result<Self> {
        let defaults_json = serde_json::to_string(&Self::default())
            .with_context(|| "failed to serialize defaults")?;
        let mut builder = config::Config::builder().add_source(
            config::File::from_str(&defaults_json, config::FileFormat::Json).required(false),
        );
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix("DUCKLET")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("remote_extensions"),
            )
            .build()
            .with_context(|| match path {
                Some(path) => format!("failed to load configuration from {}", path.display()),
                None => "failed to load configuration".to_string(),
            })?;
        let cfg: FacadeConfig = settings
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn with_db_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_file = Some(path.into());
        self
    }

    fn validate(&self) -> anyhow::Result<()> {
        if !matches!(self.log_format.as_str(), "compact" | "json") {
            anyhow::bail!(
                "unsupported log_format '{}': expected 'compact' or 'json'",
                self.log_format
            );
        }
        if let Some(ext) = self
            .remote_extensions
            .iter()
            .find(|ext| ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
        {
            anyhow::bail!("invalid extension name '{ext}' in remote_extensions");
        }
        if self.threads == Some(0) {
            anyhow::bail!("threads must be at least 1 when set");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use anyhow::Result;

    use super::*;

    fn write_config(contents: &str) -> Result<tempfile::NamedTempFile> {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
        file.write_all(contents.as_bytes())?;
        Ok(file)
    }

    #[test]
    fn defaults_target_in_memory_database_with_s3_extensions() {
        let cfg = FacadeConfig::default();
        assert_eq!(cfg.db_file, None);
        assert_eq!(cfg.remote_extensions, vec!["httpfs", "aws"]);
        assert!(!cfg.allow_unsigned_extensions);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn unsigned_extensions_are_opt_in_through_the_file() -> Result<()> {
        let file = write_config("allow_unsigned_extensions = true\n")?;
        let cfg = FacadeConfig::load_from(file.path())?;
        assert!(cfg.allow_unsigned_extensions);
        Ok(())
    }

    #[test]
    fn file_values_override_defaults() -> Result<()> {
        let file = write_config(
            "db_file = \"/tmp/analytics.duckdb\"\nlog_format = \"json\"\nthreads = 2\n",
        )?;
        let cfg = FacadeConfig::load_from(file.path())?;
        assert_eq!(cfg.db_file, Some(PathBuf::from("/tmp/analytics.duckdb")));
        assert_eq!(cfg.log_format, "json");
        assert_eq!(cfg.threads, Some(2));
        assert_eq!(cfg.remote_extensions, vec!["httpfs", "aws"]);
        Ok(())
    }

    #[test]
    fn unknown_log_format_is_rejected() -> Result<()> {
        let file = write_config("log_format = \"xml\"\n")?;
        let err = FacadeConfig::load_from(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("log_format"));
        Ok(())
    }

    #[test]
    fn extension_names_must_be_plain_identifiers() {
        let cfg = FacadeConfig {
            remote_extensions: vec!["httpfs; DROP TABLE t".to_string()],
            ..FacadeConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
