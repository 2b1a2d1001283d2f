/// Instance configuration from local.properties
///
/// The launcher historically read these settings from process-wide
/// environment variables. Here they are parsed once into an explicit
/// struct and validated before any command runs.

use anyhow::{anyhow, bail, Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// MySQL credentials used for dump, readiness probing and replay
#[derive(Debug, Clone)]
pub struct DatabaseCredentials {
    pub name: String,
    pub user: String,
    pub password: String,
}

/// One named deployment of the three-service stack
#[derive(Debug, Clone)]
pub struct InstanceConfig {
    /// Compose project name and volume prefix
    pub instance: String,
    /// Destination directory for backup archives
    pub backup_dir: PathBuf,
    pub database: DatabaseCredentials,
}

impl InstanceConfig {
    /// Load and validate configuration from a properties file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(anyhow!(
                "Configuration file not found at {}",
                path.display()
            ));
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let values = Self::parse(&content);
        let get = |key: &str| -> Result<String> {
            values
                .get(key)
                .filter(|v| !v.is_empty())
                .cloned()
                .ok_or_else(|| anyhow!("{} is not set in {}", key, path.display()))
        };

        let config = Self {
            instance: get("INSTANCE_NAME")?,
            backup_dir: PathBuf::from(get("BACKUP_DIR")?),
            database: DatabaseCredentials {
                name: get("DATABASE_NAME")?,
                user: get("DATABASE_USER")?,
                password: get("DATABASE_PASSWORD")?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse `key=value` lines, skipping comments and blanks
    fn parse(content: &str) -> HashMap<String, String> {
        let mut values = HashMap::new();

        for line in content.lines() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                values.insert(key.trim().to_string(), value.trim().to_string());
            }
        }

        values
    }

    /// Shape checks. Existence of the backup directory is checked by the
    /// commands that use it, so that status/logs work without one.
    fn validate(&self) -> Result<()> {
        let name_ok = self
            .instance
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !name_ok {
            bail!(
                "INSTANCE_NAME '{}' is not a valid compose project name",
                self.instance
            );
        }

        if self.backup_dir.as_os_str().is_empty() {
            bail!("BACKUP_DIR must not be empty");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    #[test]
    fn test_load_full_config() {
        let file = write_config(&[
            "# Kontalk instance settings",
            "INSTANCE_NAME=foo",
            "BACKUP_DIR=/backups",
            "",
            "DATABASE_NAME=kontalk",
            "DATABASE_USER=kontalk",
            "DATABASE_PASSWORD=secret",
        ]);

        let config = InstanceConfig::load(file.path()).unwrap();
        assert_eq!(config.instance, "foo");
        assert_eq!(config.backup_dir, PathBuf::from("/backups"));
        assert_eq!(config.database.name, "kontalk");
        assert_eq!(config.database.user, "kontalk");
    }

    #[test]
    fn test_missing_key_is_an_error() {
        let file = write_config(&["INSTANCE_NAME=foo", "BACKUP_DIR=/backups"]);

        let err = InstanceConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("DATABASE_NAME"));
    }

    #[test]
    fn test_invalid_instance_name() {
        let file = write_config(&[
            "INSTANCE_NAME=foo bar",
            "BACKUP_DIR=/backups",
            "DATABASE_NAME=kontalk",
            "DATABASE_USER=kontalk",
            "DATABASE_PASSWORD=secret",
        ]);

        assert!(InstanceConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(InstanceConfig::load("/nonexistent/local.properties").is_err());
    }
}
