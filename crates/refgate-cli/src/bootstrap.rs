use std::path::{Path, PathBuf};

use anyhow::Context;
use refgate_config::RefgateConfig;

use crate::cli::GlobalFlags;

/// Load `.env` from the project directory, then the layered config.
pub fn load_config(flags: &GlobalFlags) -> anyhow::Result<RefgateConfig> {
    let project_dir = flags
        .config_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));
    load_project_dotenv(&project_dir)?;

    RefgateConfig::load_from(&project_dir)
        .with_context(|| format!("failed to load config from {}", project_dir.display()))
}

fn load_project_dotenv(project_dir: &Path) -> anyhow::Result<()> {
    let env_path = project_dir.join(".env");
    match dotenvy::from_path(&env_path) {
        Ok(()) => {
            tracing::debug!(path = %env_path.display(), "loaded .env");
            Ok(())
        }
        Err(error) if error.not_found() => Ok(()),
        Err(error) => {
            Err(error).with_context(|| format!("failed to read {}", env_path.display()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;

    fn flags(dir: &Path) -> GlobalFlags {
        GlobalFlags {
            format: OutputFormat::Json,
            quiet: false,
            verbose: false,
            config_dir: Some(dir.to_path_buf()),
        }
    }

    #[test]
    fn project_config_is_read_from_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".refgate")).unwrap();
        std::fs::write(
            dir.path().join(".refgate/config.toml"),
            "[cache]\nttl_secs = 42\n",
        )
        .unwrap();

        let config = load_config(&flags(dir.path())).unwrap();
        assert_eq!(config.cache.ttl_secs, 42);
    }

    #[test]
    fn missing_dotenv_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_project_dotenv(dir.path()).is_ok());
    }
}
