//! Data directory and configuration for askhive.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use askhive_client::{ClientConfig, FileTokenStore, ForumService, Transport};

/// Config file looked for in the data directory when `--config` is absent.
pub const CONFIG_FILE: &str = "config.toml";

/// Create the data directory if needed and restrict it to the owner.
pub async fn prepare_data_dir(data_dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(data_dir)
        .await
        .context("Failed to create data directory")?;
    set_dir_permissions_0700(data_dir).await
}

/// Load client configuration.
///
/// An explicit path must exist. Without one, `config.toml` in the data
/// directory is used if present, else the built-in defaults. Environment
/// overrides apply either way.
pub fn load_config(explicit: Option<&Path>, data_dir: &Path) -> Result<ClientConfig> {
    let path: Option<PathBuf> = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let candidate = data_dir.join(CONFIG_FILE);
            candidate.exists().then_some(candidate)
        }
    };
    ClientConfig::load(path.as_deref()).context("Invalid configuration")
}

/// Build the service, keeping the session token in the data directory.
pub fn open_service<T: Transport>(config: ClientConfig, data_dir: &Path) -> Result<ForumService<T>> {
    let tokens = Arc::new(FileTokenStore::in_dir(data_dir));
    ForumService::new(config, tokens).context("Failed to set up the forum client")
}

/// Set directory permissions to 0700 (owner only) on Unix.
/// No-op on non-Unix platforms.
pub async fn set_dir_permissions_0700(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
            .await
            .context("Failed to set directory permissions")?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use askhive_client::MockTransport;
    use tempfile::tempdir;

    #[tokio::test]
    async fn missing_config_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = load_config(None, dir.path()).unwrap();
        assert_eq!(config.server.ws_url, ClientConfig::default().server.ws_url);
    }

    #[tokio::test]
    async fn config_in_data_dir_is_picked_up() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[live]\nheartbeat_secs = 12\n",
        )
        .unwrap();

        let config = load_config(None, dir.path()).unwrap();
        assert_eq!(config.heartbeat_interval().as_secs(), 12);
    }

    #[tokio::test]
    async fn explicit_config_must_exist() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(load_config(Some(&missing), dir.path()).is_err());
    }

    #[tokio::test]
    async fn service_opens_without_io() {
        let dir = tempdir().unwrap();
        let service =
            open_service::<MockTransport>(ClientConfig::default(), dir.path()).unwrap();
        assert!(service.current_user().is_none());
        assert!(!dir.path().join("credentials.json").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn data_dir_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempdir().unwrap();
        let data_dir = dir.path().join("test-data");
        prepare_data_dir(&data_dir).await.unwrap();

        let perms = tokio::fs::metadata(&data_dir).await.unwrap().permissions();
        assert_eq!(perms.mode() & 0o777, 0o700, "dir should be 0700");
    }
}
