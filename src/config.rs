use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub server: ServerConfig,
  /// Custom title for the header (defaults to the server host if not set)
  pub title: Option<String>,
  #[serde(default)]
  pub polling: PollingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  /// Base URL of the Pathfinder API, e.g. `http://localhost:8000/api`
  pub base_url: String,
  /// Email to pre-fill on the login form
  pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
  /// Notification refetch interval while a notification view is open
  #[serde(default = "default_notifications_secs")]
  pub notifications_secs: u64,
  /// How long an unwatched cached resource survives before eviction
  #[serde(default = "default_cache_gc_secs")]
  pub cache_gc_secs: u64,
}

fn default_notifications_secs() -> u64 {
  30
}

fn default_cache_gc_secs() -> u64 {
  300
}

impl Default for PollingConfig {
  fn default() -> Self {
    Self {
      notifications_secs: default_notifications_secs(),
      cache_gc_secs: default_cache_gc_secs(),
    }
  }
}

impl PollingConfig {
  pub fn notifications_interval(&self) -> Duration {
    Duration::from_secs(self.notifications_secs)
  }

  pub fn cache_gc_after(&self) -> Duration {
    Duration::from_secs(self.cache_gc_secs)
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./pathfinder.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/pathfinder/config.yaml
  /// 4. ~/.config/pathfinder/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/pathfinder/config.yaml\n\
                 See config.example.yaml for the format."
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("pathfinder.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("pathfinder").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Title for the header bar.
  pub fn display_title(&self) -> String {
    if let Some(title) = &self.title {
      return title.clone();
    }
    url::Url::parse(&self.server.base_url)
      .ok()
      .and_then(|u| u.host_str().map(|h| h.to_string()))
      .unwrap_or_else(|| "pathfinder".to_string())
  }

  /// Where the log file goes: $XDG_STATE_HOME/pathfinder (or the data dir),
  /// falling back to the current directory.
  pub fn log_dir() -> PathBuf {
    dirs::state_dir()
      .or_else(dirs::data_local_dir)
      .map(|d| d.join("pathfinder"))
      .unwrap_or_else(|| PathBuf::from("."))
  }

  /// Get the account password from the environment.
  ///
  /// The config file carries the email only; the password never touches disk.
  pub fn get_password() -> Result<String> {
    std::env::var("PATHFINDER_PASSWORD")
      .map_err(|_| eyre!("Password not found. Set the PATHFINDER_PASSWORD environment variable."))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_minimal_config_gets_polling_defaults() {
    let config: Config = serde_yaml::from_str(
      "server:\n  base_url: http://localhost:8000/api\n  email: student@test.dev\n",
    )
    .unwrap();

    assert_eq!(config.polling.notifications_secs, 30);
    assert_eq!(config.polling.cache_gc_secs, 300);
    assert_eq!(config.server.email.as_deref(), Some("student@test.dev"));
  }

  #[test]
  fn test_display_title_falls_back_to_host() {
    let config: Config = serde_yaml::from_str(
      "server:\n  base_url: https://careers.example.edu/api\ntitle: null\n",
    )
    .unwrap();
    assert_eq!(config.display_title(), "careers.example.edu");

    let config: Config = serde_yaml::from_str(
      "server:\n  base_url: https://careers.example.edu/api\ntitle: Campus Careers\n",
    )
    .unwrap();
    assert_eq!(config.display_title(), "Campus Careers");
  }

  #[test]
  fn test_polling_overrides() {
    let config: Config = serde_yaml::from_str(
      "server:\n  base_url: http://localhost:8000/api\npolling:\n  notifications_secs: 5\n",
    )
    .unwrap();
    assert_eq!(config.polling.notifications_interval(), Duration::from_secs(5));
    assert_eq!(config.polling.cache_gc_secs, 300);
  }
}
