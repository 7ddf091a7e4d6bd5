use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_UPLOAD_FOLDER: &str = "media_archive";
pub const ENV_PREFIX: &str = "MEDIAVAULT";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub log_level: String,
    pub data_dir: PathBuf,
    pub debug_console: bool,
    pub project_id: String,
    pub api_key: String,
    pub store_base_url: String,
    pub identity_base_url: String,
    pub token_base_url: String,
    pub upload_base_url: String,
    pub cloud_name: String,
    pub upload_preset: String,
    pub upload_folder: String,
}

#[derive(Default)]
pub struct AppConfigOverrides {
    pub log_level: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub debug_console: bool,
}

fn default_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".mediavault")
}

impl AppConfig {
    /// Read `path` (default `~/.mediavault/config`) and `MEDIAVAULT_*`
    /// variables. Missing keys fall back to their defaults.
    pub fn load_from(path: Option<PathBuf>) -> Self {
        let path = path.unwrap_or_else(|| default_dir().join("config"));
        let cfg = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Toml).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()
            .unwrap_or_default();

        let string_or = |key: &str, default: &str| {
            cfg.get_string(key).unwrap_or_else(|_| default.to_string())
        };

        Self {
            log_level: string_or("log_level", "info"),
            data_dir: cfg
                .get_string("data_dir")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_dir()),
            debug_console: cfg.get_bool("debug_console").unwrap_or(false),
            project_id: string_or("project_id", ""),
            api_key: string_or("api_key", ""),
            store_base_url: string_or("store_base_url", api_client::DEFAULT_STORE_BASE_URL),
            identity_base_url: string_or("identity_base_url", auth::DEFAULT_IDENTITY_BASE_URL),
            token_base_url: string_or("token_base_url", auth::DEFAULT_TOKEN_BASE_URL),
            upload_base_url: string_or("upload_base_url", api_client::DEFAULT_UPLOAD_BASE_URL),
            cloud_name: string_or("cloud_name", ""),
            upload_preset: string_or("upload_preset", ""),
            upload_folder: string_or("upload_folder", DEFAULT_UPLOAD_FOLDER),
        }
    }

    pub fn apply_overrides(mut self, ov: &AppConfigOverrides) -> Self {
        if let Some(l) = &ov.log_level {
            self.log_level = l.clone();
        }
        if let Some(d) = &ov.data_dir {
            self.data_dir = d.clone();
        }
        if ov.debug_console {
            self.debug_console = true;
        }
        self
    }

    /// Keys without a usable default that are still empty.
    pub fn missing_keys(&self) -> Vec<&'static str> {
        [
            ("project_id", &self.project_id),
            ("api_key", &self.api_key),
            ("cloud_name", &self.cloud_name),
            ("upload_preset", &self.upload_preset),
        ]
        .into_iter()
        .filter(|(_, v)| v.is_empty())
        .map(|(k, _)| k)
        .collect()
    }

    pub fn upload_folder(&self) -> Option<String> {
        if self.upload_folder.is_empty() {
            None
        } else {
            Some(self.upload_folder.clone())
        }
    }

    pub fn error_log_path(&self) -> PathBuf {
        self.data_dir.join("ui_errors.log")
    }

    pub fn save_to(&self, path: Option<PathBuf>) -> std::io::Result<()> {
        let path = path.unwrap_or_else(|| default_dir().join("config"));
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = toml::to_string(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::tempdir;

    #[test]
    #[serial]
    fn test_defaults_without_file() {
        let dir = tempdir().unwrap();
        let cfg = AppConfig::load_from(Some(dir.path().join("missing")));
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.upload_folder, DEFAULT_UPLOAD_FOLDER);
        assert_eq!(cfg.store_base_url, "https://firestore.googleapis.com");
        assert_eq!(
            cfg.missing_keys(),
            vec!["project_id", "api_key", "cloud_name", "upload_preset"]
        );
    }

    #[test]
    #[serial]
    fn test_save_and_reload_with_overrides() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config");
        let mut cfg = AppConfig::load_from(Some(path.clone()));
        cfg.project_id = "vault-prod".into();
        cfg.upload_folder = String::new();
        cfg.save_to(Some(path.clone())).unwrap();

        let loaded = AppConfig::load_from(Some(path)).apply_overrides(&AppConfigOverrides {
            log_level: Some("debug".into()),
            data_dir: Some(dir.path().to_path_buf()),
            debug_console: false,
        });
        assert_eq!(loaded.project_id, "vault-prod");
        assert_eq!(loaded.upload_folder(), None);
        assert_eq!(loaded.log_level, "debug");
        assert_eq!(loaded.error_log_path(), dir.path().join("ui_errors.log"));
    }

    #[test]
    #[serial]
    fn test_environment_overrides_file() {
        let dir = tempdir().unwrap();
        std::env::set_var("MEDIAVAULT_CLOUD_NAME", "env-cloud");
        let cfg = AppConfig::load_from(Some(dir.path().join("missing")));
        std::env::remove_var("MEDIAVAULT_CLOUD_NAME");
        assert_eq!(cfg.cloud_name, "env-cloud");
    }
}
