use anyhow::{Context, Result};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub rules: RecognitionRules,
    #[serde(default = "default_true")]
    pub confirm_overwrite: bool,
}

impl AppConfig {
    pub fn load_or_create() -> Result<Self> {
        let base_dir = base_data_dir()?;
        fs::create_dir_all(&base_dir).context("create app data dir")?;
        let path = base_dir.join("config.json");
        if path.exists() {
            let raw = fs::read_to_string(&path).context("read app config")?;
            let config: AppConfig = serde_json::from_str(&raw).context("parse app config")?;
            return Ok(config);
        }

        let config = AppConfig {
            rules: RecognitionRules::default(),
            confirm_overwrite: true,
        };
        config.save()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let base_dir = base_data_dir()?;
        fs::create_dir_all(&base_dir).context("create app data dir")?;
        let path = base_dir.join("config.json");
        let raw = serde_json::to_string_pretty(self).context("serialize app config")?;
        fs::write(path, raw).context("write app config")?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionRules {
    #[serde(default = "default_archive_extensions")]
    pub archive_extensions: Vec<String>,
    #[serde(default = "default_project_markers")]
    pub project_markers: Vec<String>,
}

impl Default for RecognitionRules {
    fn default() -> Self {
        Self {
            archive_extensions: default_archive_extensions(),
            project_markers: default_project_markers(),
        }
    }
}

impl RecognitionRules {
    pub fn is_archive_path(&self, path: &Path) -> bool {
        let ext = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");
        self.archive_extensions
            .iter()
            .any(|known| known.eq_ignore_ascii_case(ext))
    }

    pub fn is_marker_name(&self, name: &str) -> bool {
        self.project_markers
            .iter()
            .any(|marker| marker.eq_ignore_ascii_case(name))
    }

    pub fn is_marker_file(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .map(|name| self.is_marker_name(name))
            .unwrap_or(false)
    }
}

fn default_archive_extensions() -> Vec<String> {
    vec!["zip".to_string(), "fxp".to_string(), "7z".to_string()]
}

fn default_project_markers() -> Vec<String> {
    vec![".project".to_string()]
}

fn default_true() -> bool {
    true
}

fn base_data_dir() -> Result<PathBuf> {
    let base = BaseDirs::new().context("resolve home dir")?;
    Ok(base.data_local_dir().join("stevedore"))
}
