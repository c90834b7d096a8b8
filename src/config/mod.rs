use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

const APP_DOMAIN: &str = "io";
const APP_ORG: &str = "Daybook";
const APP_NAME: &str = "daybook";

pub const CONFIG_ENV: &str = "DAYBOOK_CONFIG";
pub const DATA_ENV: &str = "DAYBOOK_DATA";

/// Data root used when neither the environment nor the config file names one.
/// Relative to the working directory.
const DEFAULT_DATA_ROOT: &str = "data";

pub struct ConfigLoader {
    paths: ConfigPaths,
}

impl ConfigLoader {
    pub fn discover() -> Result<Self> {
        let paths = ConfigPaths::discover()?;
        Ok(Self { paths })
    }

    pub fn with_paths(paths: ConfigPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    pub fn load_or_init(&self) -> Result<AppConfig> {
        self.paths.ensure_directories()?;
        if !self.paths.config_file.exists() {
            let default_cfg = AppConfig::default();
            self.write_default_config(&default_cfg)?;
            let mut cfg = default_cfg;
            cfg.post_load(&self.paths);
            return Ok(cfg);
        }

        self.load()
    }

    pub fn load(&self) -> Result<AppConfig> {
        let raw = fs::read_to_string(&self.paths.config_file)
            .with_context(|| format!("reading config {}", self.paths.config_file.display()))?;
        let mut cfg: AppConfig = toml::from_str(&raw).context("parsing config toml")?;
        cfg.post_load(&self.paths);
        Ok(cfg)
    }

    fn write_default_config(&self, cfg: &AppConfig) -> Result<()> {
        let toml = toml::to_string_pretty(cfg).context("serializing default config")?;
        if let Some(parent) = self.paths.config_file.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut file = fs::File::create(&self.paths.config_file)
            .with_context(|| format!("creating config {}", self.paths.config_file.display()))?;
        file.write_all(toml.as_bytes())
            .context("writing default config")?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    /// Data root forced by `DAYBOOK_DATA` or `--data-dir`; wins over the
    /// config file.
    pub data_override: Option<PathBuf>,
    pub state_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl ConfigPaths {
    pub fn discover() -> Result<Self> {
        let override_config = env::var_os(CONFIG_ENV).map(PathBuf::from);
        let override_data = env::var_os(DATA_ENV).map(PathBuf::from);

        let project_dirs = ProjectDirs::from(APP_DOMAIN, APP_ORG, APP_NAME)
            .context("resolving XDG project directories")?;

        let config_dir = override_config
            .clone()
            .map(|p| {
                if p.is_dir() {
                    p
                } else {
                    p.parent().map(Path::to_path_buf).unwrap_or(p)
                }
            })
            .unwrap_or_else(|| project_dirs.config_dir().to_path_buf());

        let config_file = override_config
            .filter(|p| p.is_file() || p.extension().is_some())
            .unwrap_or_else(|| config_dir.join("config.toml"));

        let state_dir = project_dirs
            .state_dir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| project_dirs.data_local_dir().join("state"));
        let log_dir = state_dir.join("logs");

        Ok(Self {
            config_dir,
            config_file,
            data_override: override_data,
            state_dir,
            log_dir,
        })
    }

    /// Paths confined to `root`, for tests and throwaway profiles.
    pub fn rooted_at(root: &Path) -> Self {
        let config_dir = root.join("config");
        let state_dir = root.join("state");
        Self {
            config_file: config_dir.join("config.toml"),
            config_dir,
            data_override: Some(root.join("data")),
            log_dir: state_dir.join("logs"),
            state_dir,
        }
    }

    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.config_dir, &self.log_dir, &self.state_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating application directory {}", dir.display()))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageOptions,
    pub auto_save: AutoSaveConfig,
    pub editor: EditorOptions,
    pub tick_rate_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageOptions::default(),
            auto_save: AutoSaveConfig::default(),
            editor: EditorOptions::default(),
            tick_rate_ms: 200,
        }
    }
}

impl AppConfig {
    fn post_load(&mut self, paths: &ConfigPaths) {
        self.storage.resolve(paths);
        self.editor.sanitize();
        if self.tick_rate_ms == 0 {
            tracing::warn!("tick_rate_ms of 0 in config, using 200");
            self.tick_rate_ms = 200;
        }
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AutoSaveConfig {
    pub enabled: bool,
    pub debounce_ms: u64,
}

impl Default for AutoSaveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: 1000,
        }
    }
}

impl AutoSaveConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StorageOptions {
    pub data_dir: Option<PathBuf>,
    #[serde(skip)]
    pub data_root: PathBuf,
}

impl StorageOptions {
    fn resolve(&mut self, paths: &ConfigPaths) {
        self.data_root = paths
            .data_override
            .clone()
            .or_else(|| self.data_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_ROOT));
    }
}

/// Choices offered by the font pickers. Sizes are in points.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EditorOptions {
    pub default_font_size: u16,
    pub font_sizes: Vec<u16>,
    pub font_families: Vec<String>,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            default_font_size: 14,
            font_sizes: vec![8, 9, 10, 11, 12, 14, 16, 18, 20, 24, 28, 32, 36, 48],
            font_families: ["Sans Serif", "Serif", "Monospace", "Georgia", "Helvetica"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl EditorOptions {
    fn sanitize(&mut self) {
        self.font_sizes.retain(|size| *size > 0);
        self.font_sizes.sort_unstable();
        self.font_sizes.dedup();
        if self.font_sizes.is_empty() {
            tracing::warn!("empty font size list in config, restoring defaults");
            self.font_sizes = Self::default().font_sizes;
        }
        if self.default_font_size == 0 {
            self.default_font_size = 14;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn first_run_writes_defaults() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let loader = ConfigLoader::with_paths(ConfigPaths::rooted_at(temp.path()));
        let cfg = loader.load_or_init()?;
        assert!(loader.paths().config_file.exists());
        assert_eq!(cfg.auto_save, AutoSaveConfig::default());
        assert_eq!(cfg.auto_save.debounce(), Duration::from_millis(1000));
        assert_eq!(cfg.editor.default_font_size, 14);
        assert_eq!(cfg.storage.data_root, temp.path().join("data"));
        Ok(())
    }

    #[test]
    fn partial_file_keeps_defaults() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let mut paths = ConfigPaths::rooted_at(temp.path());
        paths.data_override = None;
        fs::create_dir_all(&paths.config_dir)?;
        fs::write(
            &paths.config_file,
            "[auto_save]\ndebounce_ms = 250\n\n[storage]\ndata_dir = \"/srv/daybook\"\n",
        )?;
        let cfg = ConfigLoader::with_paths(paths).load()?;
        assert!(cfg.auto_save.enabled);
        assert_eq!(cfg.auto_save.debounce_ms, 250);
        assert_eq!(cfg.storage.data_root, PathBuf::from("/srv/daybook"));
        assert_eq!(cfg.tick_rate_ms, 200);
        Ok(())
    }

    #[test]
    fn data_root_falls_back_to_relative_data() {
        let mut options = StorageOptions::default();
        let mut paths = ConfigPaths::rooted_at(Path::new("/tmp/unused"));
        paths.data_override = None;
        options.resolve(&paths);
        assert_eq!(options.data_root, PathBuf::from("data"));
    }

    #[test]
    fn empty_font_sizes_are_restored() {
        let mut editor = EditorOptions {
            font_sizes: vec![0],
            ..EditorOptions::default()
        };
        editor.sanitize();
        assert_eq!(editor.font_sizes, EditorOptions::default().font_sizes);
    }
}
