use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::compose::ComposePlacement;
use crate::config::themes::ThemeRegistry;

pub mod themes;

pub use themes::ThemeName;

const APP_DOMAIN: &str = "io";
const APP_ORG: &str = "LettersTui";
const APP_NAME: &str = "lettertui";

pub const CONFIG_ENV: &str = "LETTERTUI_CONFIG";
pub const DATA_ENV: &str = "LETTERTUI_DATA";

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
            let mut default_cfg = AppConfig::default();
            default_cfg.post_load(&self.paths);
            self.write_default_config(&default_cfg)?;
            return Ok(default_cfg);
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
    pub data_dir: PathBuf,
    pub store_path: PathBuf,
    pub log_dir: PathBuf,
    pub state_dir: PathBuf,
}

impl ConfigPaths {
    pub fn discover() -> Result<Self> {
        let override_config = env::var(CONFIG_ENV).ok().map(PathBuf::from);
        let override_data = env::var(DATA_ENV).ok().map(PathBuf::from);

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

        let data_root = override_data.unwrap_or_else(|| project_dirs.data_dir().to_path_buf());
        let state_dir = project_dirs
            .state_dir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| data_root.join("state"));

        Ok(Self::from_roots(config_dir, config_file, data_root, state_dir))
    }

    pub fn from_roots(
        config_dir: PathBuf,
        config_file: PathBuf,
        data_dir: PathBuf,
        state_dir: PathBuf,
    ) -> Self {
        let store_path = data_dir.join("letters.json");
        let log_dir = state_dir.join("logs");
        Self {
            config_dir,
            config_file,
            data_dir,
            store_path,
            log_dir,
            state_dir,
        }
    }

    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [
            &self.config_dir,
            &self.data_dir,
            &self.log_dir,
            &self.state_dir,
        ] {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating application directory {}", dir.display()))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(deserialize_with = "lenient_theme")]
    pub theme: ThemeName,
    pub history: HistoryConfig,
    pub quotes: QuoteConfig,
    pub compose: ComposeConfig,
    pub viewport: ViewportConfig,
    pub notifications: NotificationConfig,
    pub store: StoreOptions,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            theme: ThemeName::Dark,
            history: HistoryConfig::default(),
            quotes: QuoteConfig::default(),
            compose: ComposeConfig::default(),
            viewport: ViewportConfig::default(),
            notifications: NotificationConfig::default(),
            store: StoreOptions::default(),
        }
    }
}

impl AppConfig {
    fn post_load(&mut self, paths: &ConfigPaths) {
        self.store.resolve(paths);
    }
}

fn lenient_theme<'de, D>(deserializer: D) -> std::result::Result<ThemeName, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let theme = toml::Value::String(raw.clone())
        .try_into::<ThemeName>()
        .ok()
        .filter(|theme| ThemeRegistry::default().contains(theme));
    Ok(theme.unwrap_or_else(|| {
        tracing::warn!(theme = %raw, "unknown theme in config, falling back to dark");
        ThemeName::Dark
    }))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub expandable: bool,
    pub start_expanded: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            expandable: true,
            start_expanded: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteConfig {
    /// How long a quote-jump destination stays highlighted
    pub highlight_ms: u64,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self { highlight_ms: 3000 }
    }
}

impl QuoteConfig {
    pub fn highlight_duration(&self) -> Duration {
        Duration::from_millis(self.highlight_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposeConfig {
    pub default_placement: ComposePlacement,
    /// Placement chosen at startup when the terminal counts as handheld
    pub handheld_placement: ComposePlacement,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            default_placement: ComposePlacement::SideBySide,
            handheld_placement: ComposePlacement::Overlay,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Terminals narrower than this many columns are treated as handheld
    pub handheld_max_columns: u16,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            handheld_max_columns: 80,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub toast_ms: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self { toast_ms: 4000 }
    }
}

impl NotificationConfig {
    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_ms)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    #[serde(skip)]
    pub path: PathBuf,
}

impl StoreOptions {
    fn resolve(&mut self, paths: &ConfigPaths) {
        if self.path.as_os_str().is_empty() {
            self.path = paths.store_path.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_paths(root: &TempDir) -> ConfigPaths {
        let base = root.path();
        ConfigPaths::from_roots(
            base.join("config"),
            base.join("config").join("config.toml"),
            base.join("data"),
            base.join("state"),
        )
    }

    #[test]
    fn load_or_init_writes_defaults() -> anyhow::Result<()> {
        let root = TempDir::new()?;
        let loader = ConfigLoader::with_paths(temp_paths(&root));
        let cfg = loader.load_or_init()?;
        assert!(loader.paths().config_file.exists());
        assert_eq!(cfg.compose.default_placement, ComposePlacement::SideBySide);
        assert_eq!(cfg.compose.handheld_placement, ComposePlacement::Overlay);
        assert_eq!(cfg.store.path, loader.paths().store_path);

        let reloaded = loader.load()?;
        assert_eq!(reloaded.quotes.highlight_ms, 3000);
        assert!(reloaded.history.expandable);
        Ok(())
    }

    #[test]
    fn partial_config_keeps_other_defaults() -> anyhow::Result<()> {
        let root = TempDir::new()?;
        let paths = temp_paths(&root);
        paths.ensure_directories()?;
        fs::write(
            &paths.config_file,
            "theme = \"solarized\"\n[compose]\ndefault_placement = \"new-tab\"\n[viewport]\nhandheld_max_columns = 60\n",
        )?;
        let cfg = ConfigLoader::with_paths(paths).load()?;
        assert_eq!(cfg.theme, ThemeName::Solarized);
        assert_eq!(cfg.compose.default_placement, ComposePlacement::NewTab);
        assert_eq!(cfg.compose.handheld_placement, ComposePlacement::Overlay);
        assert_eq!(cfg.viewport.handheld_max_columns, 60);
        assert_eq!(cfg.notifications.toast_ms, 4000);
        Ok(())
    }

    #[test]
    fn rejects_unknown_placement() -> anyhow::Result<()> {
        let root = TempDir::new()?;
        let paths = temp_paths(&root);
        paths.ensure_directories()?;
        fs::write(&paths.config_file, "[compose]\ndefault_placement = \"popup\"\n")?;
        assert!(ConfigLoader::with_paths(paths).load().is_err());
        Ok(())
    }

    #[test]
    fn unknown_theme_falls_back_to_dark() -> anyhow::Result<()> {
        let root = TempDir::new()?;
        let paths = temp_paths(&root);
        paths.ensure_directories()?;
        fs::write(&paths.config_file, "theme = \"neon\"\n")?;
        let cfg = ConfigLoader::with_paths(paths).load()?;
        assert_eq!(cfg.theme, ThemeName::Dark);
        Ok(())
    }
}
