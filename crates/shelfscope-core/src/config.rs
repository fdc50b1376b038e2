use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShelfError};

/// Root application configuration, loaded from `~/.config/shelfscope/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub catalog: CatalogConfig,
    pub search: SearchConfig,
    pub covers: CoverConfig,
    pub estimate: EstimateConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: String,
}

/// Limits on what the catalog accepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Highest volume number accepted from user input or estimation.
    pub max_volume: u32,
}

/// Settings for the external book-metadata search.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub base_url: String,
    pub language: String,
    pub print_type: String,
    /// Results requested per page. The search service caps this at 40.
    pub page_size: u32,
    pub min_interval_ms: u64,
    pub max_retries: u32,
    pub user_agent: String,
}

/// Cover-candidate ranking weights and output size.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverConfig {
    pub page_size: usize,
    pub volume_digits: u32,
    pub volume_marker: u32,
    pub series_name: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimateConfig {
    /// Number of search pages scanned when estimating a series' last volume.
    pub pages: u32,
}

// ─── Defaults ──────────────────────────────────────────────

pub const MAX_SEARCH_PAGE_SIZE: u32 = 40;
pub const MAX_SEARCH_RETRIES: u32 = 5;

impl Default for StorageConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("shelfscope");
        Self {
            data_dir: data_dir.to_string_lossy().to_string(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self { max_volume: 9999 }
    }
}

impl CatalogConfig {
    /// `Some(volume)` when it is within `1..=max_volume`.
    pub fn accept_volume(&self, volume: u32) -> Option<u32> {
        (1..=self.max_volume).contains(&volume).then_some(volume)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.googleapis.com/books/v1".to_string(),
            language: "ja".to_string(),
            print_type: "books".to_string(),
            page_size: MAX_SEARCH_PAGE_SIZE,
            min_interval_ms: 200,
            max_retries: 2,
            user_agent: "shelfscope/0.1".to_string(),
        }
    }
}

impl Default for CoverConfig {
    fn default() -> Self {
        Self {
            page_size: 30,
            volume_digits: 2,
            volume_marker: 2,
            series_name: 1,
        }
    }
}

impl Default for EstimateConfig {
    fn default() -> Self {
        Self { pages: 4 }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl AppConfig {
    /// Standard config file path: `~/.config/shelfscope/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("SHELFSCOPE_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("shelfscope")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if file doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.search.page_size == 0 || self.search.page_size > MAX_SEARCH_PAGE_SIZE {
            return Err(ShelfError::ConfigError(format!(
                "search.page_size must be between 1 and {MAX_SEARCH_PAGE_SIZE}, got {}",
                self.search.page_size
            )));
        }
        if self.search.max_retries > MAX_SEARCH_RETRIES {
            return Err(ShelfError::ConfigError(format!(
                "search.max_retries must be at most {MAX_SEARCH_RETRIES}, got {}",
                self.search.max_retries
            )));
        }
        if self.catalog.max_volume == 0 {
            return Err(ShelfError::ConfigError(
                "catalog.max_volume must be positive".to_string(),
            ));
        }
        if self.covers.page_size == 0 {
            return Err(ShelfError::ConfigError(
                "covers.page_size must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn set_data_dir(&mut self, dir: PathBuf) {
        self.storage.data_dir = dir.to_string_lossy().to_string();
    }

    /// Directory holding the persisted key-value records.
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.storage.data_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.search.language, "ja");
        assert_eq!(cfg.search.page_size, 40);
        assert_eq!(cfg.covers.page_size, 30);
        assert_eq!(cfg.estimate.pages, 4);
    }

    #[test]
    fn test_config_toml_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut cfg = AppConfig::default();
        cfg.covers.series_name = 3;
        cfg.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.covers.series_name, 3);
        assert_eq!(loaded.search.base_url, cfg.search.base_url);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[estimate]\npages = 2\n").unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.estimate.pages, 2);
        assert_eq!(loaded.covers.volume_marker, 2);
    }

    #[test]
    fn test_oversized_page_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[search]\npage_size = 50\n").unwrap();

        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ShelfError::ConfigError(_))
        ));
    }

    #[test]
    fn test_retry_count_is_bounded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[search]\nmax_retries = 80\n").unwrap();

        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ShelfError::ConfigError(_))
        ));
    }

    #[test]
    fn test_volume_ceiling() {
        let catalog = CatalogConfig { max_volume: 100 };
        assert_eq!(catalog.accept_volume(100), Some(100));
        assert_eq!(catalog.accept_volume(101), None);
        assert_eq!(catalog.accept_volume(0), None);
        assert_eq!(CatalogConfig::default().accept_volume(4_000_000_000), None);

        let mut cfg = AppConfig::default();
        cfg.catalog.max_volume = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let cfg = AppConfig::load_from(Path::new("/tmp/nonexistent_shelfscope_config.toml")).unwrap();
        assert_eq!(cfg.search.print_type, "books");
    }
}
