//! Editor settings management
//!
//! Settings are persisted as pretty JSON next to the application data.
//! An unreadable file falls back to defaults.

use crate::{CompressionQuality, RasterFormat, Result};
use doc_model::PageSize;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main settings container
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct EditorSettings {
    /// Page editing and history
    pub editing: EditingSettings,
    /// Compression defaults
    pub compression: CompressionSettings,
    /// Image export defaults
    pub export: ExportSettings,
}

/// Page editing settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EditingSettings {
    /// Maximum number of undo steps kept
    pub undo_limit: usize,
    /// Size of blank pages inserted when there is no neighbour to copy
    pub blank_page_size: PageSize,
}

impl Default for EditingSettings {
    fn default() -> Self {
        Self {
            undo_limit: 100,
            blank_page_size: PageSize::LETTER,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct CompressionSettings {
    pub default_quality: CompressionQuality,
}

/// Image export settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExportSettings {
    /// Pixels per point
    pub scale: f32,
    pub format: RasterFormat,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            scale: 2.0,
            format: RasterFormat::Png,
        }
    }
}

/// Settings manager for loading, saving, and updating editor settings
pub struct SettingsManager {
    settings_path: PathBuf,
    current: EditorSettings,
}

impl SettingsManager {
    /// Create a manager storing `settings.json` in the given directory
    pub fn new(app_data_dir: PathBuf) -> Self {
        Self {
            settings_path: app_data_dir.join("settings.json"),
            current: EditorSettings::default(),
        }
    }

    pub fn settings_path(&self) -> &PathBuf {
        &self.settings_path
    }

    fn parse_or_default(content: &str) -> EditorSettings {
        serde_json::from_str(content).unwrap_or_else(|e| {
            tracing::warn!("Failed to parse settings file, using defaults: {}", e);
            EditorSettings::default()
        })
    }

    /// Load settings from disk, or defaults if the file doesn't exist
    pub async fn load(&mut self) -> Result<&EditorSettings> {
        self.current = if tokio::fs::try_exists(&self.settings_path).await? {
            let content = tokio::fs::read_to_string(&self.settings_path).await?;
            Self::parse_or_default(&content)
        } else {
            EditorSettings::default()
        };
        Ok(&self.current)
    }

    /// Load settings synchronously (for use during startup)
    pub fn load_sync(&mut self) -> Result<&EditorSettings> {
        self.current = if self.settings_path.exists() {
            let content = std::fs::read_to_string(&self.settings_path)?;
            Self::parse_or_default(&content)
        } else {
            EditorSettings::default()
        };
        Ok(&self.current)
    }

    pub async fn save(&self) -> Result<()> {
        if let Some(parent) = self.settings_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(&self.current)?;
        tokio::fs::write(&self.settings_path, content).await?;
        Ok(())
    }

    pub fn save_sync(&self) -> Result<()> {
        if let Some(parent) = self.settings_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.current)?;
        std::fs::write(&self.settings_path, content)?;
        Ok(())
    }

    pub fn get(&self) -> &EditorSettings {
        &self.current
    }

    /// Replace settings and save to disk
    pub async fn update(&mut self, settings: EditorSettings) -> Result<()> {
        self.current = settings;
        self.save().await
    }

    pub fn update_sync(&mut self, settings: EditorSettings) -> Result<()> {
        self.current = settings;
        self.save_sync()
    }

    /// Reset settings to defaults and save
    pub async fn reset(&mut self) -> Result<&EditorSettings> {
        self.current = EditorSettings::default();
        self.save().await?;
        Ok(&self.current)
    }

    pub fn reset_sync(&mut self) -> Result<&EditorSettings> {
        self.current = EditorSettings::default();
        self.save_sync()?;
        Ok(&self.current)
    }

    pub async fn update_editing(&mut self, editing: EditingSettings) -> Result<()> {
        self.current.editing = editing;
        self.save().await
    }

    pub async fn update_export(&mut self, export: ExportSettings) -> Result<()> {
        self.current.export = export;
        self.save().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = EditorSettings::default();
        assert_eq!(settings.editing.undo_limit, 100);
        assert_eq!(settings.editing.blank_page_size, PageSize::LETTER);
        assert_eq!(settings.compression.default_quality, CompressionQuality::Medium);
        assert_eq!(settings.export.scale, 2.0);
        assert_eq!(settings.export.format, RasterFormat::Png);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let parsed = SettingsManager::parse_or_default(r#"{"editing":{"undo_limit":5}}"#);
        assert_eq!(parsed.editing.undo_limit, 5);
        assert_eq!(parsed.editing.blank_page_size, PageSize::LETTER);
        assert_eq!(parsed.export, ExportSettings::default());
    }

    #[test]
    fn test_settings_manager_load_save_sync() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = SettingsManager::new(temp_dir.path().to_path_buf());

        assert_eq!(manager.load_sync().unwrap(), &EditorSettings::default());

        let mut new_settings = EditorSettings::default();
        new_settings.compression.default_quality = CompressionQuality::Low;
        new_settings.editing.blank_page_size = PageSize::A4;
        manager.update_sync(new_settings).unwrap();

        let mut manager2 = SettingsManager::new(temp_dir.path().to_path_buf());
        let loaded = manager2.load_sync().unwrap();
        assert_eq!(loaded.compression.default_quality, CompressionQuality::Low);
        assert_eq!(loaded.editing.blank_page_size, PageSize::A4);
    }

    #[test]
    fn test_unparsable_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("settings.json"), "{ not json").unwrap();

        let mut manager = SettingsManager::new(temp_dir.path().to_path_buf());
        assert_eq!(manager.load_sync().unwrap(), &EditorSettings::default());
    }

    #[test]
    fn test_settings_manager_reset_sync() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = SettingsManager::new(temp_dir.path().to_path_buf());

        let mut new_settings = EditorSettings::default();
        new_settings.editing.undo_limit = 3;
        manager.update_sync(new_settings).unwrap();

        assert_eq!(manager.reset_sync().unwrap().editing.undo_limit, 100);
    }

    #[tokio::test]
    async fn test_settings_manager_async() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = SettingsManager::new(temp_dir.path().join("nested"));
        manager.load().await.unwrap();

        manager
            .update_export(ExportSettings { scale: 1.0, format: RasterFormat::Tiff })
            .await
            .unwrap();

        let mut manager2 = SettingsManager::new(temp_dir.path().join("nested"));
        let loaded = manager2.load().await.unwrap();
        assert_eq!(loaded.export.format, RasterFormat::Tiff);
        assert_eq!(loaded.export.scale, 1.0);
    }
}
