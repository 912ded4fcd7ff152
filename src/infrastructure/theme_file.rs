// Theme flag persisted in a small TOML file
use crate::application::theme_store::ThemeStore;
use crate::domain::theme::Theme;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize)]
struct ThemeFile {
    theme: String,
}

#[derive(Debug, Clone)]
pub struct FileThemeStore {
    path: PathBuf,
}

impl FileThemeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ThemeStore for FileThemeStore {
    /// A missing or unreadable file reads as the light theme
    fn load(&self) -> Theme {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(_) => return Theme::default(),
        };
        match toml::from_str::<ThemeFile>(&contents) {
            Ok(file) => Theme::from_flag(&file.theme),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Ignoring unreadable theme file");
                Theme::default()
            }
        }
    }

    fn save(&self, theme: Theme) -> anyhow::Result<()> {
        let contents = toml::to_string(&ThemeFile {
            theme: theme.as_str().to_string(),
        })?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}
