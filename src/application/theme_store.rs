// Persisted theme flag port
use crate::domain::theme::Theme;

pub trait ThemeStore: Send + Sync {
    fn load(&self) -> Theme;

    fn save(&self, theme: Theme) -> anyhow::Result<()>;
}
