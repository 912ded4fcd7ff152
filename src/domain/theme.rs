// Theme domain model
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn grid_color(&self) -> &'static str {
        match self {
            Theme::Dark => "rgba(255, 255, 255, 0.1)",
            Theme::Light => "rgba(0, 0, 0, 0.1)",
        }
    }

    pub fn text_color(&self) -> &'static str {
        match self {
            Theme::Dark => "#e0e0e0",
            Theme::Light => "#333",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    /// Anything other than "dark" reads as light
    pub fn from_flag(flag: &str) -> Self {
        if flag.trim() == "dark" {
            Theme::Dark
        } else {
            Theme::Light
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_and_flag() {
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::from_flag(Theme::Dark.as_str()), Theme::Dark);
        assert_eq!(Theme::from_flag("garbage"), Theme::Light);
    }
}
