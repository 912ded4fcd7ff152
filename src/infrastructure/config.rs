use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DashboardConfig {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub theme: ThemeSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    #[serde(default = "default_scheme")]
    pub scheme: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_api_port")]
    pub port: u16,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ApiSettings {
    /// The data API lives on a fixed port of the dashboard's host
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            host: default_host(),
            port: default_api_port(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RefreshConfig {
    #[serde(default = "default_auto_update")]
    pub auto_update: bool,
    pub interval_secs: Option<u64>,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            auto_update: default_auto_update(),
            interval_secs: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ThemeSettings {
    #[serde(default = "default_theme_path")]
    pub path: String,
}

impl Default for ThemeSettings {
    fn default() -> Self {
        Self {
            path: default_theme_path(),
        }
    }
}

fn default_scheme() -> String {
    "http".to_string()
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_api_port() -> u16 {
    5000
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_auto_update() -> bool {
    true
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_theme_path() -> String {
    "theme.toml".to_string()
}

/// Load `config/dashboard.*` (optional) overlaid with `DASHBOARD__SECTION__KEY` variables
pub fn load_dashboard_config() -> anyhow::Result<DashboardConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/dashboard").required(false))
        .add_source(
            config::Environment::with_prefix("DASHBOARD")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::default();
        assert_eq!(config.api.base_url(), "http://localhost:5000");
        assert!(config.refresh.auto_update);
        assert_eq!(config.server.bind, "0.0.0.0:8080");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(
                "[api]\nhost = \"sensors.local\"\n\n[refresh]\ninterval_secs = 10\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let config: DashboardConfig = settings.try_deserialize().unwrap();

        assert_eq!(config.api.base_url(), "http://sensors.local:5000");
        assert_eq!(config.refresh.interval_secs, Some(10));
        assert!(config.refresh.auto_update);
        assert_eq!(config.theme.path, "theme.toml");
    }
}
