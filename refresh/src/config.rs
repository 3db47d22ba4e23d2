//! Refresh configuration.

use std::path::PathBuf;
use std::time::Duration;

use widgetfx_common::time::constants;
use widgetfx_common::DurationExt;
use widgetfx_fx::GatewayEndpoints;

/// Upstream provider configuration.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Primary current-rate endpoint root.
    pub primary_url: String,
    /// Secondary current-rate endpoint root.
    pub secondary_url: String,
    /// History endpoint root.
    pub timeseries_url: String,
    /// Per-request timeout.
    pub http_timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        let endpoints = GatewayEndpoints::default();
        Self {
            primary_url: endpoints.primary_url,
            secondary_url: endpoints.secondary_url,
            timeseries_url: endpoints.timeseries_url,
            http_timeout: constants::http_timeout().as_std(),
        }
    }
}

impl ProviderConfig {
    pub fn endpoints(&self) -> GatewayEndpoints {
        GatewayEndpoints {
            primary_url: self.primary_url.clone(),
            secondary_url: self.secondary_url.clone(),
            timeseries_url: self.timeseries_url.clone(),
        }
    }
}

/// Main refresh configuration.
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Directory holding shared namespaces.
    pub store_root: PathBuf,
    /// Namespace shared by the app and the widget.
    pub app_group: String,
    /// Provider configuration.
    pub providers: ProviderConfig,
    /// Widget timeline cadence.
    pub timeline_interval: Duration,
    /// Days of history on the chart.
    pub trend_days: u32,
    /// Log level.
    pub log_level: String,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            store_root: PathBuf::from("./widgetfx-data"),
            app_group: "group.kikoki.widgetfx".to_string(),
            providers: ProviderConfig::default(),
            timeline_interval: constants::timeline_refresh_interval().as_std(),
            trend_days: constants::TREND_DAYS,
            log_level: "info".to_string(),
        }
    }
}

impl RefreshConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("WIDGETFX_STORE_DIR") {
            config.store_root = PathBuf::from(dir);
        }

        if let Ok(group) = std::env::var("WIDGETFX_APP_GROUP") {
            config.app_group = group;
        }

        if let Ok(url) = std::env::var("WIDGETFX_PRIMARY_URL") {
            config.providers.primary_url = url;
        }

        if let Ok(url) = std::env::var("WIDGETFX_SECONDARY_URL") {
            config.providers.secondary_url = url;
        }

        if let Ok(url) = std::env::var("WIDGETFX_TIMESERIES_URL") {
            config.providers.timeseries_url = url;
        }

        if let Ok(secs) = std::env::var("WIDGETFX_HTTP_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                config.providers.http_timeout = Duration::from_secs(secs);
            }
        }

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.log_level = level;
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.app_group.is_empty() {
            return Err("App group cannot be empty".to_string());
        }

        let urls = [
            &self.providers.primary_url,
            &self.providers.secondary_url,
            &self.providers.timeseries_url,
        ];
        if urls.iter().any(|u| u.is_empty()) {
            return Err("Provider URLs cannot be empty".to_string());
        }

        if self.timeline_interval.is_zero() {
            return Err("Timeline interval cannot be 0".to_string());
        }

        if self.trend_days == 0 {
            return Err("Trend days cannot be 0".to_string());
        }

        Ok(())
    }
}
