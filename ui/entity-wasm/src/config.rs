//! Page configuration.
//!
//! Defaults, then `data-*` attributes on the app root, then a JSON object
//! stored under [`CONFIG_KEY`] in localStorage. Later sources win.

use gloo_storage::{LocalStorage, Storage};
use serde::Deserialize;
use web_sys::Element;

pub const CONFIG_KEY: &str = "entitydesk_config";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub artifact_url: String,
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            artifact_url: "./abis/DeviceManager.json".to_owned(),
            log_filter: "info".to_owned(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigOverrides {
    pub artifact_url: Option<String>,
    pub log_filter: Option<String>,
}

impl AppConfig {
    pub fn load(root: &Element) -> Self {
        let mut config = Self::default();
        config.apply(ConfigOverrides {
            artifact_url: root.get_attribute("data-artifact-url"),
            log_filter: root.get_attribute("data-log-filter"),
        });
        if let Ok(stored) = LocalStorage::get::<ConfigOverrides>(CONFIG_KEY) {
            config.apply(stored);
        }
        config
    }

    /// Blank values are ignored.
    pub fn apply(&mut self, overrides: ConfigOverrides) {
        let keep = |v: Option<String>| v.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty());
        if let Some(url) = keep(overrides.artifact_url) {
            self.artifact_url = url;
        }
        if let Some(filter) = keep(overrides.log_filter) {
            self.log_filter = filter;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_overrides_replace_defaults() -> anyhow::Result<()> {
        let mut config = AppConfig::default();
        let stored: ConfigOverrides =
            serde_json::from_str(r#"{"artifactUrl":"/build/DeviceManager.json"}"#)?;
        config.apply(stored);

        assert_eq!(config.artifact_url, "/build/DeviceManager.json");
        assert_eq!(config.log_filter, "info");
        Ok(())
    }

    #[test]
    fn blank_overrides_are_ignored() {
        let mut config = AppConfig::default();
        config.apply(ConfigOverrides {
            artifact_url: Some("  ".into()),
            log_filter: Some("debug".into()),
        });

        assert_eq!(config.artifact_url, "./abis/DeviceManager.json");
        assert_eq!(config.log_filter, "debug");
    }
}
