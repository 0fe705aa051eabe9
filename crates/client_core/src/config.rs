use std::{collections::HashMap, fs};

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000/".into(),
            request_timeout_secs: 30,
        }
    }
}

/// Layered settings: defaults, then an optional `client.toml`, then
/// environment variables.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("client.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("api_base_url") {
                settings.api_base_url = v.clone();
            }
            if let Some(v) = file_cfg.get("request_timeout_secs") {
                if let Ok(parsed) = v.parse() {
                    settings.request_timeout_secs = parsed;
                }
            }
        }
    }

    if let Ok(v) = std::env::var("API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Ok(v) = std::env::var("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Ok(v) = std::env::var("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse() {
            settings.request_timeout_secs = parsed;
        }
    }

    settings
}
