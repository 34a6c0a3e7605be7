use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use scene_service::{gemini, GeminiConfig};
use serde::Deserialize;

pub const DEFAULT_CONFIG_PATH: &str = "snapscene.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_key: Option<String>,
    pub api_base_url: String,
    pub text_model: String,
    pub image_model: String,
    pub request_timeout_secs: u64,
    pub out_dir: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: gemini::DEFAULT_BASE_URL.into(),
            text_model: gemini::DEFAULT_TEXT_MODEL.into(),
            image_model: gemini::DEFAULT_IMAGE_MODEL.into(),
            request_timeout_secs: 120,
            out_dir: "./snapscene-out".into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_key: Option<String>,
    api_base_url: Option<String>,
    text_model: Option<String>,
    image_model: Option<String>,
    request_timeout_secs: Option<u64>,
    out_dir: Option<String>,
}

impl Settings {
    pub fn gemini_config(&self) -> Option<GeminiConfig> {
        let api_key = self.api_key.as_ref().filter(|key| !key.trim().is_empty())?;
        let mut config = GeminiConfig::new(api_key.trim());
        config.base_url = self.api_base_url.clone();
        config.text_model = self.text_model.clone();
        config.image_model = self.image_model.clone();
        config.timeout = Duration::from_secs(self.request_timeout_secs.max(1));
        Some(config)
    }

    fn apply_file(&mut self, file_cfg: FileSettings) {
        if let Some(v) = file_cfg.api_key {
            self.api_key = Some(v);
        }
        if let Some(v) = file_cfg.api_base_url {
            self.api_base_url = v;
        }
        if let Some(v) = file_cfg.text_model {
            self.text_model = v;
        }
        if let Some(v) = file_cfg.image_model {
            self.image_model = v;
        }
        if let Some(v) = file_cfg.request_timeout_secs {
            self.request_timeout_secs = v;
        }
        if let Some(v) = file_cfg.out_dir {
            self.out_dir = v;
        }
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("GEMINI_API_KEY") {
            self.api_key = Some(v);
        }
        if let Some(v) = lookup("APP__GEMINI_API_KEY") {
            self.api_key = Some(v);
        }
        if let Some(v) = lookup("APP__API_BASE_URL") {
            self.api_base_url = v;
        }
        if let Some(v) = lookup("APP__TEXT_MODEL") {
            self.text_model = v;
        }
        if let Some(v) = lookup("APP__IMAGE_MODEL") {
            self.image_model = v;
        }
        if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
            if let Ok(parsed) = v.parse::<u64>() {
                self.request_timeout_secs = parsed;
            }
        }
        if let Some(v) = lookup("APP__OUT_DIR") {
            self.out_dir = v;
        }
    }
}

/// Defaults, then the optional config file, then environment variables.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let explicit = path.is_some();
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
    match fs::read_to_string(path) {
        Ok(raw) => {
            let file_cfg = parse_file_settings(&raw)
                .with_context(|| format!("failed to parse config file '{}'", path.display()))?;
            settings.apply_file(file_cfg);
        }
        Err(err) if !explicit && err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()));
        }
    }

    settings.apply_env(|key| std::env::var(key).ok());
    Ok(settings)
}

fn parse_file_settings(raw: &str) -> anyhow::Result<FileSettings> {
    Ok(toml::from_str::<FileSettings>(raw)?)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
