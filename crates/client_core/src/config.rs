use std::{collections::HashMap, fs, io, path::Path};

use anyhow::Context;
use tracing::warn;
use url::Url;

use crate::error::ClientError;

pub const SETTINGS_FILE: &str = "clinical.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub api_base_url: String,
    pub list_route: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: "https://group3-mapd713.onrender.com".into(),
            list_route: "ClinicalTests".into(),
        }
    }
}

pub fn load_settings() -> ClientSettings {
    load_settings_with(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

/// Defaults, then the settings file at `path`, then values from `env`.
pub fn load_settings_with(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> ClientSettings {
    let mut settings = ClientSettings::default();

    match read_settings_file(path) {
        Ok(Some(file_cfg)) => {
            if let Some(v) = file_cfg.get("api_base_url") {
                settings.api_base_url = v.clone();
            }
            if let Some(v) = file_cfg.get("list_route") {
                settings.list_route = v.clone();
            }
        }
        Ok(None) => {}
        Err(err) => warn!(path = %path.display(), "ignoring settings file: {err:#}"),
    }

    if let Some(v) = env("CLINICAL_API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = env("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = env("APP__LIST_ROUTE") {
        settings.list_route = v;
    }

    settings.api_base_url = normalize_base_url(&settings.api_base_url);
    settings
}

fn read_settings_file(path: &Path) -> anyhow::Result<Option<HashMap<String, String>>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read '{}'", path.display()))
        }
    };
    let parsed = toml::from_str::<HashMap<String, String>>(&raw)
        .with_context(|| format!("failed to parse '{}'", path.display()))?;
    Ok(Some(parsed))
}

pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return ClientSettings::default().api_base_url;
    }
    trimmed.trim_end_matches('/').to_string()
}

pub fn parse_base_url(raw: &str) -> Result<Url, ClientError> {
    let normalized = normalize_base_url(raw);
    let url = Url::parse(&normalized).map_err(|err| ClientError::InvalidBaseUrl {
        url: normalized.clone(),
        reason: err.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(ClientError::InvalidBaseUrl {
            url: normalized,
            reason: "api base url must start with http:// or https://".into(),
        });
    }

    Ok(url)
}
