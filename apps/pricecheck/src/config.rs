use std::{fs, path::Path};

use client_core::QueryEncoding;
use tracing::warn;

pub const SETTINGS_FILE: &str = "pricecheck.toml";
const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_url: String,
    pub query_encoding: QueryEncoding,
    pub request_timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            query_encoding: QueryEncoding::PathSegment,
            request_timeout_secs: None,
        }
    }
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

/// File values override defaults; environment values override the file.
pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match raw.parse::<toml::Table>() {
            Ok(table) => {
                if let Some(v) = table.get("base_url").and_then(toml::Value::as_str) {
                    settings.base_url = v.to_string();
                }
                if let Some(v) = table.get("query_encoding").and_then(toml::Value::as_str) {
                    apply_query_encoding(&mut settings, v);
                }
                match table.get("request_timeout_secs") {
                    Some(toml::Value::Integer(secs)) => {
                        settings.request_timeout_secs =
                            u64::try_from(*secs).ok().filter(|secs| *secs > 0);
                    }
                    Some(toml::Value::String(secs)) => apply_timeout(&mut settings, secs),
                    _ => {}
                }
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "ignoring unparsable settings file");
            }
        }
    }

    if let Some(v) = env("PRICECHECK_BASE_URL") {
        settings.base_url = v;
    }
    if let Some(v) = env("APP__BASE_URL") {
        settings.base_url = v;
    }

    if let Some(v) = env("APP__QUERY_ENCODING") {
        apply_query_encoding(&mut settings, &v);
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        apply_timeout(&mut settings, &v);
    }

    settings.base_url = normalize_base_url(&settings.base_url);
    settings
}

pub fn parse_query_encoding(raw: &str) -> Option<QueryEncoding> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "path" | "segment" | "encoded" => Some(QueryEncoding::PathSegment),
        "raw" => Some(QueryEncoding::Raw),
        _ => None,
    }
}

pub fn normalize_base_url(raw_base_url: &str) -> String {
    let base_url = raw_base_url.trim().trim_end_matches('/');

    if base_url.is_empty() {
        return DEFAULT_BASE_URL.to_string();
    }

    if base_url.contains("://") {
        return base_url.to_string();
    }

    format!("http://{base_url}")
}

fn apply_query_encoding(settings: &mut Settings, raw: &str) {
    match parse_query_encoding(raw) {
        Some(encoding) => settings.query_encoding = encoding,
        None => warn!(value = raw, "unknown query encoding; keeping {:?}", settings.query_encoding),
    }
}

fn apply_timeout(settings: &mut Settings, raw: &str) {
    match raw.trim().parse::<u64>() {
        Ok(0) => settings.request_timeout_secs = None,
        Ok(secs) => settings.request_timeout_secs = Some(secs),
        Err(_) => warn!(value = raw, "ignoring unparsable request timeout"),
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
