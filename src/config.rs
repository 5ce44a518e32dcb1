use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use crate::opd::{TokenStrategy, DEFAULT_DEPARTMENT};
use crate::pipeline::generation::DEFAULT_OLLAMA_URL;
use crate::registry::{DuplicateIdPolicy, UnknownPatientPolicy};

/// Application-level constants
pub const APP_NAME: &str = "Clinicdesk";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_MODEL: &str = "medgemma:4b";
pub const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 300;

/// Log filter used when `RUST_LOG` is not set
pub fn default_log_filter() -> String {
    "clinicdesk=info,clinicdesk_lib=info,tower_http=warn".to_string()
}

/// Application data directory: ~/Clinicdesk/ (current dir when home is unknown)
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default record store location
pub fn default_db_path() -> PathBuf {
    app_data_dir().join("records.db")
}

/// Runtime configuration, read from `CLINICDESK_*` environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub addr: SocketAddr,
    /// `None` keeps records in memory only.
    pub db_path: Option<PathBuf>,
    pub ollama_url: String,
    pub model: String,
    pub generation_timeout_secs: u64,
    pub department: String,
    pub duplicate_ids: DuplicateIdPolicy,
    pub unknown_patient_notes: UnknownPatientPolicy,
    pub token_strategy: TokenStrategy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            db_path: Some(default_db_path()),
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            generation_timeout_secs: DEFAULT_GENERATION_TIMEOUT_SECS,
            department: DEFAULT_DEPARTMENT.to_string(),
            duplicate_ids: DuplicateIdPolicy::default(),
            unknown_patient_notes: UnknownPatientPolicy::default(),
            token_strategy: TokenStrategy::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Invalid values keep the default and log a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        parse_into(&mut config.addr, "CLINICDESK_ADDR", get("CLINICDESK_ADDR"));
        if let Some(path) = get("CLINICDESK_DB_PATH") {
            config.db_path = match path.as_str() {
                ":memory:" | "memory" => None,
                _ => Some(PathBuf::from(path)),
            };
        }
        if let Some(url) = get("CLINICDESK_OLLAMA_URL") {
            config.ollama_url = url;
        }
        if let Some(model) = get("CLINICDESK_MODEL") {
            config.model = model;
        }
        parse_into(
            &mut config.generation_timeout_secs,
            "CLINICDESK_GENERATION_TIMEOUT_SECS",
            get("CLINICDESK_GENERATION_TIMEOUT_SECS"),
        );
        if let Some(department) = get("CLINICDESK_DEPARTMENT") {
            config.department = department;
        }
        parse_into(
            &mut config.duplicate_ids,
            "CLINICDESK_DUPLICATE_IDS",
            get("CLINICDESK_DUPLICATE_IDS"),
        );
        parse_into(
            &mut config.unknown_patient_notes,
            "CLINICDESK_UNKNOWN_PATIENT_NOTES",
            get("CLINICDESK_UNKNOWN_PATIENT_NOTES"),
        );
        parse_into(
            &mut config.token_strategy,
            "CLINICDESK_TOKEN_STRATEGY",
            get("CLINICDESK_TOKEN_STRATEGY"),
        );

        config
    }
}

fn parse_into<T>(slot: &mut T, key: &str, raw: Option<String>)
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = raw else { return };
    match raw.parse::<T>() {
        Ok(value) => *slot = value,
        Err(e) => tracing::warn!(key, value = %raw, error = %e, "Invalid config value, using default"),
    }
}
