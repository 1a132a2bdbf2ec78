//! Configuration module

use std::env;

use crate::pipeline::MissingValuePolicy;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the serialized model bundle
    pub model_path: String,

    /// Bind address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Optional reference dataset for lookup-by-ID
    pub reference_data_path: Option<String>,

    /// Identifier column of the reference dataset
    pub reference_id_field: String,

    /// Treatment of absent features before imputation
    pub missing_value_policy: MissingValuePolicy,

    pub log_format: LogFormat,

    /// Environment (development, production)
    pub environment: String,

    /// Settings that were present but unusable, logged once tracing is up
    pub fallbacks: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_path: "models/model_complet.json".to_string(),
            host: "0.0.0.0".to_string(),
            port: 5000,
            reference_data_path: None,
            reference_id_field: "SK_ID_CURR".to_string(),
            missing_value_policy: MissingValuePolicy::Impute,
            log_format: LogFormat::Pretty,
            environment: "development".to_string(),
            fallbacks: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let mut fallbacks = Vec::new();

        let missing_value_policy = match lookup("MISSING_VALUE_POLICY") {
            Some(raw) => MissingValuePolicy::parse(&raw).unwrap_or_else(|| {
                fallbacks.push(format!(
                    "unknown MISSING_VALUE_POLICY '{}', using {}",
                    raw,
                    defaults.missing_value_policy.as_str()
                ));
                defaults.missing_value_policy
            }),
            None => defaults.missing_value_policy,
        };

        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                fallbacks.push(format!("invalid PORT '{}', using {}", raw, defaults.port));
                defaults.port
            }),
            None => defaults.port,
        };

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            Some("pretty") | None => LogFormat::Pretty,
            Some(other) => {
                fallbacks.push(format!("unknown LOG_FORMAT '{}', using pretty", other));
                LogFormat::Pretty
            }
        };

        Self {
            model_path: lookup("MODEL_PATH").unwrap_or(defaults.model_path),

            host: lookup("HOST").unwrap_or(defaults.host),

            port,

            reference_data_path: lookup("REFERENCE_DATA_PATH").filter(|p| !p.trim().is_empty()),

            reference_id_field: lookup("REFERENCE_ID_FIELD").unwrap_or(defaults.reference_id_field),

            missing_value_policy,
            log_format,

            environment: lookup("ENVIRONMENT").unwrap_or(defaults.environment),
            fallbacks,
        }
    }

    /// `host:port` for the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
