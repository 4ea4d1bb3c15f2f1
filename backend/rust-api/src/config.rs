use serde::Deserialize;
use std::env;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8081";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub bind_addr: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model: String,
    pub generation_timeout_secs: u64,
    pub session_ttl_seconds: i64,
    pub otlp_endpoint: Option<String>,
    pub metrics_auth: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Root .env first, local .env as fallback
        let skip_root_env = env::var("SKIP_ROOT_ENV").is_ok();
        if skip_root_env {
            dotenvy::dotenv().ok();
        } else if dotenvy::from_path("../../.env").is_err() {
            dotenvy::dotenv().ok();
        }

        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // config/{env}.toml, then APP_* overrides
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", app_env)).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Self::from_settings(&settings, &app_env)
    }

    fn from_settings(settings: &config::Config, app_env: &str) -> Result<Self, config::ConfigError> {
        let string_or = |key: &str, var: &str, default: &str| {
            settings
                .get_string(key)
                .or_else(|_| env::var(var))
                .unwrap_or_else(|_| default.to_string())
        };

        let openai_api_key = match settings
            .get_string("openai.api_key")
            .or_else(|_| env::var("OPENAI_API_KEY"))
        {
            Ok(key) if !key.trim().is_empty() => key,
            _ if app_env == "test" => "test-key".to_string(),
            _ => {
                return Err(config::ConfigError::Message(
                    "OPENAI_API_KEY (or openai.api_key) must be set".to_string(),
                ))
            }
        };

        let generation_timeout_secs = parse_number(
            settings.get_int("generation.timeout_secs").ok(),
            "GENERATION_TIMEOUT_SECS",
            30,
        )?
        .max(1) as u64;

        let session_ttl_seconds = parse_number(
            settings.get_int("sessions.ttl_seconds").ok(),
            "SESSION_TTL_SECONDS",
            3600,
        )?;

        let otlp_endpoint = settings
            .get_string("telemetry.otlp_endpoint")
            .or_else(|_| env::var("OTEL_EXPORTER_OTLP_ENDPOINT"))
            .ok()
            .filter(|value| !value.trim().is_empty());

        let metrics_auth = settings
            .get_string("metrics.auth")
            .or_else(|_| env::var("METRICS_AUTH"))
            .unwrap_or_else(|_| {
                tracing::warn!("METRICS_AUTH not set, using default credentials");
                "admin:changeme".to_string()
            });

        Ok(Config {
            bind_addr: string_or("server.bind_addr", "BIND_ADDR", DEFAULT_BIND_ADDR),
            openai_api_key,
            openai_base_url: string_or(
                "openai.base_url",
                "OPENAI_BASE_URL",
                DEFAULT_OPENAI_BASE_URL,
            ),
            openai_model: string_or("openai.model", "OPENAI_MODEL", DEFAULT_OPENAI_MODEL),
            generation_timeout_secs,
            session_ttl_seconds,
            otlp_endpoint,
            metrics_auth,
        })
    }

    /// Configuration for tests: no env files, generator pointed at `base_url`.
    pub fn for_tests(base_url: &str) -> Self {
        Config {
            bind_addr: "127.0.0.1:0".to_string(),
            openai_api_key: "test-key".to_string(),
            openai_base_url: base_url.to_string(),
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            generation_timeout_secs: 5,
            session_ttl_seconds: 3600,
            otlp_endpoint: None,
            metrics_auth: "admin:changeme".to_string(),
        }
    }
}

/// Settings value, then env var, then default. A present but unparsable env var is an error.
fn parse_number(
    from_settings: Option<i64>,
    var: &str,
    default: i64,
) -> Result<i64, config::ConfigError> {
    if let Some(value) = from_settings {
        return Ok(value);
    }
    match env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<i64>()
            .map_err(|e| config::ConfigError::Message(format!("{} is not a number: {}", var, e))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "OPENAI_API_KEY",
        "OPENAI_BASE_URL",
        "OPENAI_MODEL",
        "GENERATION_TIMEOUT_SECS",
        "SESSION_TTL_SECONDS",
        "OTEL_EXPORTER_OTLP_ENDPOINT",
        "BIND_ADDR",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    fn empty_settings() -> config::Config {
        config::Config::builder().build().unwrap()
    }

    #[test]
    #[serial]
    fn defaults_apply_in_test_env() {
        clear_env();
        let config = Config::from_settings(&empty_settings(), "test").unwrap();
        assert_eq!(config.openai_api_key, "test-key");
        assert_eq!(config.openai_base_url, DEFAULT_OPENAI_BASE_URL);
        assert_eq!(config.openai_model, DEFAULT_OPENAI_MODEL);
        assert_eq!(config.generation_timeout_secs, 30);
        assert_eq!(config.session_ttl_seconds, 3600);
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert!(config.otlp_endpoint.is_none());
    }

    #[test]
    #[serial]
    fn missing_api_key_is_an_error_outside_tests() {
        clear_env();
        let result = Config::from_settings(&empty_settings(), "prod");
        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn env_vars_override_defaults() {
        clear_env();
        env::set_var("OPENAI_API_KEY", "sk-live");
        env::set_var("OPENAI_MODEL", "gpt-4o-mini");
        env::set_var("GENERATION_TIMEOUT_SECS", "12");

        let config = Config::from_settings(&empty_settings(), "prod").unwrap();
        assert_eq!(config.openai_api_key, "sk-live");
        assert_eq!(config.openai_model, "gpt-4o-mini");
        assert_eq!(config.generation_timeout_secs, 12);

        clear_env();
    }

    #[test]
    #[serial]
    fn unparsable_timeout_is_an_error() {
        clear_env();
        env::set_var("GENERATION_TIMEOUT_SECS", "soon");
        let result = Config::from_settings(&empty_settings(), "test");
        assert!(result.is_err());
        clear_env();
    }
}
