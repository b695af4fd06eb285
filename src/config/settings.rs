use figment::providers::Env;
use figment::Figment;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::logging::LoggingConfig;

/// Display name used when `NEXT_PUBLIC_APP_NAME` is unset.
pub const DEFAULT_APP_NAME: &str = "Stagedoor";
/// Base URL used when neither `NEXT_PUBLIC_APP_URL` nor `VERCEL_URL` is set.
pub const DEFAULT_APP_URL: &str = "http://localhost:3000";
/// Port used when `PORT` is unset or unparseable.
pub const DEFAULT_PORT: u16 = 3000;

/// The environment variables the resolver reads. Everything else in the
/// process environment is ignored.
const ENV_KEYS: &[&str] = &[
    "NEXT_PUBLIC_SUPABASE_URL",
    "NEXT_PUBLIC_SUPABASE_ANON_KEY",
    "SUPABASE_SERVICE_ROLE_KEY",
    "NEXT_PUBLIC_APP_NAME",
    "NEXT_PUBLIC_APP_URL",
    "VERCEL_URL",
    "NODE_ENV",
    "VERCEL",
    "VERCEL_ENV",
    "ALLOW_DEBUG_ENDPOINT",
    "PORT",
    "LOG_LEVEL",
    "LOG_FORMAT",
];

/// Deployment environment tag, parsed from `NODE_ENV`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
    /// Any other tag (e.g. "staging") is preserved verbatim.
    Other(String),
}

impl Environment {
    fn from_tag(tag: Option<&str>) -> Self {
        match tag {
            None => Environment::Development,
            Some(t) => match t.to_ascii_lowercase().as_str() {
                "development" => Environment::Development,
                "test" => Environment::Test,
                "production" => Environment::Production,
                _ => Environment::Other(t.to_string()),
            },
        }
    }

    /// Strict validation and the debug-endpoint refusal key on this.
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Production => "production",
            Environment::Other(tag) => tag,
        }
    }
}

/// Derived capability flags. `auth_backend` is true iff both the Supabase URL
/// and the anon key are present; it must be consulted (via
/// [`AppConfig::require_auth`]) before any backend call is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeatureFlags {
    pub auth_backend: bool,
    pub privileged_ops: bool,
}

/// The two values every backend call needs. Only obtainable through
/// [`AppConfig::require_auth`], which is the single place where missing
/// credentials become a hard error.
#[derive(Debug, Clone)]
pub struct AuthBackendConfig {
    pub url: String,
    pub anon_key: SecretString,
}

#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("auth backend is not configured: {missing} must be set")]
    AuthBackendUnusable { missing: String },
    #[error("NEXT_PUBLIC_SUPABASE_URL is not a usable URL: {0}")]
    InvalidUrl(String),
}

/// Immutable snapshot of the process environment, resolved once at startup
/// and shared read-only behind an `Arc`. Missing values are represented as
/// `None` (or fall back to documented defaults), never as errors; fatality
/// is decided by callers such as the environment validator.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<SecretString>,
    pub supabase_service_role_key: Option<SecretString>,
    pub app_name: String,
    pub app_url: String,
    pub environment: Environment,
    pub vercel: Option<String>,
    pub vercel_env: Option<String>,
    pub allow_debug_endpoint: bool,
    pub port: u16,
    pub logging: LoggingConfig,
    pub features: FeatureFlags,
}

/// Figment infers types from raw environment strings ("true" becomes a bool,
/// "3000" a number), so the raw settings accept any scalar and normalize to
/// text afterwards. Extraction can then never fail on an odd value.
#[derive(Deserialize)]
#[serde(untagged)]
enum LooseValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl LooseValue {
    fn into_string(self) -> String {
        match self {
            LooseValue::Bool(b) => b.to_string(),
            LooseValue::Int(i) => i.to_string(),
            LooseValue::Float(f) => f.to_string(),
            LooseValue::Str(s) => s,
        }
    }
}

#[derive(Deserialize, Default)]
struct RawSettings {
    next_public_supabase_url: Option<LooseValue>,
    next_public_supabase_anon_key: Option<LooseValue>,
    supabase_service_role_key: Option<LooseValue>,
    next_public_app_name: Option<LooseValue>,
    next_public_app_url: Option<LooseValue>,
    vercel_url: Option<LooseValue>,
    node_env: Option<LooseValue>,
    vercel: Option<LooseValue>,
    vercel_env: Option<LooseValue>,
    allow_debug_endpoint: Option<LooseValue>,
    port: Option<LooseValue>,
    log_level: Option<LooseValue>,
    log_format: Option<LooseValue>,
}

/// Trims and drops empty strings: an env var set to "" counts as absent.
fn normalize(value: Option<LooseValue>) -> Option<String> {
    value
        .map(LooseValue::into_string)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl AppConfig {
    /// Resolves configuration from the process environment. Idempotent and
    /// side-effect-free; absent or malformed values fall back to defaults
    /// instead of failing.
    pub fn resolve() -> AppConfig {
        AppConfig::from_figment(Figment::from(Env::raw().only(ENV_KEYS)))
    }

    /// Resolution against an explicit figment, so tests can feed settings
    /// without touching the process environment.
    pub fn from_figment(figment: Figment) -> AppConfig {
        // LooseValue accepts every scalar figment can infer, so extraction
        // only fails on structured values, which the env provider never emits.
        let raw: RawSettings = figment.extract().unwrap_or_default();
        AppConfig::from_raw(raw)
    }

    fn from_raw(raw: RawSettings) -> AppConfig {
        let supabase_url = normalize(raw.next_public_supabase_url);
        let supabase_anon_key = normalize(raw.next_public_supabase_anon_key).map(SecretString::from);
        let supabase_service_role_key =
            normalize(raw.supabase_service_role_key).map(SecretString::from);

        let app_name =
            normalize(raw.next_public_app_name).unwrap_or_else(|| DEFAULT_APP_NAME.to_string());

        // Base URL falls back through the deployment-provided host before the
        // localhost default. VERCEL_URL arrives without a scheme.
        let app_url = normalize(raw.next_public_app_url)
            .or_else(|| normalize(raw.vercel_url).map(|host| format!("https://{host}")))
            .unwrap_or_else(|| DEFAULT_APP_URL.to_string());

        let environment = Environment::from_tag(normalize(raw.node_env).as_deref());

        let allow_debug_endpoint = normalize(raw.allow_debug_endpoint)
            .map(|v| is_truthy(&v))
            .unwrap_or(false);

        let port = normalize(raw.port)
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let logging = LoggingConfig {
            level: normalize(raw.log_level).unwrap_or_else(|| LoggingConfig::default().level),
            format: normalize(raw.log_format).unwrap_or_else(|| LoggingConfig::default().format),
        };

        let features = FeatureFlags {
            auth_backend: supabase_url.is_some() && supabase_anon_key.is_some(),
            privileged_ops: supabase_service_role_key.is_some(),
        };

        AppConfig {
            supabase_url,
            supabase_anon_key,
            supabase_service_role_key,
            app_name,
            app_url,
            environment,
            vercel: normalize(raw.vercel),
            vercel_env: normalize(raw.vercel_env),
            allow_debug_endpoint,
            port,
            logging,
            features,
        }
    }

    /// The single choke point where missing auth credentials become a hard
    /// error. Everything that talks to the backend goes through here first,
    /// so a misconfigured deployment fails with a descriptive message instead
    /// of an opaque network failure deeper in the call stack.
    pub fn require_auth(&self) -> Result<AuthBackendConfig, ConfigError> {
        match (&self.supabase_url, &self.supabase_anon_key) {
            (Some(url), Some(anon_key)) => Ok(AuthBackendConfig {
                url: url.clone(),
                anon_key: anon_key.clone(),
            }),
            (url, key) => {
                let mut missing = Vec::new();
                if url.is_none() {
                    missing.push("NEXT_PUBLIC_SUPABASE_URL");
                }
                if key.is_none() {
                    missing.push("NEXT_PUBLIC_SUPABASE_ANON_KEY");
                }
                Err(ConfigError::AuthBackendUnusable {
                    missing: missing.join(" and "),
                })
            }
        }
    }

    /// Address the HTTP server binds to, derived from `PORT`.
    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::providers::Serialized;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_lowercase(), v.to_string()))
            .collect();
        AppConfig::from_figment(Figment::from(Serialized::defaults(map)))
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let config = config_from(&[]);
        assert_eq!(config.app_name, DEFAULT_APP_NAME);
        assert_eq!(config.app_url, DEFAULT_APP_URL);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.environment, Environment::Development);
        assert!(!config.allow_debug_endpoint);
        assert!(!config.features.auth_backend);
        assert!(!config.features.privileged_ops);
    }

    #[test]
    fn auth_backend_flag_requires_both_url_and_key() {
        let url_only = config_from(&[("NEXT_PUBLIC_SUPABASE_URL", "https://x.supabase.co")]);
        assert!(!url_only.features.auth_backend);

        let key_only = config_from(&[("NEXT_PUBLIC_SUPABASE_ANON_KEY", "anon-key")]);
        assert!(!key_only.features.auth_backend);

        let both = config_from(&[
            ("NEXT_PUBLIC_SUPABASE_URL", "https://x.supabase.co"),
            ("NEXT_PUBLIC_SUPABASE_ANON_KEY", "anon-key"),
        ]);
        assert!(both.features.auth_backend);
    }

    #[test]
    fn empty_strings_count_as_absent() {
        let config = config_from(&[
            ("NEXT_PUBLIC_SUPABASE_URL", ""),
            ("NEXT_PUBLIC_SUPABASE_ANON_KEY", "   "),
        ]);
        assert_eq!(config.supabase_url, None);
        assert!(config.supabase_anon_key.is_none());
        assert!(!config.features.auth_backend);
    }

    #[test]
    fn base_url_falls_back_through_vercel_host() {
        let explicit = config_from(&[
            ("NEXT_PUBLIC_APP_URL", "https://events.example.com"),
            ("VERCEL_URL", "deploy-abc.vercel.app"),
        ]);
        assert_eq!(explicit.app_url, "https://events.example.com");

        let vercel = config_from(&[("VERCEL_URL", "deploy-abc.vercel.app")]);
        assert_eq!(vercel.app_url, "https://deploy-abc.vercel.app");

        let neither = config_from(&[]);
        assert_eq!(neither.app_url, DEFAULT_APP_URL);
    }

    #[test]
    fn environment_tag_parses_known_and_other_values() {
        assert_eq!(
            config_from(&[("NODE_ENV", "production")]).environment,
            Environment::Production
        );
        assert_eq!(
            config_from(&[("NODE_ENV", "Test")]).environment,
            Environment::Test
        );
        let staging = config_from(&[("NODE_ENV", "staging")]);
        assert_eq!(
            staging.environment,
            Environment::Other("staging".to_string())
        );
        assert_eq!(staging.environment.as_str(), "staging");
        assert!(!staging.environment.is_production());
    }

    #[test]
    fn require_auth_fails_naming_missing_variables() {
        let nothing = config_from(&[]);
        let err = nothing.require_auth().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("NEXT_PUBLIC_SUPABASE_URL"));
        assert!(message.contains("NEXT_PUBLIC_SUPABASE_ANON_KEY"));

        let url_only = config_from(&[("NEXT_PUBLIC_SUPABASE_URL", "https://x.supabase.co")]);
        let err = url_only.require_auth().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("NEXT_PUBLIC_SUPABASE_ANON_KEY"));
        assert!(!message.contains("NEXT_PUBLIC_SUPABASE_URL and"));
    }

    #[test]
    fn require_auth_returns_credentials_unchanged() {
        let config = config_from(&[
            ("NEXT_PUBLIC_SUPABASE_URL", "https://x.supabase.co"),
            ("NEXT_PUBLIC_SUPABASE_ANON_KEY", "anon-key"),
        ]);
        let auth = config.require_auth().expect("auth config should resolve");
        assert_eq!(auth.url, "https://x.supabase.co");
        assert_eq!(auth.anon_key.expose_secret(), "anon-key");
    }

    #[test]
    fn debug_flag_accepts_common_truthy_spellings() {
        for value in ["1", "true", "YES", "on"] {
            assert!(
                config_from(&[("ALLOW_DEBUG_ENDPOINT", value)]).allow_debug_endpoint,
                "{value} should enable the debug endpoint"
            );
        }
        for value in ["0", "false", "off", "sure"] {
            assert!(!config_from(&[("ALLOW_DEBUG_ENDPOINT", value)]).allow_debug_endpoint);
        }
    }

    #[test]
    fn port_parses_with_fallback() {
        assert_eq!(config_from(&[("PORT", "8080")]).port, 8080);
        assert_eq!(config_from(&[("PORT", "not-a-port")]).port, DEFAULT_PORT);
    }

    #[test]
    fn resolve_reads_the_process_environment() {
        temp_env::with_vars(
            [
                (
                    "NEXT_PUBLIC_SUPABASE_URL",
                    Some("https://proj.supabase.co"),
                ),
                ("NEXT_PUBLIC_SUPABASE_ANON_KEY", Some("anon")),
                ("NODE_ENV", Some("production")),
                ("ALLOW_DEBUG_ENDPOINT", Some("true")),
                ("PORT", Some("4000")),
            ],
            || {
                let config = AppConfig::resolve();
                assert_eq!(
                    config.supabase_url.as_deref(),
                    Some("https://proj.supabase.co")
                );
                assert!(config.features.auth_backend);
                assert_eq!(config.environment, Environment::Production);
                assert!(config.allow_debug_endpoint);
                assert_eq!(config.port, 4000);
            },
        );
    }
}
