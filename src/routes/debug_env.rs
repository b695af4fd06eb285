//! Read-only configuration diagnostics for operators.
//!
//! Reports which credentials are present and whether the environment
//! validates, without ever returning raw secret material. Refused in
//! production unless explicitly enabled, so a deployed instance cannot
//! leak its configuration shape to the public internet by accident.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::{json, Value};

use crate::config::{validate, AppConfig, FeatureFlags};
use crate::state::AppState;
use crate::utils::redact::preview;

const NOT_SET: &str = "NOT_SET";

/// Preview windows. The URL keeps enough of both ends to recognize the
/// project; the key shows barely enough to compare against a dashboard.
const URL_PREVIEW: (usize, usize) = (20, 15);
const KEY_PREVIEW: (usize, usize) = (10, 4);

/// Registers the diagnostics route.
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/debug-env", get(debug_env))
}

#[derive(Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct DebugEnvReport {
    node_env: String,
    vercel: String,
    vercel_env: String,
    supabase_configured: bool,
    supabase_url_status: &'static str,
    supabase_anon_key_status: &'static str,
    supabase_url_preview: String,
    supabase_key_preview: String,
    environment_valid: bool,
    validation_errors: Vec<String>,
    features: FeatureFlags,
    #[serde(rename = "timestamp")]
    timestamp: String,
}

fn status_of(present: bool) -> &'static str {
    if present {
        "SET"
    } else {
        "MISSING"
    }
}

/// Builds the report for a configuration snapshot. Secrets only ever pass
/// through [`preview`], which elides the middle or masks the whole value.
fn report_for(config: &AppConfig) -> DebugEnvReport {
    let validation = validate(config);
    let (url_prefix, url_suffix) = URL_PREVIEW;
    let (key_prefix, key_suffix) = KEY_PREVIEW;

    DebugEnvReport {
        node_env: config.environment.as_str().to_string(),
        vercel: config.vercel.clone().unwrap_or_else(|| NOT_SET.to_string()),
        vercel_env: config
            .vercel_env
            .clone()
            .unwrap_or_else(|| NOT_SET.to_string()),
        supabase_configured: config.features.auth_backend,
        supabase_url_status: status_of(config.supabase_url.is_some()),
        supabase_anon_key_status: status_of(config.supabase_anon_key.is_some()),
        supabase_url_preview: config
            .supabase_url
            .as_deref()
            .map(|url| preview(url, url_prefix, url_suffix))
            .unwrap_or_else(|| NOT_SET.to_string()),
        supabase_key_preview: config
            .supabase_anon_key
            .as_ref()
            .map(|key| preview(key.expose_secret(), key_prefix, key_suffix))
            .unwrap_or_else(|| NOT_SET.to_string()),
        environment_valid: validation.is_valid,
        validation_errors: validation.errors,
        features: config.features,
        timestamp: Utc::now().to_rfc3339(),
    }
}

/// Maps an unexpected rendering failure to a safe 500 response.
fn map_render_error(e: serde_json::Error) -> (StatusCode, Json<Value>) {
    tracing::error!("Failed to render configuration diagnostics: {}", e);
    let body = json!({
        "error": "Failed to render configuration diagnostics",
        "details": e.to_string(),
    });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body))
}

/// Reports configuration and validation state as JSON.
///
/// Returns 403 in a production-tagged environment unless
/// `ALLOW_DEBUG_ENDPOINT` is set. Reads shared state only; mutates nothing.
async fn debug_env(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    if state.config.environment.is_production() && !state.config.allow_debug_endpoint {
        let body = json!({
            "error": "Debug endpoint is disabled in production. Set ALLOW_DEBUG_ENDPOINT to enable it.",
        });
        return Err((StatusCode::FORBIDDEN, Json(body)));
    }

    let report = report_for(&state.config);
    let body = serde_json::to_value(&report).map_err(map_render_error)?;
    Ok((StatusCode::OK, Json(body)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::providers::Serialized;
    use figment::Figment;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_lowercase(), v.to_string()))
            .collect();
        AppConfig::from_figment(Figment::from(Serialized::defaults(map)))
    }

    #[test]
    fn unset_values_render_as_not_set() {
        let report = report_for(&config_from(&[]));
        assert_eq!(report.vercel, NOT_SET);
        assert_eq!(report.vercel_env, NOT_SET);
        assert_eq!(report.supabase_url_status, "MISSING");
        assert_eq!(report.supabase_anon_key_status, "MISSING");
        assert_eq!(report.supabase_url_preview, NOT_SET);
        assert_eq!(report.supabase_key_preview, NOT_SET);
        assert!(!report.supabase_configured);
    }

    #[test]
    fn previews_never_echo_the_stored_values() {
        let url = "https://abcdefghijklmnopqrstuvwxyz.supabase.co";
        let key = "anon-key-abcdefghijklmnopqrstuvwxyz-0123456789";
        let report = report_for(&config_from(&[
            ("NEXT_PUBLIC_SUPABASE_URL", url),
            ("NEXT_PUBLIC_SUPABASE_ANON_KEY", key),
        ]));

        assert_eq!(report.supabase_url_status, "SET");
        assert_eq!(report.supabase_anon_key_status, "SET");
        assert!(report.supabase_configured);

        assert_ne!(report.supabase_url_preview, url);
        assert!(report.supabase_url_preview.chars().count() <= 20 + 3 + 15);
        assert_ne!(report.supabase_key_preview, key);
        assert!(!report.supabase_key_preview.contains("abcdefghijklmnop"));
    }

    #[test]
    fn validation_verdict_rides_along() {
        let report = report_for(&config_from(&[("NODE_ENV", "production")]));
        assert_eq!(report.node_env, "production");
        assert!(!report.environment_valid);
        assert_eq!(report.validation_errors.len(), 2);

        let report = report_for(&config_from(&[]));
        assert!(report.environment_valid);
        assert!(report.validation_errors.is_empty());
    }

    #[test]
    fn timestamp_is_iso8601() {
        let report = report_for(&config_from(&[]));
        assert!(chrono::DateTime::parse_from_rfc3339(&report.timestamp).is_ok());
    }

    #[test]
    fn serialized_keys_match_the_reporting_contract() {
        let report = report_for(&config_from(&[]));
        let value = serde_json::to_value(&report).unwrap();
        for key in [
            "NODE_ENV",
            "VERCEL",
            "VERCEL_ENV",
            "SUPABASE_CONFIGURED",
            "SUPABASE_URL_STATUS",
            "SUPABASE_ANON_KEY_STATUS",
            "SUPABASE_URL_PREVIEW",
            "SUPABASE_KEY_PREVIEW",
            "ENVIRONMENT_VALID",
            "VALIDATION_ERRORS",
            "FEATURES",
            "timestamp",
        ] {
            assert!(value.get(key).is_some(), "missing key {key}");
        }
        assert!(value["FEATURES"].get("auth_backend").is_some());
    }
}
