use url::Url;

use super::settings::AppConfig;

/// Outcome of validating a resolved configuration. Cheap to recompute, so it
/// is never cached; the snapshot it was computed from rides along for
/// reporting surfaces.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub config: AppConfig,
}

/// Validates a configuration snapshot. Strictness depends on the environment
/// tag: production must carry full backend credentials, while development and
/// test are allowed to run without a live backend. Pure function; safe to
/// call repeatedly.
pub fn validate(config: &AppConfig) -> ValidationReport {
    let mut errors = Vec::new();
    let production = config.environment.is_production();

    if production && config.supabase_url.is_none() {
        errors.push("NEXT_PUBLIC_SUPABASE_URL is required in production".to_string());
    }
    if production && config.supabase_anon_key.is_none() {
        errors.push("NEXT_PUBLIC_SUPABASE_ANON_KEY is required in production".to_string());
    }

    // A present but unparseable URL is broken in every environment.
    if let Some(url) = &config.supabase_url {
        let parsed = Url::parse(url);
        let usable = matches!(&parsed, Ok(u) if u.scheme() == "http" || u.scheme() == "https");
        if !usable {
            errors.push("NEXT_PUBLIC_SUPABASE_URL is not a valid URL".to_string());
        }
    }

    ValidationReport {
        is_valid: errors.is_empty(),
        errors,
        config: config.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::logging::LoggingConfig;
    use crate::config::settings::{Environment, FeatureFlags, DEFAULT_APP_URL};
    use secrecy::SecretString;

    fn snapshot(url: Option<&str>, key: Option<&str>, environment: Environment) -> AppConfig {
        AppConfig {
            supabase_url: url.map(str::to_string),
            supabase_anon_key: key.map(|k| SecretString::from(k.to_string())),
            supabase_service_role_key: None,
            app_name: "Stagedoor".to_string(),
            app_url: DEFAULT_APP_URL.to_string(),
            environment,
            vercel: None,
            vercel_env: None,
            allow_debug_endpoint: false,
            port: 3000,
            logging: LoggingConfig::default(),
            features: FeatureFlags {
                auth_backend: url.is_some() && key.is_some(),
                privileged_ops: false,
            },
        }
    }

    #[test]
    fn development_tolerates_missing_credentials() {
        let report = validate(&snapshot(None, None, Environment::Development));
        assert!(report.is_valid);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn production_requires_both_credentials_in_order() {
        let report = validate(&snapshot(None, None, Environment::Production));
        assert!(!report.is_valid);
        assert_eq!(
            report.errors,
            vec![
                "NEXT_PUBLIC_SUPABASE_URL is required in production".to_string(),
                "NEXT_PUBLIC_SUPABASE_ANON_KEY is required in production".to_string(),
            ]
        );
    }

    #[test]
    fn production_with_credentials_is_valid() {
        let report = validate(&snapshot(
            Some("https://proj.supabase.co"),
            Some("anon"),
            Environment::Production,
        ));
        assert!(report.is_valid);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn production_names_only_the_missing_variable() {
        let report = validate(&snapshot(
            Some("https://proj.supabase.co"),
            None,
            Environment::Production,
        ));
        assert_eq!(
            report.errors,
            vec!["NEXT_PUBLIC_SUPABASE_ANON_KEY is required in production".to_string()]
        );
    }

    #[test]
    fn malformed_url_is_flagged_in_any_environment() {
        for environment in [Environment::Development, Environment::Production] {
            let report = validate(&snapshot(Some("not a url"), Some("anon"), environment));
            assert!(!report.is_valid);
            assert!(report
                .errors
                .contains(&"NEXT_PUBLIC_SUPABASE_URL is not a valid URL".to_string()));
        }
    }

    #[test]
    fn non_http_scheme_is_rejected() {
        let report = validate(&snapshot(
            Some("ftp://proj.supabase.co"),
            Some("anon"),
            Environment::Development,
        ));
        assert!(!report.is_valid);
    }

    #[test]
    fn other_tags_are_not_production_strict() {
        let report = validate(&snapshot(
            None,
            None,
            Environment::Other("staging".to_string()),
        ));
        assert!(report.is_valid);
    }

    #[test]
    fn report_carries_the_snapshot_it_was_computed_from() {
        let config = snapshot(None, None, Environment::Production);
        let report = validate(&config);
        assert_eq!(report.config.environment, Environment::Production);
        assert_eq!(report.config.app_name, config.app_name);
    }
}
