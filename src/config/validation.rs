use crate::config::types::{
    AnalyticsSettings, ConfigOverrides, EdgeConfig, ManagedFileOverride, Mode, PageRule,
    RemoteSettings, WellKnownOverride,
};
use crate::url::GlobPattern;
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Upper bound for `remote.cache-ttl-seconds` (30 days)
pub const MAX_CACHE_TTL_SECONDS: u64 = 30 * 24 * 60 * 60;

/// Validates the entire configuration
pub fn validate(config: &EdgeConfig) -> Result<(), ConfigError> {
    if let Some(remote) = &config.remote {
        validate_remote_settings(remote)?;
    }
    if let Some(analytics) = &config.analytics {
        validate_analytics_settings(analytics)?;
    }
    validate_overrides(&config.overrides)?;
    Ok(())
}

/// Validates an override layer
///
/// Remote bundles are not run through this: they are applied as fetched and
/// any problem surfaces as a non-fatal stage failure.
pub fn validate_overrides(overrides: &ConfigOverrides) -> Result<(), ConfigError> {
    if let Some(robots) = &overrides.robots_txt {
        validate_managed_file("robots-txt", robots)?;
    }
    if let Some(sitemap) = &overrides.sitemap {
        validate_managed_file("sitemap", sitemap)?;
    }
    if let Some(well_known) = &overrides.well_known {
        validate_well_known(well_known)?;
    }
    if let Some(rules) = overrides.geo.as_ref().and_then(|g| g.rules.as_ref()) {
        validate_rules(rules)?;
    }
    Ok(())
}

fn validate_remote_settings(remote: &RemoteSettings) -> Result<(), ConfigError> {
    validate_http_url("remote.endpoint", &remote.endpoint)?;

    match remote.api_key.as_deref() {
        Some(key) if !key.trim().is_empty() => {}
        _ => {
            return Err(ConfigError::Validation(
                "remote.api-key must be set (or BOTMON_API_KEY exported)".to_string(),
            ))
        }
    }

    if remote.cache_ttl_seconds < 1 {
        return Err(ConfigError::Validation(format!(
            "remote.cache-ttl-seconds must be >= 1, got {}",
            remote.cache_ttl_seconds
        )));
    }
    if remote.cache_ttl_seconds > MAX_CACHE_TTL_SECONDS {
        return Err(ConfigError::Validation(format!(
            "remote.cache-ttl-seconds must be <= {}, got {}",
            MAX_CACHE_TTL_SECONDS, remote.cache_ttl_seconds
        )));
    }

    if remote.timeout_seconds < 1 {
        return Err(ConfigError::Validation(format!(
            "remote.timeout-seconds must be >= 1, got {}",
            remote.timeout_seconds
        )));
    }

    Ok(())
}

fn validate_analytics_settings(analytics: &AnalyticsSettings) -> Result<(), ConfigError> {
    validate_http_url("analytics.endpoint", &analytics.endpoint)?;

    if analytics.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "analytics.max-retries must be <= 10, got {}",
            analytics.max_retries
        )));
    }

    Ok(())
}

fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} must use http or https, got '{}'",
            field,
            url.scheme()
        )));
    }

    Ok(())
}

fn validate_managed_file(section: &str, file: &ManagedFileOverride) -> Result<(), ConfigError> {
    if file.mode == Some(Mode::Replace) && file.content.is_none() {
        return Err(ConfigError::Validation(format!(
            "{} mode 'replace' requires content",
            section
        )));
    }
    Ok(())
}

fn validate_well_known(well_known: &WellKnownOverride) -> Result<(), ConfigError> {
    let Some(files) = &well_known.files else {
        return Ok(());
    };

    let mut seen = HashSet::new();
    for file in files {
        if file.filename.is_empty() {
            return Err(ConfigError::Validation(
                "well-known filename cannot be empty".to_string(),
            ));
        }

        if file.filename.contains('/') {
            return Err(ConfigError::Validation(format!(
                "well-known filename '{}' cannot contain '/'",
                file.filename
            )));
        }

        if !seen.insert(file.filename.as_str()) {
            return Err(ConfigError::Validation(format!(
                "well-known filename '{}' is listed more than once",
                file.filename
            )));
        }

        if file.mode == Some(Mode::Replace) && file.content.is_none() {
            return Err(ConfigError::Validation(format!(
                "well-known file '{}' mode 'replace' requires content",
                file.filename
            )));
        }
    }

    Ok(())
}

fn validate_rules(rules: &[PageRule]) -> Result<(), ConfigError> {
    for rule in rules {
        let pattern = &rule.url_pattern;

        if pattern.is_empty() {
            return Err(ConfigError::InvalidPattern(
                "URL pattern cannot be empty".to_string(),
            ));
        }

        if !pattern.starts_with('/') {
            return Err(ConfigError::InvalidPattern(format!(
                "URL pattern '{}' must start with '/'",
                pattern
            )));
        }

        GlobPattern::new(pattern).map_err(|e| ConfigError::InvalidPattern(e.to_string()))?;
    }
    Ok(())
}
