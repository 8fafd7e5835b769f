//! Layered configuration resolution
//!
//! Resolution starts from the code defaults ([`ResolvedConfig::default`]),
//! applies the local explicit overrides, then the remote bundle. Each layer wins
//! field by field; an absent field inherits what the lower layers resolved.
//! `.well-known` files and GEO rules merge by identity key (filename and
//! `urlPattern`) instead of being replaced wholesale.

use crate::config::types::{
    ConfigOverrides, GeoConfig, GeoOverride, ManagedFileConfig, ManagedFileOverride, Mode,
    PageRule, ResolvedConfig, WellKnownConfig, WellKnownFile, WellKnownFileOverride,
    WellKnownOverride,
};

/// Builds the per-request [`ResolvedConfig`]
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    local: ConfigOverrides,
}

impl ConfigResolver {
    /// Creates a resolver around the code-level explicit overrides
    pub fn new(local: ConfigOverrides) -> Self {
        Self { local }
    }

    /// Returns the local override layer
    pub fn local(&self) -> &ConfigOverrides {
        &self.local
    }

    /// Resolves defaults, local overrides and an optional remote bundle
    ///
    /// A missing bundle (no config, or the fetch failed) resolves to the code
    /// defaults plus local overrides.
    pub fn resolve(&self, remote: Option<&ConfigOverrides>) -> ResolvedConfig {
        let mut resolved = ResolvedConfig::default();
        apply_layer(&mut resolved, &self.local);
        if let Some(remote) = remote {
            apply_layer(&mut resolved, remote);
        }
        resolved
    }
}

/// Applies one override layer on top of an already resolved configuration
pub fn apply_layer(resolved: &mut ResolvedConfig, layer: &ConfigOverrides) {
    if let Some(robots) = &layer.robots_txt {
        apply_managed_file(&mut resolved.robots_txt, robots);
    }
    if let Some(sitemap) = &layer.sitemap {
        apply_managed_file(&mut resolved.sitemap, sitemap);
    }
    if let Some(well_known) = &layer.well_known {
        apply_well_known(&mut resolved.well_known, well_known);
    }
    if let Some(geo) = &layer.geo {
        apply_geo(&mut resolved.geo, geo);
    }
}

fn apply_managed_file(target: &mut ManagedFileConfig, layer: &ManagedFileOverride) {
    if let Some(enabled) = layer.enabled {
        target.enabled = enabled;
    }
    if let Some(mode) = layer.mode {
        target.mode = mode;
    }
    if let Some(content) = &layer.content {
        target.content = Some(content.clone());
    }
}

fn apply_well_known(target: &mut WellKnownConfig, layer: &WellKnownOverride) {
    if let Some(enabled) = layer.enabled {
        target.enabled = enabled;
    }

    let Some(files) = &layer.files else {
        return;
    };

    for file in files {
        match target.files.iter_mut().find(|f| f.filename == file.filename) {
            Some(existing) => apply_well_known_file(existing, file),
            None => target.files.push(WellKnownFile {
                filename: file.filename.clone(),
                mode: file.mode.unwrap_or(Mode::Disabled),
                content: file.content.clone(),
            }),
        }
    }
}

fn apply_well_known_file(target: &mut WellKnownFile, layer: &WellKnownFileOverride) {
    if let Some(mode) = layer.mode {
        target.mode = mode;
    }
    if let Some(content) = &layer.content {
        target.content = Some(content.clone());
    }
}

fn apply_geo(target: &mut GeoConfig, layer: &GeoOverride) {
    if let Some(enabled) = layer.enabled {
        target.enabled = enabled;
    }
    if let Some(inject) = layer.inject_json_ld {
        target.inject_json_ld = inject;
    }
    if let Some(inject) = layer.inject_summary {
        target.inject_summary = inject;
    }
    if let Some(enrich) = layer.enrich_headings {
        target.enrich_headings = enrich;
    }
    if let Some(rules) = &layer.rules {
        merge_rules(&mut target.rules, rules);
    }
}

/// Merges rules keyed by exact `url_pattern` text
///
/// Existing rules keep their position; rules only present in `incoming` are
/// appended in their own order.
fn merge_rules(target: &mut Vec<PageRule>, incoming: &[PageRule]) {
    for rule in incoming {
        match target
            .iter_mut()
            .find(|existing| existing.url_pattern == rule.url_pattern)
        {
            Some(existing) => *existing = existing.merged_with(rule),
            None => target.push(rule.clone()),
        }
    }
}
