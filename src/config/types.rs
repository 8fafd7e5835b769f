use crate::url::glob_matches;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// How managed content combines with origin content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Mode {
    /// Origin content followed by managed content
    Append,
    /// Structured merge of origin and managed content
    Merge,
    /// Managed content only; the origin is never consulted
    Replace,
    /// Origin content untouched
    #[default]
    Disabled,
}

impl Mode {
    /// Returns the wire name of this mode
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Append => "append",
            Self::Merge => "merge",
            Self::Replace => "replace",
            Self::Disabled => "disabled",
        }
    }
}

impl From<String> for Mode {
    /// Unrecognized modes behave like `disabled`
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "append" => Self::Append,
            "merge" => Self::Merge,
            "replace" => Self::Replace,
            "disabled" => Self::Disabled,
            other => {
                tracing::warn!(mode = other, "Unrecognized mode, treating as disabled");
                Self::Disabled
            }
        }
    }
}

impl From<Mode> for String {
    fn from(mode: Mode) -> Self {
        mode.as_str().to_string()
    }
}

/// Coarse content category of a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageType {
    Product,
    Article,
    Docs,
    Faq,
    HowTo,
    Pricing,
    Comparison,
    Generic,
}

impl PageType {
    /// Returns the wire name of this page type
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Article => "article",
            Self::Docs => "docs",
            Self::Faq => "faq",
            Self::HowTo => "how-to",
            Self::Pricing => "pricing",
            Self::Comparison => "comparison",
            Self::Generic => "generic",
        }
    }
}

impl std::fmt::Display for PageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The structured-data shapes the synthesizer can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemaType {
    Product,
    Article,
    TechArticle,
    #[serde(rename = "FAQPage")]
    FaqPage,
    HowTo,
    WebPage,
}

impl SchemaType {
    /// Returns the schema.org type name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Product => "Product",
            Self::Article => "Article",
            Self::TechArticle => "TechArticle",
            Self::FaqPage => "FAQPage",
            Self::HowTo => "HowTo",
            Self::WebPage => "WebPage",
        }
    }

    /// Looks up a schema type by its schema.org name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Product" => Some(Self::Product),
            "Article" => Some(Self::Article),
            "TechArticle" => Some(Self::TechArticle),
            "FAQPage" => Some(Self::FaqPage),
            "HowTo" => Some(Self::HowTo),
            "WebPage" => Some(Self::WebPage),
            _ => None,
        }
    }
}

/// A URL-pattern-keyed override for content optimization
///
/// Rules are matched in list order and the first match wins. `url_pattern` is
/// the identity key when local and remote rule lists are merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRule {
    #[serde(alias = "url-pattern")]
    pub url_pattern: String,

    #[serde(default, alias = "page-type", skip_serializing_if = "Option::is_none")]
    pub page_type: Option<PageType>,

    #[serde(default, alias = "schema-types", skip_serializing_if = "Option::is_none")]
    pub schema_types: Option<Vec<SchemaType>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(
        default,
        alias = "custom-structured-data",
        skip_serializing_if = "Option::is_none"
    )]
    pub custom_structured_data: Option<Map<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
}

impl PageRule {
    /// Creates a rule with only a pattern set
    pub fn new(url_pattern: impl Into<String>) -> Self {
        Self {
            url_pattern: url_pattern.into(),
            ..Self::default()
        }
    }

    /// Whether the rule turns optimization off for matching paths
    pub fn is_disabled(&self) -> bool {
        self.disabled.unwrap_or(false)
    }

    /// Whether the rule's pattern matches the full path
    pub fn matches(&self, path: &str) -> bool {
        glob_matches(&self.url_pattern, path)
    }

    /// Field-by-field merge where `other`'s present fields win
    pub fn merged_with(&self, other: &PageRule) -> PageRule {
        PageRule {
            url_pattern: self.url_pattern.clone(),
            page_type: other.page_type.or(self.page_type),
            schema_types: other
                .schema_types
                .clone()
                .or_else(|| self.schema_types.clone()),
            summary: other.summary.clone().or_else(|| self.summary.clone()),
            custom_structured_data: other
                .custom_structured_data
                .clone()
                .or_else(|| self.custom_structured_data.clone()),
            disabled: other.disabled.or(self.disabled),
        }
    }
}

// ============================================================================
// Override layers (local TOML and remote JSON share these shapes)
// ============================================================================

/// Partial settings for robots.txt or the sitemap
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedFileOverride {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub mode: Option<Mode>,
    #[serde(default)]
    pub content: Option<String>,
}

/// Partial settings for one `.well-known` file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WellKnownFileOverride {
    pub filename: String,
    #[serde(default)]
    pub mode: Option<Mode>,
    #[serde(default)]
    pub content: Option<String>,
}

/// Partial settings for the `.well-known` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WellKnownOverride {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub files: Option<Vec<WellKnownFileOverride>>,
}

/// Partial settings for content optimization
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoOverride {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default, alias = "inject-json-ld")]
    pub inject_json_ld: Option<bool>,
    #[serde(default, alias = "inject-summary")]
    pub inject_summary: Option<bool>,
    #[serde(default, alias = "enrich-headings")]
    pub enrich_headings: Option<bool>,
    #[serde(default)]
    pub rules: Option<Vec<PageRule>>,
}

/// One override layer; also the shape of a remote config bundle
///
/// Every field is optional: an absent field inherits the value resolved from
/// the layers below it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOverrides {
    #[serde(default, alias = "robots-txt")]
    pub robots_txt: Option<ManagedFileOverride>,
    #[serde(default)]
    pub sitemap: Option<ManagedFileOverride>,
    #[serde(default, alias = "well-known")]
    pub well_known: Option<WellKnownOverride>,
    #[serde(default)]
    pub geo: Option<GeoOverride>,
}

// ============================================================================
// Resolved configuration
// ============================================================================

/// Fully resolved settings for robots.txt or the sitemap
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedFileConfig {
    pub enabled: bool,
    pub mode: Mode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Default for ManagedFileConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: Mode::Disabled,
            content: None,
        }
    }
}

/// A resolved `.well-known` file entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WellKnownFile {
    pub filename: String,
    pub mode: Mode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Resolved `.well-known` section
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WellKnownConfig {
    pub enabled: bool,
    pub files: Vec<WellKnownFile>,
}

impl WellKnownConfig {
    /// Looks up a file by exact filename
    pub fn file(&self, filename: &str) -> Option<&WellKnownFile> {
        self.files.iter().find(|f| f.filename == filename)
    }
}

/// Resolved content-optimization section
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoConfig {
    pub enabled: bool,
    pub inject_json_ld: bool,
    pub inject_summary: bool,
    pub enrich_headings: bool,
    pub rules: Vec<PageRule>,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            inject_json_ld: true,
            inject_summary: true,
            enrich_headings: true,
            rules: Vec::new(),
        }
    }
}

impl GeoConfig {
    /// Returns the first rule whose pattern matches `path`
    pub fn find_rule(&self, path: &str) -> Option<&PageRule> {
        self.rules.iter().find(|rule| rule.matches(path))
    }
}

/// The single source of truth consumed by the pipeline
///
/// `ResolvedConfig::default()` is the code-level default configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedConfig {
    pub robots_txt: ManagedFileConfig,
    pub sitemap: ManagedFileConfig,
    pub well_known: WellKnownConfig,
    pub geo: GeoConfig,
}

// ============================================================================
// Local configuration file
// ============================================================================

/// Main configuration structure loaded from `botmon.toml`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EdgeConfig {
    /// Remote config service; no remote lookups happen without it
    #[serde(default)]
    pub remote: Option<RemoteSettings>,

    /// Analytics collector; no events are sent without it
    #[serde(default)]
    pub analytics: Option<AnalyticsSettings>,

    /// Code-level explicit overrides applied on top of the defaults
    #[serde(flatten)]
    pub overrides: ConfigOverrides,
}

/// Remote config service settings
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteSettings {
    /// Base URL of the config API
    pub endpoint: String,

    /// API key sent with every config request
    #[serde(rename = "api-key", default)]
    pub api_key: Option<String>,

    /// How long fetched bundles (and "no config" answers) stay cached
    #[serde(rename = "cache-ttl-seconds", default = "default_cache_ttl")]
    pub cache_ttl_seconds: u64,

    /// Network timeout for a config request
    #[serde(rename = "timeout-seconds", default = "default_timeout")]
    pub timeout_seconds: u64,
}

/// Analytics collector settings
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsSettings {
    /// Collector URL events are POSTed to
    pub endpoint: String,

    #[serde(rename = "api-key", default)]
    pub api_key: Option<String>,

    /// Retry attempts after the first failed delivery
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay for exponential backoff (doubles each retry)
    #[serde(rename = "retry-base-delay-ms", default = "default_retry_base_delay")]
    pub retry_base_delay_ms: u64,
}

fn default_cache_ttl() -> u64 {
    300
}

fn default_timeout() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_delay() -> u64 {
    500
}
