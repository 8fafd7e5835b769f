use crate::{UrlError, UrlResult};
use regex::Regex;
use std::collections::HashMap;
use std::sync::{OnceLock, PoisonError, RwLock};

/// Compiled patterns kept by [`glob_matches`]; cleared when full
const GLOB_CACHE_CAPACITY: usize = 1024;

type GlobCache = RwLock<HashMap<String, Option<GlobPattern>>>;

static GLOB_CACHE: OnceLock<GlobCache> = OnceLock::new();

/// A compiled URL path glob
///
/// Supported syntax:
/// - `*` matches within a single path segment (never crosses `/`)
/// - `**` matches any number of characters, including `/`
/// - `/**` as a whole segment also matches zero segments, so `/docs/**`
///   matches `/docs`, `/docs/` and `/docs/a/b/c`
/// - everything else is literal (regex metacharacters are escaped)
///
/// Matching is anchored at both ends: a pattern must describe the whole path.
///
/// # Examples
///
/// ```
/// use botmon_edge::url::GlobPattern;
///
/// let glob = GlobPattern::new("/products/*").unwrap();
/// assert!(glob.is_match("/products/widget"));
/// assert!(!glob.is_match("/products/a/b"));
///
/// let glob = GlobPattern::new("/docs/**").unwrap();
/// assert!(glob.is_match("/docs/a/b/c"));
/// assert!(glob.is_match("/docs"));
/// ```
#[derive(Debug, Clone)]
pub struct GlobPattern {
    pattern: String,
    regex: Regex,
}

impl GlobPattern {
    /// Compiles a glob pattern
    ///
    /// # Returns
    ///
    /// * `Ok(GlobPattern)` - The compiled matcher
    /// * `Err(UrlError::InvalidGlob)` - The generated expression was rejected
    pub fn new(pattern: &str) -> UrlResult<Self> {
        let source = glob_to_regex(pattern);
        let regex = Regex::new(&source).map_err(|e| UrlError::InvalidGlob {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    /// Returns the original pattern text
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Checks whether the full path matches this pattern
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }
}

/// Tests `path` against `pattern`, compiling each distinct pattern once
///
/// An invalid pattern never matches.
pub fn glob_matches(pattern: &str, path: &str) -> bool {
    let cache = GLOB_CACHE.get_or_init(GlobCache::default);

    if let Some(compiled) = cache
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(pattern)
    {
        return compiled.as_ref().is_some_and(|glob| glob.is_match(path));
    }

    let compiled = match GlobPattern::new(pattern) {
        Ok(glob) => Some(glob),
        Err(e) => {
            tracing::warn!(pattern, error = %e, "Ignoring invalid URL pattern");
            None
        }
    };
    let matched = compiled.as_ref().is_some_and(|glob| glob.is_match(path));

    let mut entries = cache.write().unwrap_or_else(PoisonError::into_inner);
    if entries.len() >= GLOB_CACHE_CAPACITY {
        entries.clear();
    }
    entries.insert(pattern.to_string(), compiled);
    matched
}

/// Translates the glob syntax into an anchored regular expression
fn glob_to_regex(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() * 2 + 2);
    let mut literal = String::new();
    out.push('^');

    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '*' {
            literal.push(chars[i]);
            i += 1;
            continue;
        }

        let double = chars.get(i + 1) == Some(&'*');
        if double {
            let next = chars.get(i + 2);
            let whole_segment = literal.ends_with('/') && matches!(next, None | Some('/'));
            if whole_segment {
                // "/**" may also match nothing at all
                literal.pop();
                out.push_str(&regex::escape(&literal));
                out.push_str("(?:/.*)?");
            } else {
                out.push_str(&regex::escape(&literal));
                out.push_str(".*");
            }
            i += 2;
        } else {
            out.push_str(&regex::escape(&literal));
            out.push_str("[^/]*");
            i += 1;
        }
        literal.clear();
    }

    out.push_str(&regex::escape(&literal));
    out.push('$');
    out
}
